//! LIKE pattern helpers
//!
//! Patterns built here must be used with `LIKE ? ESCAPE '\'`.

/// Escape SQL LIKE metacharacters (`%`, `_`, `\`) in user input
pub fn escape_like_pattern(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Substring pattern (`%input%`) with the input escaped
pub fn contains_pattern(s: &str) -> String {
    format!("%{}%", escape_like_pattern(s.trim()))
}
