//! Unique entity ID allocation

use sqlx::SqliteConnection;

use crate::core::constants::HASH_MAX_ATTEMPTS;
use crate::data::sqlite::SqliteError;
use crate::data::types::HashTable;
use crate::utils::crypto::generate_hash;

/// Generate a random hash not yet used as an ID in `table`
///
/// Gives up with a conflict after `HASH_MAX_ATTEMPTS` collisions. Takes a
/// connection so the check can share the inserting transaction.
pub async fn find_unique_hash(
    conn: &mut SqliteConnection,
    table: HashTable,
) -> Result<String, SqliteError> {
    let sql = match table {
        HashTable::Projects => "SELECT EXISTS(SELECT 1 FROM projects WHERE id = ?)",
        HashTable::Reports => "SELECT EXISTS(SELECT 1 FROM reports WHERE id = ?)",
        HashTable::Comments => "SELECT EXISTS(SELECT 1 FROM comments WHERE id = ?)",
    };

    for attempt in 1..=HASH_MAX_ATTEMPTS {
        let candidate = generate_hash();
        let taken: bool = sqlx::query_scalar(sql)
            .bind(&candidate)
            .fetch_one(&mut *conn)
            .await?;
        if !taken {
            return Ok(candidate);
        }
        tracing::debug!(table = table.as_str(), attempt, "ID collision, retrying");
    }

    Err(SqliteError::Conflict(format!(
        "could not allocate a unique {} id after {} attempts",
        table.as_str(),
        HASH_MAX_ATTEMPTS
    )))
}
