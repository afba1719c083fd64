//! SQLite error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SqliteError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration {version} ({name}) failed: {error}")]
    MigrationFailed {
        version: i32,
        name: String,
        error: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Conflict: {0}")]
    Conflict(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migration_failed_error_display() {
        let err = SqliteError::MigrationFailed {
            version: 1,
            name: "initial_schema".to_string(),
            error: "checksum mismatch".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Migration 1 (initial_schema) failed: checksum mismatch"
        );
    }

    #[test]
    fn test_conflict_display() {
        let err = SqliteError::Conflict("could not allocate report id".into());
        assert_eq!(err.to_string(), "Conflict: could not allocate report id");
    }
}
