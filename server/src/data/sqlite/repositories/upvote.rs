//! Upvote repository
//!
//! Counts are never stored; report rows derive them from this table.

use sqlx::SqlitePool;

use crate::data::sqlite::SqliteError;

/// Upvote a report. Returns false if the user had already upvoted it.
pub async fn add_upvote(pool: &SqlitePool, report_id: &str, user_id: &str) -> Result<bool, SqliteError> {
    let now = chrono::Utc::now().timestamp();
    let added = sqlx::query(
        "INSERT OR IGNORE INTO upvotes (report_id, user_id, created_at) VALUES (?, ?, ?)",
    )
    .bind(report_id)
    .bind(user_id)
    .bind(now)
    .execute(pool)
    .await?
    .rows_affected()
        > 0;

    Ok(added)
}

/// Withdraw an upvote. Returns false if there was none.
pub async fn remove_upvote(
    pool: &SqlitePool,
    report_id: &str,
    user_id: &str,
) -> Result<bool, SqliteError> {
    let result = sqlx::query("DELETE FROM upvotes WHERE report_id = ? AND user_id = ?")
        .bind(report_id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn has_upvoted(pool: &SqlitePool, report_id: &str, user_id: &str) -> Result<bool, SqliteError> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM upvotes WHERE report_id = ? AND user_id = ?)",
    )
    .bind(report_id)
    .bind(user_id)
    .fetch_one(pool)
    .await?;
    Ok(exists)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sqlite::repositories::report::get_report;

    async fn setup_test_pool() -> SqlitePool {
        let pool = SqlitePool::connect(":memory:").await.unwrap();
        sqlx::query(crate::data::sqlite::schema::SCHEMA)
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO projects (id, name, created_at) VALUES ('p1', 'P', 0)")
            .execute(&pool)
            .await
            .unwrap();
        for user in ["bob", "carol"] {
            crate::data::sqlite::repositories::user::add_user_if_none(&pool, user)
                .await
                .unwrap();
        }
        sqlx::query(
            "INSERT INTO reports (id, project_id, reporter_id, summary, created_at) VALUES ('r1', 'p1', 'alice', 'Bug', 0)",
        )
        .execute(&pool)
        .await
        .unwrap();
        pool
    }

    #[tokio::test]
    async fn test_duplicate_upvote_counts_once() {
        let pool = setup_test_pool().await;

        assert!(add_upvote(&pool, "r1", "bob").await.unwrap());
        assert!(!add_upvote(&pool, "r1", "bob").await.unwrap());
        assert!(add_upvote(&pool, "r1", "carol").await.unwrap());

        let report = get_report(&pool, "r1").await.unwrap().unwrap();
        assert_eq!(report.upvotes, 2);
        assert!(has_upvoted(&pool, "r1", "bob").await.unwrap());
    }

    #[tokio::test]
    async fn test_remove_upvote() {
        let pool = setup_test_pool().await;
        add_upvote(&pool, "r1", "bob").await.unwrap();

        assert!(remove_upvote(&pool, "r1", "bob").await.unwrap());
        assert!(!remove_upvote(&pool, "r1", "bob").await.unwrap());
        assert!(!has_upvoted(&pool, "r1", "bob").await.unwrap());

        let report = get_report(&pool, "r1").await.unwrap().unwrap();
        assert_eq!(report.upvotes, 0);
    }

    #[tokio::test]
    async fn test_upvote_by_unknown_user_is_refused() {
        let pool = setup_test_pool().await;

        assert!(add_upvote(&pool, "r1", "ghost").await.is_err());
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = 'ghost')")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert!(!exists);
    }
}
