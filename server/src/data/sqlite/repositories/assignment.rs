//! Report assignment repository

use sqlx::SqlitePool;

use crate::data::sqlite::SqliteError;

/// List developer IDs assigned to a report
pub async fn list_assignees(pool: &SqlitePool, report_id: &str) -> Result<Vec<String>, SqliteError> {
    let ids = sqlx::query_scalar(
        "SELECT developer_id FROM assignments WHERE report_id = ? ORDER BY created_at, developer_id",
    )
    .bind(report_id)
    .fetch_all(pool)
    .await?;
    Ok(ids)
}

/// Assign a developer to a report. Returns false if already assigned.
pub async fn add_assignment(
    pool: &SqlitePool,
    report_id: &str,
    developer_id: &str,
) -> Result<bool, SqliteError> {
    let result = sqlx::query(
        "INSERT OR IGNORE INTO assignments (report_id, developer_id, created_at) VALUES (?, ?, ?)",
    )
    .bind(report_id)
    .bind(developer_id)
    .bind(chrono::Utc::now().timestamp())
    .execute(pool)
    .await?;

    let added = result.rows_affected() > 0;
    if added {
        tracing::debug!(report_id, developer_id, "Developer assigned");
    }
    Ok(added)
}

/// Unassign a developer. Returns false if they weren't assigned.
pub async fn remove_assignment(
    pool: &SqlitePool,
    report_id: &str,
    developer_id: &str,
) -> Result<bool, SqliteError> {
    let result = sqlx::query("DELETE FROM assignments WHERE report_id = ? AND developer_id = ?")
        .bind(report_id)
        .bind(developer_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup_test_pool() -> SqlitePool {
        let pool = SqlitePool::connect(":memory:").await.unwrap();
        sqlx::query(crate::data::sqlite::schema::SCHEMA)
            .execute(&pool)
            .await
            .unwrap();
        for sql in [
            "INSERT INTO users (id, created_at, updated_at) VALUES ('alice', 0, 0), ('bob', 0, 0)",
            "INSERT INTO projects (id, name, created_at) VALUES ('p1', 'P', 0)",
            "INSERT INTO reports (id, project_id, reporter_id, summary, created_at) VALUES ('r1', 'p1', 'alice', 'Bug', 0)",
        ] {
            sqlx::query(sql).execute(&pool).await.unwrap();
        }
        pool
    }

    #[tokio::test]
    async fn test_add_assignment_is_idempotent() {
        let pool = setup_test_pool().await;

        assert!(add_assignment(&pool, "r1", "alice").await.unwrap());
        assert!(!add_assignment(&pool, "r1", "alice").await.unwrap());
        assert!(add_assignment(&pool, "r1", "bob").await.unwrap());

        let mut assignees = list_assignees(&pool, "r1").await.unwrap();
        assignees.sort();
        assert_eq!(assignees, vec!["alice", "bob"]);
    }

    #[tokio::test]
    async fn test_remove_assignment() {
        let pool = setup_test_pool().await;
        add_assignment(&pool, "r1", "alice").await.unwrap();

        assert!(remove_assignment(&pool, "r1", "alice").await.unwrap());
        assert!(!remove_assignment(&pool, "r1", "alice").await.unwrap());
        assert!(list_assignees(&pool, "r1").await.unwrap().is_empty());
    }
}
