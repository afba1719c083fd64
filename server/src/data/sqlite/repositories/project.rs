//! Project repository for SQLite operations

use sqlx::SqlitePool;

use crate::data::sqlite::SqliteError;
use crate::data::types::{HashTable, LeaveOutcome, ProjectRow, ProjectStats};
use crate::utils::sql::contains_pattern;

use super::hash::find_unique_hash;

fn project_from_tuple((id, name, created_at): (String, String, i64)) -> ProjectRow {
    ProjectRow {
        id,
        name,
        created_at,
    }
}

/// Create a project and make its creator the first developer, atomically
pub async fn create_project(
    pool: &SqlitePool,
    name: &str,
    creator_id: &str,
) -> Result<ProjectRow, SqliteError> {
    let now = chrono::Utc::now().timestamp();

    let mut tx = pool.begin().await?;

    let id = find_unique_hash(&mut tx, HashTable::Projects).await?;

    sqlx::query("INSERT INTO projects (id, name, created_at) VALUES (?, ?, ?)")
        .bind(&id)
        .bind(name)
        .bind(now)
        .execute(&mut *tx)
        .await?;

    sqlx::query("INSERT INTO developments (project_id, developer_id, created_at) VALUES (?, ?, ?)")
        .bind(&id)
        .bind(creator_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::debug!(project_id = %id, creator_id, "Project created");
    Ok(ProjectRow {
        id,
        name: name.to_string(),
        created_at: now,
    })
}

/// Get a project by ID
pub async fn get_project(pool: &SqlitePool, id: &str) -> Result<Option<ProjectRow>, SqliteError> {
    let row = sqlx::query_as::<_, (String, String, i64)>(
        "SELECT id, name, created_at FROM projects WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(project_from_tuple))
}

/// Case-insensitive substring search over project names, ordered by name
pub async fn search_projects(
    pool: &SqlitePool,
    query: &str,
    page: u32,
    limit: u32,
) -> Result<Vec<ProjectRow>, SqliteError> {
    let offset = page.saturating_sub(1).saturating_mul(limit);

    let rows = sqlx::query_as::<_, (String, String, i64)>(
        r#"
        SELECT id, name, created_at
        FROM projects
        WHERE name LIKE ? ESCAPE '\'
        ORDER BY name COLLATE NOCASE, created_at DESC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(contains_pattern(query))
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(project_from_tuple).collect())
}

/// List the projects a user develops, newest first
pub async fn list_projects_for_user(
    pool: &SqlitePool,
    user_id: &str,
) -> Result<Vec<ProjectRow>, SqliteError> {
    let rows = sqlx::query_as::<_, (String, String, i64)>(
        r#"
        SELECT p.id, p.name, p.created_at
        FROM projects p
        JOIN developments d ON d.project_id = p.id
        WHERE d.developer_id = ?
        ORDER BY p.created_at DESC, p.name
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(project_from_tuple).collect())
}

/// Remove a developer from a project, deleting the project if they were the last one
pub async fn leave_project(
    pool: &SqlitePool,
    project_id: &str,
    developer_id: &str,
) -> Result<LeaveOutcome, SqliteError> {
    let mut tx = pool.begin().await?;

    let removed = sqlx::query("DELETE FROM developments WHERE project_id = ? AND developer_id = ?")
        .bind(project_id)
        .bind(developer_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    if removed == 0 {
        tx.rollback().await?;
        return Ok(LeaveOutcome::NotDeveloper);
    }

    // Only developers may be assigned
    let unassigned = sqlx::query(
        "DELETE FROM assignments WHERE developer_id = ? AND report_id IN (SELECT id FROM reports WHERE project_id = ?)",
    )
    .bind(developer_id)
    .bind(project_id)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    let remaining: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM developments WHERE project_id = ?")
            .bind(project_id)
            .fetch_one(&mut *tx)
            .await?;

    let outcome = if remaining == 0 {
        sqlx::query("DELETE FROM projects WHERE id = ?")
            .bind(project_id)
            .execute(&mut *tx)
            .await?;
        LeaveOutcome::Deleted
    } else {
        LeaveOutcome::Left
    };

    tx.commit().await?;

    tracing::debug!(project_id, developer_id, unassigned, outcome = ?outcome, "Developer left project");
    Ok(outcome)
}

/// Count a project's reports per status
pub async fn project_stats(
    pool: &SqlitePool,
    project_id: &str,
) -> Result<ProjectStats, SqliteError> {
    let rows = sqlx::query_as::<_, (String, i64)>(
        "SELECT status, COUNT(*) FROM reports WHERE project_id = ? GROUP BY status",
    )
    .bind(project_id)
    .fetch_all(pool)
    .await?;

    let mut stats = ProjectStats::default();
    for (status, count) in rows {
        match status.as_str() {
            "new" => stats.new = count,
            "pending" => stats.pending = count,
            "fixed" => stats.fixed = count,
            other => tracing::warn!(project_id, status = other, "Unknown report status"),
        }
    }
    Ok(stats)
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
        sqlx::query("INSERT INTO users (id, created_at, updated_at) VALUES ('alice', 0, 0)")
            .execute(&pool)
            .await
            .unwrap();
        pool
    }

    async fn developers(pool: &SqlitePool, project_id: &str) -> Vec<String> {
        sqlx::query_scalar(
            "SELECT developer_id FROM developments WHERE project_id = ? ORDER BY developer_id",
        )
        .bind(project_id)
        .fetch_all(pool)
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_project_adds_creator_as_developer() {
        let pool = setup_test_pool().await;

        let project = create_project(&pool, "Checkout", "alice").await.unwrap();
        assert_eq!(project.name, "Checkout");
        assert_eq!(developers(&pool, &project.id).await, vec!["alice"]);

        let listed = list_projects_for_user(&pool, "alice").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, project.id);
        assert!(get_project(&pool, &project.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_leave_last_developer_deletes_project() {
        let pool = setup_test_pool().await;
        let project = create_project(&pool, "Solo", "alice").await.unwrap();

        let outcome = leave_project(&pool, &project.id, "alice").await.unwrap();
        assert_eq!(outcome, LeaveOutcome::Deleted);
        assert!(get_project(&pool, &project.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_leave_with_remaining_developers_keeps_project() {
        let pool = setup_test_pool().await;
        let project = create_project(&pool, "Shared", "alice").await.unwrap();
        let other = create_project(&pool, "Other", "alice").await.unwrap();
        sqlx::query("INSERT INTO users (id, created_at, updated_at) VALUES ('bob', 0, 0)")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query(
            "INSERT INTO developments (project_id, developer_id, created_at) VALUES (?, 'bob', 0)",
        )
        .bind(&project.id)
        .execute(&pool)
        .await
        .unwrap();

        let outcome = leave_project(&pool, &project.id, "alice").await.unwrap();
        assert_eq!(outcome, LeaveOutcome::Left);
        assert_eq!(developers(&pool, &project.id).await, vec!["bob"]);
        // Membership in other projects is untouched
        assert_eq!(developers(&pool, &other.id).await, vec!["alice"]);
    }

    #[tokio::test]
    async fn test_leave_drops_assignments_on_project_reports() {
        let pool = setup_test_pool().await;
        let project = create_project(&pool, "Shared", "alice").await.unwrap();
        let other = create_project(&pool, "Other", "alice").await.unwrap();
        sqlx::query("INSERT INTO users (id, created_at, updated_at) VALUES ('bob', 0, 0)")
            .execute(&pool)
            .await
            .unwrap();
        for (report_id, project_id) in [("r1", &project.id), ("r2", &other.id)] {
            sqlx::query(
                "INSERT INTO developments (project_id, developer_id, created_at) VALUES (?, 'bob', 0)",
            )
            .bind(project_id)
            .execute(&pool)
            .await
            .unwrap();
            sqlx::query(
                "INSERT INTO reports (id, project_id, reporter_id, summary, created_at) VALUES (?, ?, 'alice', 's', 0)",
            )
            .bind(report_id)
            .bind(project_id)
            .execute(&pool)
            .await
            .unwrap();
            sqlx::query(
                "INSERT INTO assignments (report_id, developer_id, created_at) VALUES (?, 'bob', 0)",
            )
            .bind(report_id)
            .execute(&pool)
            .await
            .unwrap();
        }

        let outcome = leave_project(&pool, &project.id, "bob").await.unwrap();
        assert_eq!(outcome, LeaveOutcome::Left);

        let remaining: Vec<String> = sqlx::query_scalar(
            "SELECT report_id FROM assignments WHERE developer_id = 'bob' ORDER BY report_id",
        )
        .fetch_all(&pool)
        .await
        .unwrap();
        assert_eq!(remaining, vec!["r2"]);
    }

    #[tokio::test]
    async fn test_leave_when_not_developer() {
        let pool = setup_test_pool().await;
        let project = create_project(&pool, "Mine", "alice").await.unwrap();

        let outcome = leave_project(&pool, &project.id, "mallory").await.unwrap();
        assert_eq!(outcome, LeaveOutcome::NotDeveloper);
        assert_eq!(developers(&pool, &project.id).await, vec!["alice"]);
    }

    #[tokio::test]
    async fn test_search_projects_escapes_and_ignores_case() {
        let pool = setup_test_pool().await;
        create_project(&pool, "Payments_API", "alice").await.unwrap();
        create_project(&pool, "PaymentsXAPI", "alice").await.unwrap();
        create_project(&pool, "100% Uptime", "alice").await.unwrap();

        let found = search_projects(&pool, "payments_", 1, 20).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Payments_API");

        let found = search_projects(&pool, "PAYMENTS", 1, 20).await.unwrap();
        assert_eq!(found.len(), 2);

        let found = search_projects(&pool, "100%", 1, 20).await.unwrap();
        assert_eq!(found.len(), 1);

        let page_two = search_projects(&pool, "payments", 2, 1).await.unwrap();
        assert_eq!(page_two.len(), 1);
        assert_eq!(page_two[0].name, "PaymentsXAPI");
    }

    #[tokio::test]
    async fn test_project_stats_counts_by_status() {
        let pool = setup_test_pool().await;
        let project = create_project(&pool, "Stats", "alice").await.unwrap();
        for (id, status) in [("r1", "new"), ("r2", "new"), ("r3", "fixed")] {
            sqlx::query(
                "INSERT INTO reports (id, project_id, reporter_id, summary, status, created_at) VALUES (?, ?, 'alice', 's', ?, 0)",
            )
            .bind(id)
            .bind(&project.id)
            .bind(status)
            .execute(&pool)
            .await
            .unwrap();
        }

        let stats = project_stats(&pool, &project.id).await.unwrap();
        assert_eq!(
            stats,
            ProjectStats {
                new: 2,
                pending: 0,
                fixed: 1
            }
        );
        assert_eq!(stats.total(), 3);
    }
}
