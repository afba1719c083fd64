//! Project membership ("development") repository

use sqlx::SqlitePool;

use crate::data::sqlite::SqliteError;

/// List developer IDs of a project in the order they joined
pub async fn list_developers(
    pool: &SqlitePool,
    project_id: &str,
) -> Result<Vec<String>, SqliteError> {
    let ids = sqlx::query_scalar(
        "SELECT developer_id FROM developments WHERE project_id = ? ORDER BY created_at, developer_id",
    )
    .bind(project_id)
    .fetch_all(pool)
    .await?;
    Ok(ids)
}

/// Check whether a user develops a project
pub async fn is_developer(
    pool: &SqlitePool,
    project_id: &str,
    user_id: &str,
) -> Result<bool, SqliteError> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM developments WHERE project_id = ? AND developer_id = ?)",
    )
    .bind(project_id)
    .bind(user_id)
    .fetch_one(pool)
    .await?;
    Ok(exists)
}

/// Add a developer to a project. Returns false if they already were one.
///
/// The user may never have logged in, so a local user row is created first.
pub async fn add_developer(
    pool: &SqlitePool,
    project_id: &str,
    user_id: &str,
) -> Result<bool, SqliteError> {
    let now = chrono::Utc::now().timestamp();
    let mut tx = pool.begin().await?;

    sqlx::query("INSERT OR IGNORE INTO users (id, created_at, updated_at) VALUES (?, ?, ?)")
        .bind(user_id)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

    let added = sqlx::query(
        "INSERT OR IGNORE INTO developments (project_id, developer_id, created_at) VALUES (?, ?, ?)",
    )
    .bind(project_id)
    .bind(user_id)
    .bind(now)
    .execute(&mut *tx)
    .await?
    .rows_affected()
        > 0;

    tx.commit().await?;

    if added {
        tracing::debug!(project_id, developer_id = user_id, "Developer added");
    }
    Ok(added)
}
