//! User repository for SQLite operations
//!
//! Only the locally owned part of a profile (avatar and status) is stored
//! here. Names and emails come from the identity provider.

use sqlx::SqlitePool;

use crate::data::sqlite::SqliteError;
use crate::data::types::UserRow;

type UserTuple = (String, Option<Vec<u8>>, Option<String>, Option<String>, i64, i64);

fn user_from_tuple(
    (id, avatar, avatar_mime, status, created_at, updated_at): UserTuple,
) -> UserRow {
    UserRow {
        id,
        avatar,
        avatar_mime,
        status,
        created_at,
        updated_at,
    }
}

/// Insert a user row unless one exists. Returns true if a row was created.
pub async fn add_user_if_none(pool: &SqlitePool, id: &str) -> Result<bool, SqliteError> {
    let now = chrono::Utc::now().timestamp();
    let result = sqlx::query(
        "INSERT OR IGNORE INTO users (id, created_at, updated_at) VALUES (?, ?, ?)",
    )
    .bind(id)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    let created = result.rows_affected() > 0;
    if created {
        tracing::debug!(user_id = %id, "Created local user");
    }
    Ok(created)
}

/// Get a user's local profile
pub async fn get_profile(pool: &SqlitePool, id: &str) -> Result<Option<UserRow>, SqliteError> {
    let row = sqlx::query_as::<_, UserTuple>(
        "SELECT id, avatar, avatar_mime, status, created_at, updated_at FROM users WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(user_from_tuple))
}

/// Get the local profiles of several users; unknown IDs are skipped
pub async fn get_profiles(pool: &SqlitePool, ids: &[String]) -> Result<Vec<UserRow>, SqliteError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let placeholders = vec!["?"; ids.len()].join(", ");
    let sql = format!(
        "SELECT id, avatar, avatar_mime, status, created_at, updated_at FROM users WHERE id IN ({})",
        placeholders
    );

    let mut query = sqlx::query_as::<_, UserTuple>(&sql);
    for id in ids {
        query = query.bind(id);
    }
    let rows = query.fetch_all(pool).await?;

    Ok(rows.into_iter().map(user_from_tuple).collect())
}

/// Store an avatar image, creating the user row if needed
pub async fn set_avatar(
    pool: &SqlitePool,
    id: &str,
    avatar: &[u8],
    mime: &str,
) -> Result<(), SqliteError> {
    let now = chrono::Utc::now().timestamp();
    sqlx::query(
        r#"
        INSERT INTO users (id, avatar, avatar_mime, created_at, updated_at) VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            avatar = excluded.avatar,
            avatar_mime = excluded.avatar_mime,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(id)
    .bind(avatar)
    .bind(mime)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    tracing::debug!(user_id = %id, bytes = avatar.len(), mime, "Avatar updated");
    Ok(())
}

/// Set or clear (`None`) the user's status line, creating the user row if needed
pub async fn set_status(
    pool: &SqlitePool,
    id: &str,
    status: Option<&str>,
) -> Result<(), SqliteError> {
    let now = chrono::Utc::now().timestamp();
    sqlx::query(
        r#"
        INSERT INTO users (id, status, created_at, updated_at) VALUES (?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            status = excluded.status,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(id)
    .bind(status)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}

/// Delete a user and every project they are the sole developer of
///
/// Runs in one transaction. Memberships, assignments and upvotes go with the
/// user row by cascade; filed reports and comments are kept. Returns the
/// number of projects deleted.
pub async fn delete_user(pool: &SqlitePool, id: &str) -> Result<u64, SqliteError> {
    let mut tx = pool.begin().await?;

    let projects = sqlx::query(
        r#"
        DELETE FROM projects
        WHERE id IN (SELECT project_id FROM developments WHERE developer_id = ?)
          AND (SELECT COUNT(*) FROM developments d WHERE d.project_id = projects.id) = 1
        "#,
    )
    .bind(id)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::debug!(user_id = %id, deleted_projects = projects, "Deleted local user");
    Ok(projects)
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
        pool
    }

    #[tokio::test]
    async fn test_add_user_if_none_is_idempotent() {
        let pool = setup_test_pool().await;

        assert!(add_user_if_none(&pool, "auth0|alice").await.unwrap());
        assert!(!add_user_if_none(&pool, "auth0|alice").await.unwrap());

        let user = get_profile(&pool, "auth0|alice").await.unwrap().unwrap();
        assert_eq!(user.id, "auth0|alice");
        assert!(user.avatar.is_none());
        assert!(user.status.is_none());
    }

    #[tokio::test]
    async fn test_set_avatar_and_status_upsert() {
        let pool = setup_test_pool().await;

        set_avatar(&pool, "auth0|bob", &[1, 2, 3], "image/png")
            .await
            .unwrap();
        set_status(&pool, "auth0|bob", Some("On vacation"))
            .await
            .unwrap();

        let user = get_profile(&pool, "auth0|bob").await.unwrap().unwrap();
        assert_eq!(user.avatar.as_deref(), Some(&[1u8, 2, 3][..]));
        assert_eq!(user.avatar_mime.as_deref(), Some("image/png"));
        assert_eq!(user.status.as_deref(), Some("On vacation"));

        set_status(&pool, "auth0|bob", None).await.unwrap();
        let user = get_profile(&pool, "auth0|bob").await.unwrap().unwrap();
        assert!(user.status.is_none());
        assert!(user.avatar.is_some());
    }

    #[tokio::test]
    async fn test_get_profiles_skips_unknown() {
        let pool = setup_test_pool().await;
        add_user_if_none(&pool, "a").await.unwrap();
        add_user_if_none(&pool, "b").await.unwrap();

        let ids = vec!["a".to_string(), "b".to_string(), "missing".to_string()];
        let mut rows = get_profiles(&pool, &ids).await.unwrap();
        rows.sort_by(|x, y| x.id.cmp(&y.id));
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, "a");

        assert!(get_profiles(&pool, &[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_user_removes_sole_developer_projects() {
        let pool = setup_test_pool().await;
        add_user_if_none(&pool, "alice").await.unwrap();
        add_user_if_none(&pool, "bob").await.unwrap();
        sqlx::query(
            "INSERT INTO projects (id, name, created_at) VALUES ('solo', 'Solo', 0), ('shared', 'Shared', 0)",
        )
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query(
            "INSERT INTO developments (project_id, developer_id, created_at) VALUES ('solo', 'alice', 0), ('shared', 'alice', 0), ('shared', 'bob', 0)",
        )
        .execute(&pool)
        .await
        .unwrap();

        let deleted = delete_user(&pool, "alice").await.unwrap();
        assert_eq!(deleted, 1);

        let projects: Vec<String> = sqlx::query_scalar("SELECT id FROM projects")
            .fetch_all(&pool)
            .await
            .unwrap();
        assert_eq!(projects, vec!["shared".to_string()]);

        let members: Vec<String> =
            sqlx::query_scalar("SELECT developer_id FROM developments WHERE project_id = 'shared'")
                .fetch_all(&pool)
                .await
                .unwrap();
        assert_eq!(members, vec!["bob".to_string()]);
        assert!(get_profile(&pool, "alice").await.unwrap().is_none());
    }
}
