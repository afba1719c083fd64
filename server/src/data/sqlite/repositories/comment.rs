//! Comment repository for SQLite operations

use sqlx::SqlitePool;

use crate::data::sqlite::SqliteError;
use crate::data::types::{CommentRow, HashTable};

use super::hash::find_unique_hash;

type CommentTuple = (String, String, String, Option<String>, String, i64);

fn comment_from_tuple(
    (id, report_id, commenter_id, reply_to, body, created_at): CommentTuple,
) -> CommentRow {
    CommentRow {
        id,
        report_id,
        commenter_id,
        reply_to,
        body,
        created_at,
    }
}

/// Append a comment to a report
///
/// A `reply_to` that doesn't name a comment on the same report is dropped,
/// and the comment is stored as a top-level one.
pub async fn add_comment(
    pool: &SqlitePool,
    report_id: &str,
    commenter_id: &str,
    reply_to: Option<&str>,
    body: &str,
) -> Result<CommentRow, SqliteError> {
    let now = chrono::Utc::now().timestamp();
    let mut tx = pool.begin().await?;

    let reply_to = match reply_to {
        Some(parent) => {
            let exists: bool = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM comments WHERE id = ? AND report_id = ?)",
            )
            .bind(parent)
            .bind(report_id)
            .fetch_one(&mut *tx)
            .await?;
            if !exists {
                tracing::debug!(report_id, reply_to = parent, "Ignoring unknown reply target");
            }
            exists.then(|| parent.to_string())
        }
        None => None,
    };

    let id = find_unique_hash(&mut tx, HashTable::Comments).await?;

    sqlx::query(
        "INSERT INTO comments (id, report_id, commenter_id, reply_to, body, created_at) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(report_id)
    .bind(commenter_id)
    .bind(&reply_to)
    .bind(body)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::debug!(comment_id = %id, report_id, commenter_id, "Comment added");
    Ok(CommentRow {
        id,
        report_id: report_id.to_string(),
        commenter_id: commenter_id.to_string(),
        reply_to,
        body: body.to_string(),
        created_at: now,
    })
}

/// List a report's comments, newest first
pub async fn list_comments(
    pool: &SqlitePool,
    report_id: &str,
) -> Result<Vec<CommentRow>, SqliteError> {
    let rows = sqlx::query_as::<_, CommentTuple>(
        r#"
        SELECT id, report_id, commenter_id, reply_to, body, created_at
        FROM comments
        WHERE report_id = ?
        ORDER BY created_at DESC, rowid DESC
        "#,
    )
    .bind(report_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(comment_from_tuple).collect())
}
