//! Bug report repository for SQLite operations

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::data::sqlite::SqliteError;
use crate::data::types::{
    AssignedReportRow, BugTag, HashTable, NewReport, Priority, ReportFilter, ReportQuery,
    ReportRow, ReportStatus, Severity,
};

use super::hash::find_unique_hash;

/// Report columns plus the derived upvote count, for tables aliased as `r`
const REPORT_SELECT: &str = r#"
    SELECT r.id, r.project_id, r.reporter_id, r.summary, r.software_version, r.device, r.os,
           r.expected_result, r.actual_result, r.steps, r.details, r.priority, r.severity,
           r.status, r.help_wanted, r.created_at,
           (SELECT COUNT(*) FROM upvotes u WHERE u.report_id = r.id) AS upvote_count
    FROM reports r
"#;

fn invalid_column(column: &str, value: impl std::fmt::Display) -> SqliteError {
    SqliteError::Database(sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: format!("unexpected value '{}'", value).into(),
    })
}

fn report_from_row(row: &SqliteRow) -> Result<ReportRow, SqliteError> {
    let priority: String = row.try_get("priority")?;
    let severity: i64 = row.try_get("severity")?;
    let status: String = row.try_get("status")?;

    Ok(ReportRow {
        id: row.try_get("id")?,
        project_id: row.try_get("project_id")?,
        reporter_id: row.try_get("reporter_id")?,
        summary: row.try_get("summary")?,
        software_version: row.try_get("software_version")?,
        device: row.try_get("device")?,
        os: row.try_get("os")?,
        expected_result: row.try_get("expected_result")?,
        actual_result: row.try_get("actual_result")?,
        steps: row.try_get("steps")?,
        details: row.try_get("details")?,
        priority: Priority::parse(&priority).ok_or_else(|| invalid_column("priority", &priority))?,
        severity: Severity::new(severity).ok_or_else(|| invalid_column("severity", severity))?,
        status: ReportStatus::parse(&status).ok_or_else(|| invalid_column("status", &status))?,
        help_wanted: row.try_get::<i64, _>("help_wanted")? != 0,
        created_at: row.try_get("created_at")?,
        upvotes: row.try_get("upvote_count")?,
    })
}

/// File a new report with default triage state
pub async fn create_report(pool: &SqlitePool, report: &NewReport) -> Result<ReportRow, SqliteError> {
    let now = chrono::Utc::now().timestamp();
    let mut tx = pool.begin().await?;

    let id = find_unique_hash(&mut tx, HashTable::Reports).await?;

    sqlx::query(
        r#"
        INSERT INTO reports (
            id, project_id, reporter_id, summary, software_version, device, os,
            expected_result, actual_result, steps, details, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&report.project_id)
    .bind(&report.reporter_id)
    .bind(&report.summary)
    .bind(&report.software_version)
    .bind(&report.device)
    .bind(&report.os)
    .bind(&report.expected_result)
    .bind(&report.actual_result)
    .bind(&report.steps)
    .bind(&report.details)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::debug!(report_id = %id, project_id = %report.project_id, "Report filed");
    Ok(ReportRow {
        id,
        project_id: report.project_id.clone(),
        reporter_id: report.reporter_id.clone(),
        summary: report.summary.clone(),
        software_version: report.software_version.clone(),
        device: report.device.clone(),
        os: report.os.clone(),
        expected_result: report.expected_result.clone(),
        actual_result: report.actual_result.clone(),
        steps: report.steps.clone(),
        details: report.details.clone(),
        priority: Priority::default(),
        severity: Severity::default(),
        status: ReportStatus::default(),
        help_wanted: false,
        created_at: now,
        upvotes: 0,
    })
}

/// Get a report by ID
pub async fn get_report(pool: &SqlitePool, id: &str) -> Result<Option<ReportRow>, SqliteError> {
    let sql = format!("{} WHERE r.id = ?", REPORT_SELECT);
    let row = sqlx::query(&sql).bind(id).fetch_optional(pool).await?;
    row.as_ref().map(report_from_row).transpose()
}

/// List a project's reports with the given filter and ordering
pub async fn list_reports(
    pool: &SqlitePool,
    project_id: &str,
    query: ReportQuery,
) -> Result<Vec<ReportRow>, SqliteError> {
    let status_clause = match query.filter {
        ReportFilter::All => "",
        ReportFilter::Status(_) => " AND r.status = ?",
    };
    let sql = format!(
        "{} WHERE r.project_id = ?{} ORDER BY {} {}, r.created_at DESC, r.id",
        REPORT_SELECT,
        status_clause,
        query.sort.sql_expr(),
        query.order.as_sql()
    );

    let mut q = sqlx::query(&sql).bind(project_id);
    if let ReportFilter::Status(status) = query.filter {
        q = q.bind(status.as_str());
    }
    let rows = q.fetch_all(pool).await?;

    rows.iter().map(report_from_row).collect()
}

/// List reports assigned to a user across all projects, newest first
pub async fn list_assigned_reports(
    pool: &SqlitePool,
    user_id: &str,
) -> Result<Vec<AssignedReportRow>, SqliteError> {
    let sql = format!(
        r#"
        SELECT r.*, p.name AS project_name
        FROM ({}) r
        JOIN projects p ON p.id = r.project_id
        JOIN assignments a ON a.report_id = r.id
        WHERE a.developer_id = ?
        ORDER BY r.created_at DESC, r.id
        "#,
        REPORT_SELECT
    );

    let rows = sqlx::query(&sql).bind(user_id).fetch_all(pool).await?;
    rows.iter()
        .map(|row| {
            Ok(AssignedReportRow {
                report: report_from_row(row)?,
                project_name: row.try_get("project_name")?,
            })
        })
        .collect()
}

/// Apply a triage tag. Returns false if the report doesn't exist.
pub async fn update_tag(
    pool: &SqlitePool,
    report_id: &str,
    tag: BugTag,
) -> Result<bool, SqliteError> {
    let result = match tag {
        BugTag::Status(status) => {
            sqlx::query("UPDATE reports SET status = ? WHERE id = ?")
                .bind(status.as_str())
                .bind(report_id)
                .execute(pool)
                .await?
        }
        BugTag::Priority(priority) => {
            sqlx::query("UPDATE reports SET priority = ? WHERE id = ?")
                .bind(priority.as_str())
                .bind(report_id)
                .execute(pool)
                .await?
        }
        BugTag::Severity(severity) => {
            sqlx::query("UPDATE reports SET severity = ? WHERE id = ?")
                .bind(i64::from(severity))
                .bind(report_id)
                .execute(pool)
                .await?
        }
    };

    let updated = result.rows_affected() > 0;
    if updated {
        tracing::debug!(report_id, column = tag.column(), "Report tag updated");
    }
    Ok(updated)
}

/// Set the help-wanted flag. Returns false if the report doesn't exist.
pub async fn set_help_wanted(
    pool: &SqlitePool,
    report_id: &str,
    help_wanted: bool,
) -> Result<bool, SqliteError> {
    let result = sqlx::query("UPDATE reports SET help_wanted = ? WHERE id = ?")
        .bind(help_wanted as i64)
        .bind(report_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sqlite::repositories::project::create_project;
    use crate::data::types::{ReportSort, SortOrder};

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

    fn new_report(project_id: &str, summary: &str) -> NewReport {
        NewReport {
            project_id: project_id.to_string(),
            reporter_id: "alice".to_string(),
            summary: summary.to_string(),
            software_version: "1.2.0".to_string(),
            device: "Pixel 8".to_string(),
            os: "Android 15".to_string(),
            expected_result: "Saves".to_string(),
            actual_result: "Crashes".to_string(),
            steps: "Tap save".to_string(),
            details: String::new(),
        }
    }

    async fn set_created_at(pool: &SqlitePool, id: &str, ts: i64) {
        sqlx::query("UPDATE reports SET created_at = ? WHERE id = ?")
            .bind(ts)
            .bind(id)
            .execute(pool)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_create_and_get_report() {
        let pool = setup_test_pool().await;
        let project = create_project(&pool, "App", "alice").await.unwrap();

        let created = create_report(&pool, &new_report(&project.id, "Crash on save"))
            .await
            .unwrap();
        let fetched = get_report(&pool, &created.id).await.unwrap().unwrap();

        assert_eq!(fetched.summary, "Crash on save");
        assert_eq!(fetched.device, "Pixel 8");
        assert_eq!(fetched.priority, Priority::Medium);
        assert_eq!(fetched.severity, Severity::default());
        assert_eq!(fetched.status, ReportStatus::New);
        assert!(!fetched.help_wanted);
        assert_eq!(fetched.upvotes, 0);
        assert!(get_report(&pool, "missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_tag_and_help_wanted() {
        let pool = setup_test_pool().await;
        let project = create_project(&pool, "App", "alice").await.unwrap();
        let report = create_report(&pool, &new_report(&project.id, "Bug"))
            .await
            .unwrap();

        for (tag_type, value) in [("status", "pending"), ("priority", "critical"), ("severity", "5")] {
            let tag = BugTag::parse(tag_type, value).unwrap();
            assert!(update_tag(&pool, &report.id, tag).await.unwrap());
        }
        assert!(set_help_wanted(&pool, &report.id, true).await.unwrap());

        let fetched = get_report(&pool, &report.id).await.unwrap().unwrap();
        assert_eq!(fetched.status, ReportStatus::Pending);
        assert_eq!(fetched.priority, Priority::Critical);
        assert_eq!(fetched.severity.value(), 5);
        assert!(fetched.help_wanted);

        let tag = BugTag::parse("status", "fixed").unwrap();
        assert!(!update_tag(&pool, "missing", tag).await.unwrap());
        assert!(!set_help_wanted(&pool, "missing", true).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_reports_filter_and_sort() {
        let pool = setup_test_pool().await;
        let project = create_project(&pool, "App", "alice").await.unwrap();
        let a = create_report(&pool, &new_report(&project.id, "A")).await.unwrap();
        let b = create_report(&pool, &new_report(&project.id, "B")).await.unwrap();
        let c = create_report(&pool, &new_report(&project.id, "C")).await.unwrap();
        set_created_at(&pool, &a.id, 100).await;
        set_created_at(&pool, &b.id, 200).await;
        set_created_at(&pool, &c.id, 300).await;

        update_tag(&pool, &a.id, BugTag::Priority(Priority::Critical))
            .await
            .unwrap();
        update_tag(&pool, &b.id, BugTag::Priority(Priority::Low))
            .await
            .unwrap();
        update_tag(&pool, &c.id, BugTag::Status(ReportStatus::Fixed))
            .await
            .unwrap();
        for user in ["u1", "u2"] {
            sqlx::query("INSERT INTO users (id, created_at, updated_at) VALUES (?, 0, 0)")
                .bind(user)
                .execute(&pool)
                .await
                .unwrap();
            sqlx::query("INSERT INTO upvotes (report_id, user_id, created_at) VALUES (?, ?, 0)")
                .bind(&b.id)
                .bind(user)
                .execute(&pool)
                .await
                .unwrap();
        }

        let summaries = |rows: Vec<ReportRow>| rows.into_iter().map(|r| r.summary).collect::<Vec<_>>();

        let by_date = list_reports(&pool, &project.id, ReportQuery::default())
            .await
            .unwrap();
        assert_eq!(summaries(by_date), vec!["C", "B", "A"]);

        let by_priority = list_reports(
            &pool,
            &project.id,
            ReportQuery {
                sort: ReportSort::Priority,
                order: SortOrder::Asc,
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(summaries(by_priority), vec!["B", "C", "A"]);

        let by_upvotes = list_reports(
            &pool,
            &project.id,
            ReportQuery {
                sort: ReportSort::Upvotes,
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(by_upvotes[0].summary, "B");
        assert_eq!(by_upvotes[0].upvotes, 2);

        let fixed_only = list_reports(
            &pool,
            &project.id,
            ReportQuery {
                filter: ReportFilter::Status(ReportStatus::Fixed),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(summaries(fixed_only), vec!["C"]);
    }

    #[tokio::test]
    async fn test_list_assigned_reports() {
        let pool = setup_test_pool().await;
        let project = create_project(&pool, "Assigned App", "alice").await.unwrap();
        let report = create_report(&pool, &new_report(&project.id, "Mine"))
            .await
            .unwrap();
        create_report(&pool, &new_report(&project.id, "Not mine"))
            .await
            .unwrap();
        sqlx::query("INSERT INTO assignments (report_id, developer_id, created_at) VALUES (?, 'alice', 0)")
            .bind(&report.id)
            .execute(&pool)
            .await
            .unwrap();

        let assigned = list_assigned_reports(&pool, "alice").await.unwrap();
        assert_eq!(assigned.len(), 1);
        assert_eq!(assigned[0].report.id, report.id);
        assert_eq!(assigned[0].project_name, "Assigned App");
        assert!(list_assigned_reports(&pool, "bob").await.unwrap().is_empty());
    }
}
