//! Page view models
//!
//! Each account page returns one of these as JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::api::types::{ApiError, timestamp_to_datetime};
use crate::data::types::{
    AssignedReportRow, CommentRow, Priority, ProjectRow, ProjectStats, ReportFilter, ReportQuery,
    ReportRow, ReportSort, ReportStatus, Severity, SortOrder,
};
use crate::domain::UserProfile;
use crate::utils::avatar::project_avatar_url;

#[derive(Debug, Serialize, ToSchema)]
pub struct ProjectDto {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    /// Generated avatar, seeded by the project ID
    pub avatar_url: String,
}

impl From<ProjectRow> for ProjectDto {
    fn from(row: ProjectRow) -> Self {
        Self {
            avatar_url: project_avatar_url(&row.id),
            id: row.id,
            name: row.name,
            created_at: timestamp_to_datetime(row.created_at),
        }
    }
}

/// Report counts per status
#[derive(Debug, Serialize, ToSchema)]
pub struct ProjectStatsDto {
    pub new: i64,
    pub pending: i64,
    pub fixed: i64,
    pub total: i64,
}

impl From<ProjectStats> for ProjectStatsDto {
    fn from(stats: ProjectStats) -> Self {
        Self {
            new: stats.new,
            pending: stats.pending,
            fixed: stats.fixed,
            total: stats.total(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReportDto {
    pub id: String,
    pub project_id: String,
    pub reporter_id: String,
    pub summary: String,
    pub software_version: String,
    pub device: String,
    pub os: String,
    pub expected_result: String,
    pub actual_result: String,
    pub steps: String,
    pub details: String,
    pub priority: Priority,
    pub severity: Severity,
    pub status: ReportStatus,
    pub help_wanted: bool,
    pub upvotes: i64,
    pub created_at: DateTime<Utc>,
}

impl From<ReportRow> for ReportDto {
    fn from(row: ReportRow) -> Self {
        Self {
            id: row.id,
            project_id: row.project_id,
            reporter_id: row.reporter_id,
            summary: row.summary,
            software_version: row.software_version,
            device: row.device,
            os: row.os,
            expected_result: row.expected_result,
            actual_result: row.actual_result,
            steps: row.steps,
            details: row.details,
            priority: row.priority,
            severity: row.severity,
            status: row.status,
            help_wanted: row.help_wanted,
            upvotes: row.upvotes,
            created_at: timestamp_to_datetime(row.created_at),
        }
    }
}

/// A report assigned to the current user, with its project's name
#[derive(Debug, Serialize, ToSchema)]
pub struct AssignedReportDto {
    #[serde(flatten)]
    pub report: ReportDto,
    pub project_name: String,
}

impl From<AssignedReportRow> for AssignedReportDto {
    fn from(row: AssignedReportRow) -> Self {
        Self {
            report: row.report.into(),
            project_name: row.project_name,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CommentDto {
    pub id: String,
    pub commenter_id: String,
    pub commenter_name: String,
    pub commenter_avatar: Option<String>,
    pub reply_to: Option<String>,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl CommentDto {
    pub fn new(row: CommentRow, commenter: Option<&UserProfile>) -> Self {
        let (commenter_name, commenter_avatar) = match commenter {
            Some(profile) => (profile.name.clone(), profile.avatar.clone()),
            None => (row.commenter_id.clone(), None),
        };
        Self {
            id: row.id,
            commenter_id: row.commenter_id,
            commenter_name,
            commenter_avatar,
            reply_to: row.reply_to,
            body: row.body,
            created_at: timestamp_to_datetime(row.created_at),
        }
    }
}

// ============================================================================
// Pages
// ============================================================================

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardView {
    pub user: UserProfile,
    pub projects: Vec<ProjectDto>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileView {
    pub user: UserProfile,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProjectView {
    pub project: ProjectDto,
    pub developers: Vec<UserProfile>,
    pub stats: ProjectStatsDto,
    pub is_developer: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TasksView {
    pub reports: Vec<AssignedReportDto>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReportsView {
    pub project: ProjectDto,
    pub filter: String,
    pub sort: ReportSort,
    pub order: SortOrder,
    pub reports: Vec<ReportDto>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReportView {
    pub report: ReportDto,
    pub project: ProjectDto,
    pub assignees: Vec<UserProfile>,
    /// Developers of the project not yet assigned
    pub available_developers: Vec<UserProfile>,
    pub current_user_id: String,
    pub has_upvoted: bool,
    pub is_developer: bool,
    /// Newest first
    pub comments: Vec<CommentDto>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoggedOutView {
    pub message: String,
}

/// Query params for the report listing
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct ReportsQuery {
    /// `all`, `new`, `pending` or `fixed`
    #[validate(length(max = 16, message = "filter is too long"))]
    pub filter: Option<String>,

    /// `date`, `upvotes`, `priority`, `severity` or `status`
    #[validate(length(max = 16, message = "sort is too long"))]
    pub sort: Option<String>,

    /// `asc` or `desc` (`Ascending`/`Descending` also accepted)
    #[validate(length(max = 16, message = "order is too long"))]
    pub order: Option<String>,
}

impl ReportsQuery {
    /// Parse against the whitelists; missing or blank values take the defaults
    pub fn to_report_query(&self) -> Result<ReportQuery, ApiError> {
        fn present(value: &Option<String>) -> Option<&str> {
            value.as_deref().map(str::trim).filter(|v| !v.is_empty())
        }

        let filter = match present(&self.filter) {
            Some(v) => ReportFilter::parse(v).ok_or_else(|| {
                ApiError::bad_request("INVALID_FILTER", format!("Unknown filter: {}", v))
            })?,
            None => ReportFilter::default(),
        };
        let sort = match present(&self.sort) {
            Some(v) => ReportSort::parse(v).ok_or_else(|| {
                ApiError::bad_request("INVALID_SORT", format!("Cannot sort by: {}", v))
            })?,
            None => ReportSort::default(),
        };
        let order = match present(&self.order) {
            Some(v) => SortOrder::parse(v).ok_or_else(|| {
                ApiError::bad_request("INVALID_ORDER", format!("Unknown order: {}", v))
            })?,
            None => SortOrder::default(),
        };

        Ok(ReportQuery {
            filter,
            sort,
            order,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reports_query_defaults() {
        let query = ReportsQuery::default().to_report_query().unwrap();
        assert_eq!(query, ReportQuery::default());
        assert_eq!(query.filter, ReportFilter::All);
        assert_eq!(query.sort, ReportSort::Date);
        assert_eq!(query.order, SortOrder::Desc);
    }

    #[test]
    fn test_reports_query_parses_whitelisted_values() {
        let query = ReportsQuery {
            filter: Some("Pending".into()),
            sort: Some("upvotes".into()),
            order: Some("Ascending".into()),
        }
        .to_report_query()
        .unwrap();
        assert_eq!(query.filter, ReportFilter::Status(ReportStatus::Pending));
        assert_eq!(query.sort, ReportSort::Upvotes);
        assert_eq!(query.order, SortOrder::Asc);
    }

    #[test]
    fn test_reports_query_rejects_unknown_sort() {
        let err = ReportsQuery {
            sort: Some("reporter_id; --".into()),
            ..Default::default()
        }
        .to_report_query()
        .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest { ref code, .. } if code == "INVALID_SORT"));
    }

    #[test]
    fn test_project_dto_has_generated_avatar() {
        let dto = ProjectDto::from(ProjectRow {
            id: "abc".into(),
            name: "Core".into(),
            created_at: 0,
        });
        assert!(dto.avatar_url.contains("seed=abc"));
    }
}
