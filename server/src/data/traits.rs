//! Repository traits for the transactional store
//!
//! Handlers talk to the database through `TransactionalRepository` so the
//! backend stays swappable and tests can run against an in-memory pool.

use async_trait::async_trait;

use crate::data::error::DataError;
use crate::data::types::{
    AssignedReportRow, BugTag, CommentRow, LeaveOutcome, NewReport, ProjectRow, ProjectStats,
    ReportQuery, ReportRow, UserRow,
};

/// Repository trait for users, projects, reports and everything attached to them
#[async_trait]
pub trait TransactionalRepository: Send + Sync {
    // ==================== User Operations ====================

    /// Insert the local user row on first login. Returns true if created.
    async fn add_user_if_none(&self, id: &str) -> Result<bool, DataError>;

    async fn get_profile(&self, id: &str) -> Result<Option<UserRow>, DataError>;

    /// Local profiles for several users; unknown IDs are skipped
    async fn get_profiles(&self, ids: &[String]) -> Result<Vec<UserRow>, DataError>;

    async fn set_avatar(&self, id: &str, avatar: &[u8], mime: &str) -> Result<(), DataError>;

    /// Set or clear the status line
    async fn set_status(&self, id: &str, status: Option<&str>) -> Result<(), DataError>;

    /// Delete the user and projects they develop alone. Returns deleted project count.
    async fn delete_user(&self, id: &str) -> Result<u64, DataError>;

    // ==================== Project Operations ====================

    async fn search_projects(
        &self,
        query: &str,
        page: u32,
        limit: u32,
    ) -> Result<Vec<ProjectRow>, DataError>;

    async fn list_projects_for_user(&self, user_id: &str) -> Result<Vec<ProjectRow>, DataError>;

    async fn get_project(&self, id: &str) -> Result<Option<ProjectRow>, DataError>;

    /// Create a project with the creator as its first developer
    async fn create_project(&self, name: &str, creator_id: &str) -> Result<ProjectRow, DataError>;

    async fn leave_project(
        &self,
        project_id: &str,
        developer_id: &str,
    ) -> Result<LeaveOutcome, DataError>;

    async fn project_stats(&self, project_id: &str) -> Result<ProjectStats, DataError>;

    // ==================== Development Operations ====================

    async fn list_developers(&self, project_id: &str) -> Result<Vec<String>, DataError>;

    async fn is_developer(&self, project_id: &str, user_id: &str) -> Result<bool, DataError>;

    async fn add_developer(&self, project_id: &str, user_id: &str) -> Result<bool, DataError>;

    // ==================== Report Operations ====================

    async fn list_reports(
        &self,
        project_id: &str,
        query: ReportQuery,
    ) -> Result<Vec<ReportRow>, DataError>;

    async fn get_report(&self, id: &str) -> Result<Option<ReportRow>, DataError>;

    async fn create_report(&self, report: &NewReport) -> Result<ReportRow, DataError>;

    /// Apply a triage tag. Returns false if the report doesn't exist.
    async fn update_tag(&self, report_id: &str, tag: BugTag) -> Result<bool, DataError>;

    async fn set_help_wanted(&self, report_id: &str, help_wanted: bool) -> Result<bool, DataError>;

    async fn list_assigned_reports(&self, user_id: &str)
    -> Result<Vec<AssignedReportRow>, DataError>;

    // ==================== Comment Operations ====================

    async fn add_comment(
        &self,
        report_id: &str,
        commenter_id: &str,
        reply_to: Option<&str>,
        body: &str,
    ) -> Result<CommentRow, DataError>;

    /// Comments on a report, newest first
    async fn list_comments(&self, report_id: &str) -> Result<Vec<CommentRow>, DataError>;

    // ==================== Assignment Operations ====================

    async fn list_assignees(&self, report_id: &str) -> Result<Vec<String>, DataError>;

    async fn add_assignment(&self, report_id: &str, developer_id: &str) -> Result<bool, DataError>;

    async fn remove_assignment(
        &self,
        report_id: &str,
        developer_id: &str,
    ) -> Result<bool, DataError>;

    // ==================== Upvote Operations ====================

    async fn add_upvote(&self, report_id: &str, user_id: &str) -> Result<bool, DataError>;

    async fn remove_upvote(&self, report_id: &str, user_id: &str) -> Result<bool, DataError>;

    async fn has_upvoted(&self, report_id: &str, user_id: &str) -> Result<bool, DataError>;
}
