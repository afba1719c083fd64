//! TransactionalRepository trait implementation for SQLite

use std::sync::Arc;

use async_trait::async_trait;

use crate::data::error::DataError;
use crate::data::traits::TransactionalRepository;
use crate::data::types::{
    AssignedReportRow, BugTag, CommentRow, LeaveOutcome, NewReport, ProjectRow, ProjectStats,
    ReportQuery, ReportRow, UserRow,
};

use super::SqliteService;
use super::repositories::{assignment, comment, development, project, report, upvote, user};

#[async_trait]
impl TransactionalRepository for Arc<SqliteService> {
    // ==================== User Operations ====================

    async fn add_user_if_none(&self, id: &str) -> Result<bool, DataError> {
        user::add_user_if_none(self.pool(), id)
            .await
            .map_err(Into::into)
    }

    async fn get_profile(&self, id: &str) -> Result<Option<UserRow>, DataError> {
        user::get_profile(self.pool(), id).await.map_err(Into::into)
    }

    async fn get_profiles(&self, ids: &[String]) -> Result<Vec<UserRow>, DataError> {
        user::get_profiles(self.pool(), ids)
            .await
            .map_err(Into::into)
    }

    async fn set_avatar(&self, id: &str, avatar: &[u8], mime: &str) -> Result<(), DataError> {
        user::set_avatar(self.pool(), id, avatar, mime)
            .await
            .map_err(Into::into)
    }

    async fn set_status(&self, id: &str, status: Option<&str>) -> Result<(), DataError> {
        user::set_status(self.pool(), id, status)
            .await
            .map_err(Into::into)
    }

    async fn delete_user(&self, id: &str) -> Result<u64, DataError> {
        user::delete_user(self.pool(), id).await.map_err(Into::into)
    }

    // ==================== Project Operations ====================

    async fn search_projects(
        &self,
        query: &str,
        page: u32,
        limit: u32,
    ) -> Result<Vec<ProjectRow>, DataError> {
        project::search_projects(self.pool(), query, page, limit)
            .await
            .map_err(Into::into)
    }

    async fn list_projects_for_user(&self, user_id: &str) -> Result<Vec<ProjectRow>, DataError> {
        project::list_projects_for_user(self.pool(), user_id)
            .await
            .map_err(Into::into)
    }

    async fn get_project(&self, id: &str) -> Result<Option<ProjectRow>, DataError> {
        project::get_project(self.pool(), id)
            .await
            .map_err(Into::into)
    }

    async fn create_project(&self, name: &str, creator_id: &str) -> Result<ProjectRow, DataError> {
        project::create_project(self.pool(), name, creator_id)
            .await
            .map_err(Into::into)
    }

    async fn leave_project(
        &self,
        project_id: &str,
        developer_id: &str,
    ) -> Result<LeaveOutcome, DataError> {
        project::leave_project(self.pool(), project_id, developer_id)
            .await
            .map_err(Into::into)
    }

    async fn project_stats(&self, project_id: &str) -> Result<ProjectStats, DataError> {
        project::project_stats(self.pool(), project_id)
            .await
            .map_err(Into::into)
    }

    // ==================== Development Operations ====================

    async fn list_developers(&self, project_id: &str) -> Result<Vec<String>, DataError> {
        development::list_developers(self.pool(), project_id)
            .await
            .map_err(Into::into)
    }

    async fn is_developer(&self, project_id: &str, user_id: &str) -> Result<bool, DataError> {
        development::is_developer(self.pool(), project_id, user_id)
            .await
            .map_err(Into::into)
    }

    async fn add_developer(&self, project_id: &str, user_id: &str) -> Result<bool, DataError> {
        development::add_developer(self.pool(), project_id, user_id)
            .await
            .map_err(Into::into)
    }

    // ==================== Report Operations ====================

    async fn list_reports(
        &self,
        project_id: &str,
        query: ReportQuery,
    ) -> Result<Vec<ReportRow>, DataError> {
        report::list_reports(self.pool(), project_id, query)
            .await
            .map_err(Into::into)
    }

    async fn get_report(&self, id: &str) -> Result<Option<ReportRow>, DataError> {
        report::get_report(self.pool(), id).await.map_err(Into::into)
    }

    async fn create_report(&self, new_report: &NewReport) -> Result<ReportRow, DataError> {
        report::create_report(self.pool(), new_report)
            .await
            .map_err(Into::into)
    }

    async fn update_tag(&self, report_id: &str, tag: BugTag) -> Result<bool, DataError> {
        report::update_tag(self.pool(), report_id, tag)
            .await
            .map_err(Into::into)
    }

    async fn set_help_wanted(&self, report_id: &str, help_wanted: bool) -> Result<bool, DataError> {
        report::set_help_wanted(self.pool(), report_id, help_wanted)
            .await
            .map_err(Into::into)
    }

    async fn list_assigned_reports(
        &self,
        user_id: &str,
    ) -> Result<Vec<AssignedReportRow>, DataError> {
        report::list_assigned_reports(self.pool(), user_id)
            .await
            .map_err(Into::into)
    }

    // ==================== Comment Operations ====================

    async fn add_comment(
        &self,
        report_id: &str,
        commenter_id: &str,
        reply_to: Option<&str>,
        body: &str,
    ) -> Result<CommentRow, DataError> {
        comment::add_comment(self.pool(), report_id, commenter_id, reply_to, body)
            .await
            .map_err(Into::into)
    }

    async fn list_comments(&self, report_id: &str) -> Result<Vec<CommentRow>, DataError> {
        comment::list_comments(self.pool(), report_id)
            .await
            .map_err(Into::into)
    }

    // ==================== Assignment Operations ====================

    async fn list_assignees(&self, report_id: &str) -> Result<Vec<String>, DataError> {
        assignment::list_assignees(self.pool(), report_id)
            .await
            .map_err(Into::into)
    }

    async fn add_assignment(&self, report_id: &str, developer_id: &str) -> Result<bool, DataError> {
        assignment::add_assignment(self.pool(), report_id, developer_id)
            .await
            .map_err(Into::into)
    }

    async fn remove_assignment(
        &self,
        report_id: &str,
        developer_id: &str,
    ) -> Result<bool, DataError> {
        assignment::remove_assignment(self.pool(), report_id, developer_id)
            .await
            .map_err(Into::into)
    }

    // ==================== Upvote Operations ====================

    async fn add_upvote(&self, report_id: &str, user_id: &str) -> Result<bool, DataError> {
        upvote::add_upvote(self.pool(), report_id, user_id)
            .await
            .map_err(Into::into)
    }

    async fn remove_upvote(&self, report_id: &str, user_id: &str) -> Result<bool, DataError> {
        upvote::remove_upvote(self.pool(), report_id, user_id)
            .await
            .map_err(Into::into)
    }

    async fn has_upvoted(&self, report_id: &str, user_id: &str) -> Result<bool, DataError> {
        upvote::has_upvoted(self.pool(), report_id, user_id)
            .await
            .map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn repo() -> Arc<SqliteService> {
        let repo = Arc::new(SqliteService::in_memory().await.unwrap());
        for user in ["alice", "bob"] {
            repo.add_user_if_none(user).await.unwrap();
        }
        repo
    }

    #[tokio::test]
    async fn test_report_lifecycle_through_trait() {
        let repo = repo().await;
        let project = repo.create_project("Tracker", "alice").await.unwrap();
        let report = repo
            .create_report(&NewReport {
                project_id: project.id.clone(),
                reporter_id: "bob".to_string(),
                summary: "Login loops".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        assert!(repo.add_assignment(&report.id, "alice").await.unwrap());
        assert!(repo.add_upvote(&report.id, "bob").await.unwrap());
        repo.add_comment(&report.id, "bob", None, "Still happening")
            .await
            .unwrap();

        let fetched = repo.get_report(&report.id).await.unwrap().unwrap();
        assert_eq!(fetched.upvotes, 1);
        assert_eq!(repo.list_comments(&report.id).await.unwrap().len(), 1);
        assert_eq!(repo.list_assigned_reports("alice").await.unwrap().len(), 1);
        assert_eq!(repo.project_stats(&project.id).await.unwrap().new, 1);
    }

    #[tokio::test]
    async fn test_delete_user_keeps_filed_reports_of_shared_projects() {
        let repo = repo().await;
        let project = repo.create_project("Shared", "alice").await.unwrap();
        repo.add_developer(&project.id, "bob").await.unwrap();
        let report = repo
            .create_report(&NewReport {
                project_id: project.id.clone(),
                reporter_id: "alice".to_string(),
                summary: "Typo".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        repo.add_upvote(&report.id, "alice").await.unwrap();

        assert_eq!(repo.delete_user("alice").await.unwrap(), 0);

        let fetched = repo.get_report(&report.id).await.unwrap().unwrap();
        assert_eq!(fetched.reporter_id, "alice");
        assert_eq!(fetched.upvotes, 0);
        assert_eq!(repo.list_developers(&project.id).await.unwrap(), vec!["bob"]);
    }
}
