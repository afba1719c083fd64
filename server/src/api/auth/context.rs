//! Authentication context and authorization service
//!
//! `AuthContext` carries the session's user ID. `AuthService` answers the
//! one authorization question this application has: does the user develop
//! the project a request touches?

use std::sync::Arc;

use crate::api::types::ApiError;
use crate::data::TransactionalService;
use crate::data::types::ReportRow;

/// Identity of the session behind a request, injected by `require_auth`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: String,
}

impl AuthContext {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }
}

/// Membership checks for triage actions
pub struct AuthService {
    database: Arc<TransactionalService>,
}

impl AuthService {
    pub fn new(database: Arc<TransactionalService>) -> Self {
        Self { database }
    }

    /// Fail with 404 if the project is gone, 403 unless the user develops it
    pub async fn require_developer(
        &self,
        auth: &AuthContext,
        project_id: &str,
    ) -> Result<(), ApiError> {
        let repo = self.database.repository();
        let is_developer = repo
            .is_developer(project_id, auth.user_id())
            .await
            .map_err(ApiError::from_data)?;

        if !is_developer {
            if repo
                .get_project(project_id)
                .await
                .map_err(ApiError::from_data)?
                .is_none()
            {
                return Err(ApiError::not_found(
                    "PROJECT_NOT_FOUND",
                    format!("Project not found: {}", project_id),
                ));
            }
            tracing::debug!(user_id = %auth.user_id, project_id, "Denied non-developer");
            return Err(ApiError::forbidden(
                "NOT_DEVELOPER",
                "Only developers of this project can do that",
            ));
        }
        Ok(())
    }

    /// Load a report and check the user develops its project
    pub async fn require_report_developer(
        &self,
        auth: &AuthContext,
        report_id: &str,
    ) -> Result<ReportRow, ApiError> {
        let report = self
            .database
            .repository()
            .get_report(report_id)
            .await
            .map_err(ApiError::from_data)?
            .ok_or_else(|| {
                ApiError::not_found("REPORT_NOT_FOUND", format!("Report not found: {}", report_id))
            })?;

        self.require_developer(auth, &report.project_id).await?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::types::NewReport;

    #[tokio::test]
    async fn test_require_developer() {
        let db = Arc::new(TransactionalService::in_memory().await.unwrap());
        let repo = db.repository();
        repo.add_user_if_none("alice").await.unwrap();
        let project = repo.create_project("Core", "alice").await.unwrap();
        let service = AuthService::new(db);

        assert!(
            service
                .require_developer(&AuthContext::new("alice"), &project.id)
                .await
                .is_ok()
        );

        let denied = service
            .require_developer(&AuthContext::new("mallory"), &project.id)
            .await;
        assert!(matches!(
            denied,
            Err(ApiError::Forbidden { ref code, .. }) if code == "NOT_DEVELOPER"
        ));
    }

    #[tokio::test]
    async fn test_require_developer_on_missing_project() {
        let db = Arc::new(TransactionalService::in_memory().await.unwrap());
        let service = AuthService::new(db);

        let missing = service
            .require_developer(&AuthContext::new("alice"), "nope00")
            .await;
        assert!(matches!(
            missing,
            Err(ApiError::NotFound { ref code, .. }) if code == "PROJECT_NOT_FOUND"
        ));
    }

    #[tokio::test]
    async fn test_require_report_developer() {
        let db = Arc::new(TransactionalService::in_memory().await.unwrap());
        let repo = db.repository();
        repo.add_user_if_none("alice").await.unwrap();
        let project = repo.create_project("Core", "alice").await.unwrap();
        let report = repo
            .create_report(&NewReport {
                project_id: project.id.clone(),
                reporter_id: "bob".into(),
                summary: "Crash".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        let service = AuthService::new(db);

        let loaded = service
            .require_report_developer(&AuthContext::new("alice"), &report.id)
            .await
            .unwrap();
        assert_eq!(loaded.id, report.id);

        assert!(matches!(
            service
                .require_report_developer(&AuthContext::new("bob"), &report.id)
                .await,
            Err(ApiError::Forbidden { .. })
        ));
        assert!(matches!(
            service
                .require_report_developer(&AuthContext::new("alice"), "missing")
                .await,
            Err(ApiError::NotFound { .. })
        ));
    }
}
