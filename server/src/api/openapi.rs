//! OpenAPI description of the HTTP surface

use axum::http::header;
use axum::response::{IntoResponse, Json};
use utoipa::OpenApi;

use crate::api::routes::{account, actions, health, login};
use crate::data::types::{Priority, ReportSort, ReportStatus, SortOrder};
use crate::domain::UserProfile;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "BugTracker API",
        version = env!("CARGO_PKG_VERSION"),
        description = "Multi-tenant bug tracker"
    ),
    tags(
        (name = "health", description = "Health check endpoint"),
        (name = "auth", description = "Login through the identity provider"),
        (name = "account", description = "Pages for the logged-in user"),
        (name = "projects", description = "Project management"),
        (name = "reports", description = "Bug reports and triage"),
        (name = "users", description = "User search"),
        (name = "profile", description = "Profile and account")
    ),
    paths(
        // Health
        health::health,
        // Auth
        login::login,
        login::callback,
        login::logout,
        login::logged_out,
        // Account pages
        account::dashboard,
        account::profile,
        account::tasks,
        account::project,
        account::project_reports,
        account::report,
        // Projects
        actions::projects::create_project,
        actions::projects::delete_project,
        actions::projects::search_projects,
        actions::projects::select_project,
        actions::projects::add_developer,
        // Users
        actions::projects::search_users,
        // Reports
        actions::reports::report_bug,
        actions::reports::add_assignment,
        actions::reports::remove_assignment,
        actions::reports::update_tag,
        actions::reports::add_comment,
        actions::reports::upvote,
        actions::reports::remove_upvote,
        actions::reports::set_help_wanted,
        // Profile
        actions::profile::update_profile,
        actions::profile::delete_account,
    ),
    components(schemas(
        health::HealthResponse,
        UserProfile,
        // Enums
        ReportStatus,
        Priority,
        ReportSort,
        SortOrder,
        // Views
        account::types::ProjectDto,
        account::types::ProjectStatsDto,
        account::types::ReportDto,
        account::types::AssignedReportDto,
        account::types::CommentDto,
        account::types::DashboardView,
        account::types::ProfileView,
        account::types::ProjectView,
        account::types::TasksView,
        account::types::ReportsView,
        account::types::ReportView,
        account::types::LoggedOutView,
        account::types::ReportsQuery,
        // Forms
        actions::types::CreateProjectForm,
        actions::types::SelectProjectForm,
        actions::types::AddDeveloperForm,
        actions::types::SearchQuery,
        actions::types::ReportBugForm,
        actions::types::AssignForm,
        actions::types::CommentForm,
        actions::types::HelpWantedForm,
    ))
)]
pub struct ApiDoc;

/// Serve the OpenAPI document as JSON
pub async fn openapi_json() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/json")],
        Json(ApiDoc::openapi()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_action_paths() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;
        assert!(paths.contains_key("/account-actions/create-project"));
        assert!(paths.contains_key("/account/reports/{report_id}"));
        assert!(paths.contains_key("/login/callback"));
    }
}
