//! Account actions
//!
//! Form posts from the account pages. Each action validates its fields,
//! applies the change and redirects back to the page it came from with
//! 303 See Other. The two search endpoints answer with JSON for the
//! pickers on those pages.

pub mod profile;
pub mod projects;
pub mod reports;
pub mod types;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::response::Redirect;
use axum::routing::{get, post};

use crate::api::auth::AuthManager;
use crate::core::constants::MULTIPART_OVERHEAD_BYTES;
use crate::data::TransactionalService;
use crate::data::identity::IdentityProvider;

/// Shared state for account action endpoints
#[derive(Clone)]
pub struct ActionsApiState {
    pub database: Arc<TransactionalService>,
    pub identity: Arc<dyn IdentityProvider>,
    pub auth_manager: Arc<AuthManager>,
    pub avatar_max_bytes: usize,
}

/// Build account action routes (mounted under `/account-actions`)
pub fn routes(
    database: Arc<TransactionalService>,
    identity: Arc<dyn IdentityProvider>,
    auth_manager: Arc<AuthManager>,
    avatar_max_bytes: usize,
) -> Router<()> {
    let state = ActionsApiState {
        database,
        identity,
        auth_manager,
        avatar_max_bytes,
    };

    Router::new()
        // Projects
        .route("/create-project", post(projects::create_project))
        .route("/projects/{project_id}/delete", post(projects::delete_project))
        .route("/search-projects", get(projects::search_projects))
        .route("/select-project", post(projects::select_project))
        .route("/search-users", get(projects::search_users))
        .route("/projects/{project_id}/developers", post(projects::add_developer))
        // Reports
        .route("/projects/{project_id}/report-bug", post(reports::report_bug))
        .route("/reports/{report_id}/assignments", post(reports::add_assignment))
        .route(
            "/reports/{report_id}/assignments/{developer_id}/delete",
            post(reports::remove_assignment),
        )
        .route("/reports/{report_id}/tags/{tag_type}", post(reports::update_tag))
        .route("/reports/{report_id}/comment", post(reports::add_comment))
        .route("/reports/{report_id}/upvote", post(reports::upvote))
        .route("/reports/{report_id}/remove-upvote", post(reports::remove_upvote))
        .route("/reports/{report_id}/help-wanted", post(reports::set_help_wanted))
        // Profile
        .route(
            "/update-profile",
            post(profile::update_profile).layer(DefaultBodyLimit::max(
                avatar_max_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES),
            )),
        )
        .route("/delete-account", post(profile::delete_account))
        .with_state(state)
}

fn to_dashboard() -> Redirect {
    Redirect::to("/account/dashboard")
}

fn to_project(project_id: &str) -> Redirect {
    Redirect::to(&format!("/account/projects/{}", project_id))
}

fn to_report(report_id: &str) -> Redirect {
    Redirect::to(&format!("/account/reports/{}", report_id))
}
