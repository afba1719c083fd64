//! Project actions: create, leave, search, select and add developers

use axum::Json;
use axum::extract::State;
use axum::response::Redirect;

use super::types::{AddDeveloperForm, CreateProjectForm, SearchQuery, SelectProjectForm};
use super::{ActionsApiState, to_dashboard, to_project};
use crate::api::auth::{Auth, ProjectDeveloper};
use crate::api::extractors::{ProjectPath, ValidatedForm, ValidatedQuery};
use crate::api::routes::account::find_project;
use crate::api::routes::account::types::ProjectDto;
use crate::api::types::ApiError;
use crate::core::constants::SEARCH_PAGE_LIMIT;
use crate::data::types::LeaveOutcome;
use crate::domain::UserProfile;
use crate::domain::profiles::with_local_profiles;

/// Create a project with the current user as its first developer
#[utoipa::path(
    post,
    path = "/account-actions/create-project",
    tag = "projects",
    request_body(content = CreateProjectForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Redirect to the dashboard"),
        (status = 400, description = "No project name found")
    )
)]
pub async fn create_project(
    State(state): State<ActionsApiState>,
    auth: Auth,
    ValidatedForm(form): ValidatedForm<CreateProjectForm>,
) -> Result<Redirect, ApiError> {
    let project = state
        .database
        .repository()
        .create_project(form.project_name.trim(), auth.user_id())
        .await
        .map_err(ApiError::from_data)?;

    tracing::info!(project_id = %project.id, user_id = %auth.user_id(), "Project created");
    Ok(to_dashboard())
}

/// Leave a project; the last developer leaving deletes it
#[utoipa::path(
    post,
    path = "/account-actions/projects/{project_id}/delete",
    tag = "projects",
    params(("project_id" = String, Path, description = "Project ID")),
    responses(
        (status = 303, description = "Redirect to the dashboard"),
        (status = 403, description = "Not a developer of this project"),
        (status = 404, description = "Project not found")
    )
)]
pub async fn delete_project(
    State(state): State<ActionsApiState>,
    auth: Auth,
    path: ProjectPath,
) -> Result<Redirect, ApiError> {
    let repo = state.database.repository();
    let project = find_project(repo.as_ref(), &path.project_id).await?;

    let outcome = repo
        .leave_project(&project.id, auth.user_id())
        .await
        .map_err(ApiError::from_data)?;

    match outcome {
        LeaveOutcome::NotDeveloper => Err(ApiError::forbidden(
            "NOT_DEVELOPER",
            "Only developers of this project can do that",
        )),
        LeaveOutcome::Left => {
            tracing::info!(project_id = %project.id, user_id = %auth.user_id(), "Left project");
            Ok(to_dashboard())
        }
        LeaveOutcome::Deleted => {
            tracing::info!(project_id = %project.id, user_id = %auth.user_id(), "Project deleted");
            Ok(to_dashboard())
        }
    }
}

/// Search projects by name (case-insensitive substring)
#[utoipa::path(
    get,
    path = "/account-actions/search-projects",
    tag = "projects",
    params(
        ("search" = Option<String>, Query, description = "Text to look for in project names"),
        ("page" = Option<u32>, Query, description = "Page number (1-100)")
    ),
    responses(
        (status = 200, description = "Matching projects ordered by name", body = Vec<ProjectDto>)
    )
)]
pub async fn search_projects(
    State(state): State<ActionsApiState>,
    _auth: Auth,
    ValidatedQuery(query): ValidatedQuery<SearchQuery>,
) -> Result<Json<Vec<ProjectDto>>, ApiError> {
    let search = query.search.trim();
    if search.is_empty() {
        return Ok(Json(Vec::new()));
    }

    let projects = state
        .database
        .repository()
        .search_projects(search, query.page, SEARCH_PAGE_LIMIT)
        .await
        .map_err(ApiError::from_data)?;

    Ok(Json(projects.into_iter().map(ProjectDto::from).collect()))
}

/// Open a project picked from the search results
#[utoipa::path(
    post,
    path = "/account-actions/select-project",
    tag = "projects",
    request_body(content = SelectProjectForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Redirect to the project page"),
        (status = 404, description = "Project not found")
    )
)]
pub async fn select_project(
    State(state): State<ActionsApiState>,
    _auth: Auth,
    ValidatedForm(form): ValidatedForm<SelectProjectForm>,
) -> Result<Redirect, ApiError> {
    let repo = state.database.repository();
    let project = find_project(repo.as_ref(), form.project_id.trim()).await?;
    Ok(to_project(&project.id))
}

/// Search users at the identity provider by name
#[utoipa::path(
    get,
    path = "/account-actions/search-users",
    tag = "users",
    params(
        ("search" = Option<String>, Query, description = "Name prefix or fragment"),
        ("page" = Option<u32>, Query, description = "Page number (1-100)")
    ),
    responses(
        (status = 200, description = "Matching users with avatars", body = Vec<UserProfile>),
        (status = 502, description = "Identity provider unavailable")
    )
)]
pub async fn search_users(
    State(state): State<ActionsApiState>,
    _auth: Auth,
    ValidatedQuery(query): ValidatedQuery<SearchQuery>,
) -> Result<Json<Vec<UserProfile>>, ApiError> {
    let search = query.search.trim();
    if search.is_empty() {
        return Ok(Json(Vec::new()));
    }

    let users = state
        .identity
        .search_users(search, query.page)
        .await
        .map_err(ApiError::from_identity)?;

    let repo = state.database.repository();
    let profiles = with_local_profiles(repo.as_ref(), users)
        .await
        .map_err(ApiError::from_data)?;
    Ok(Json(profiles))
}

/// Add a user as developer of a project
#[utoipa::path(
    post,
    path = "/account-actions/projects/{project_id}/developers",
    tag = "projects",
    params(("project_id" = String, Path, description = "Project ID")),
    request_body(content = AddDeveloperForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Redirect to the project page"),
        (status = 403, description = "Not a developer of this project"),
        (status = 404, description = "User not found at the identity provider")
    )
)]
pub async fn add_developer(
    State(state): State<ActionsApiState>,
    dev: ProjectDeveloper,
    ValidatedForm(form): ValidatedForm<AddDeveloperForm>,
) -> Result<Redirect, ApiError> {
    let user_id = form.user_id.trim();

    // Only accounts that exist at the provider get a local row
    if let Err(e) = state.identity.get_user(user_id).await {
        if e.is_not_found() {
            return Err(ApiError::not_found(
                "USER_NOT_FOUND",
                format!("User not found: {}", user_id),
            ));
        }
        return Err(ApiError::from_identity(e));
    }

    let added = state
        .database
        .repository()
        .add_developer(&dev.project_id, user_id)
        .await
        .map_err(ApiError::from_data)?;

    if added {
        tracing::info!(
            project_id = %dev.project_id,
            developer_id = %user_id,
            added_by = %dev.ctx.user_id(),
            "Developer added"
        );
    }
    Ok(to_project(&dev.project_id))
}
