//! Account pages
//!
//! Every page needs a session. Each handler gathers what one page shows
//! and returns it as a view model.

pub mod types;

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::auth::Auth;
use crate::api::extractors::{ProjectPath, ReportPath, ValidatedQuery};
use crate::api::types::ApiError;
use crate::data::identity::IdentityProvider;
use crate::data::types::{ProjectRow, ReportRow};
use crate::data::{TransactionalRepository, TransactionalService};
use crate::domain::UserProfile;
use crate::domain::profiles::{load_profile, load_profiles};

use types::{
    CommentDto, DashboardView, ProfileView, ProjectDto, ProjectView, ReportView, ReportsQuery,
    ReportsView, TasksView,
};

/// Shared state for account page endpoints
#[derive(Clone)]
pub struct AccountApiState {
    pub database: Arc<TransactionalService>,
    pub identity: Arc<dyn IdentityProvider>,
}

/// Build account page routes (mounted under `/account`)
pub fn routes(
    database: Arc<TransactionalService>,
    identity: Arc<dyn IdentityProvider>,
) -> Router<()> {
    let state = AccountApiState { database, identity };

    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/profile", get(profile))
        .route("/tasks", get(tasks))
        .route("/projects/{project_id}", get(project))
        .route("/projects/{project_id}/reports", get(project_reports))
        .route("/reports/{report_id}", get(report))
        .with_state(state)
}

pub(crate) async fn find_project(
    repo: &dyn TransactionalRepository,
    project_id: &str,
) -> Result<ProjectRow, ApiError> {
    repo.get_project(project_id)
        .await
        .map_err(ApiError::from_data)?
        .ok_or_else(|| {
            ApiError::not_found(
                "PROJECT_NOT_FOUND",
                format!("Project not found: {}", project_id),
            )
        })
}

pub(crate) async fn find_report(
    repo: &dyn TransactionalRepository,
    report_id: &str,
) -> Result<ReportRow, ApiError> {
    repo.get_report(report_id)
        .await
        .map_err(ApiError::from_data)?
        .ok_or_else(|| {
            ApiError::not_found("REPORT_NOT_FOUND", format!("Report not found: {}", report_id))
        })
}

/// Current user and the projects they develop
#[utoipa::path(
    get,
    path = "/account/dashboard",
    tag = "account",
    responses(
        (status = 200, description = "Dashboard", body = DashboardView),
        (status = 401, description = "Not logged in"),
        (status = 502, description = "Identity provider unavailable")
    )
)]
pub async fn dashboard(
    State(state): State<AccountApiState>,
    auth: Auth,
) -> Result<Json<DashboardView>, ApiError> {
    let repo = state.database.repository();

    let user = load_profile(state.identity.as_ref(), repo.as_ref(), auth.user_id())
        .await
        .map_err(ApiError::from_profile)?;
    let projects = repo
        .list_projects_for_user(auth.user_id())
        .await
        .map_err(ApiError::from_data)?;

    Ok(Json(DashboardView {
        user,
        projects: projects.into_iter().map(ProjectDto::from).collect(),
    }))
}

/// Current user's profile
#[utoipa::path(
    get,
    path = "/account/profile",
    tag = "account",
    responses(
        (status = 200, description = "Profile", body = ProfileView),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn profile(
    State(state): State<AccountApiState>,
    auth: Auth,
) -> Result<Json<ProfileView>, ApiError> {
    let repo = state.database.repository();
    let user = load_profile(state.identity.as_ref(), repo.as_ref(), auth.user_id())
        .await
        .map_err(ApiError::from_profile)?;
    Ok(Json(ProfileView { user }))
}

/// Reports assigned to the current user
#[utoipa::path(
    get,
    path = "/account/tasks",
    tag = "account",
    responses(
        (status = 200, description = "Assigned reports, newest first", body = TasksView),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn tasks(
    State(state): State<AccountApiState>,
    auth: Auth,
) -> Result<Json<TasksView>, ApiError> {
    let reports = state
        .database
        .repository()
        .list_assigned_reports(auth.user_id())
        .await
        .map_err(ApiError::from_data)?;

    Ok(Json(TasksView {
        reports: reports.into_iter().map(Into::into).collect(),
    }))
}

/// Project overview with developers and report counts
#[utoipa::path(
    get,
    path = "/account/projects/{project_id}",
    tag = "account",
    params(("project_id" = String, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Project page", body = ProjectView),
        (status = 404, description = "Project not found")
    )
)]
pub async fn project(
    State(state): State<AccountApiState>,
    auth: Auth,
    path: ProjectPath,
) -> Result<Json<ProjectView>, ApiError> {
    let repo = state.database.repository();
    let project = find_project(repo.as_ref(), &path.project_id).await?;

    let developer_ids = repo
        .list_developers(&project.id)
        .await
        .map_err(ApiError::from_data)?;
    let stats = repo
        .project_stats(&project.id)
        .await
        .map_err(ApiError::from_data)?;
    let developers = load_profiles(state.identity.as_ref(), repo.as_ref(), &developer_ids)
        .await
        .map_err(ApiError::from_data)?;

    Ok(Json(ProjectView {
        is_developer: developer_ids.iter().any(|id| id == auth.user_id()),
        project: project.into(),
        developers,
        stats: stats.into(),
    }))
}

/// Filtered and sorted reports of a project
#[utoipa::path(
    get,
    path = "/account/projects/{project_id}/reports",
    tag = "account",
    params(
        ("project_id" = String, Path, description = "Project ID"),
        ("filter" = Option<String>, Query, description = "all, new, pending or fixed (default all)"),
        ("sort" = Option<String>, Query, description = "date, upvotes, priority, severity or status (default date)"),
        ("order" = Option<String>, Query, description = "asc or desc (default desc)")
    ),
    responses(
        (status = 200, description = "Report listing", body = ReportsView),
        (status = 400, description = "Unknown filter, sort or order"),
        (status = 404, description = "Project not found")
    )
)]
pub async fn project_reports(
    State(state): State<AccountApiState>,
    _auth: Auth,
    path: ProjectPath,
    ValidatedQuery(query): ValidatedQuery<ReportsQuery>,
) -> Result<Json<ReportsView>, ApiError> {
    let report_query = query.to_report_query()?;
    let repo = state.database.repository();
    let project = find_project(repo.as_ref(), &path.project_id).await?;

    let reports = repo
        .list_reports(&project.id, report_query)
        .await
        .map_err(ApiError::from_data)?;

    Ok(Json(ReportsView {
        project: project.into(),
        filter: report_query.filter.as_str().to_string(),
        sort: report_query.sort,
        order: report_query.order,
        reports: reports.into_iter().map(Into::into).collect(),
    }))
}

/// Report detail with assignees, upvote state and comments
#[utoipa::path(
    get,
    path = "/account/reports/{report_id}",
    tag = "account",
    params(("report_id" = String, Path, description = "Report ID")),
    responses(
        (status = 200, description = "Report page", body = ReportView),
        (status = 404, description = "Report not found")
    )
)]
pub async fn report(
    State(state): State<AccountApiState>,
    auth: Auth,
    path: ReportPath,
) -> Result<Json<ReportView>, ApiError> {
    let repo = state.database.repository();
    let report = find_report(repo.as_ref(), &path.report_id).await?;
    let project = find_project(repo.as_ref(), &report.project_id).await?;

    let developer_ids = repo
        .list_developers(&project.id)
        .await
        .map_err(ApiError::from_data)?;
    let assignee_ids = repo
        .list_assignees(&report.id)
        .await
        .map_err(ApiError::from_data)?;
    let has_upvoted = repo
        .has_upvoted(&report.id, auth.user_id())
        .await
        .map_err(ApiError::from_data)?;
    let comments = repo
        .list_comments(&report.id)
        .await
        .map_err(ApiError::from_data)?;

    // One profile lookup per distinct person on the page
    let mut people: Vec<String> = assignee_ids.clone();
    people.extend(developer_ids.iter().cloned());
    people.extend(comments.iter().map(|c| c.commenter_id.clone()));
    let profiles: HashMap<String, UserProfile> =
        load_profiles(state.identity.as_ref(), repo.as_ref(), &people)
            .await
            .map_err(ApiError::from_data)?
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect();

    let assignees = assignee_ids
        .iter()
        .filter_map(|id| profiles.get(id).cloned())
        .collect();
    let available_developers = developer_ids
        .iter()
        .filter(|id| !assignee_ids.contains(id))
        .filter_map(|id| profiles.get(id).cloned())
        .collect();
    let comments = comments
        .into_iter()
        .map(|c| {
            let commenter = profiles.get(&c.commenter_id);
            CommentDto::new(c, commenter)
        })
        .collect();

    Ok(Json(ReportView {
        is_developer: developer_ids.iter().any(|id| id == auth.user_id()),
        current_user_id: auth.user_id().to_string(),
        report: report.into(),
        project: project.into(),
        assignees,
        available_developers,
        has_upvoted,
        comments,
    }))
}
