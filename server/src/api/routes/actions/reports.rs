//! Report actions: filing, triage, comments and upvotes

use axum::extract::State;
use axum::response::Redirect;

use super::types::{AssignForm, CommentForm, HelpWantedForm, ReportBugForm, TagForm};
use super::{ActionsApiState, to_project, to_report};
use crate::api::auth::{Auth, ReportDeveloper};
use crate::api::extractors::{AssignmentPath, ProjectPath, ReportPath, TagPath, ValidatedForm};
use crate::api::routes::account::{find_project, find_report};
use crate::api::types::ApiError;
use crate::data::types::{BugTag, NewReport};

/// File a bug report against a project
#[utoipa::path(
    post,
    path = "/account-actions/projects/{project_id}/report-bug",
    tag = "reports",
    params(("project_id" = String, Path, description = "Project ID")),
    request_body(content = ReportBugForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Redirect to the project page"),
        (status = 400, description = "No report summary found"),
        (status = 404, description = "Project not found")
    )
)]
pub async fn report_bug(
    State(state): State<ActionsApiState>,
    auth: Auth,
    path: ProjectPath,
    ValidatedForm(form): ValidatedForm<ReportBugForm>,
) -> Result<Redirect, ApiError> {
    let repo = state.database.repository();
    let project = find_project(repo.as_ref(), &path.project_id).await?;

    let report = repo
        .create_report(&NewReport {
            project_id: project.id.clone(),
            reporter_id: auth.user_id().to_string(),
            summary: form.summary.trim().to_string(),
            software_version: form.software_version.trim().to_string(),
            device: form.device.trim().to_string(),
            os: form.os.trim().to_string(),
            expected_result: form.expected_result.trim().to_string(),
            actual_result: form.actual_result.trim().to_string(),
            steps: form.steps.trim().to_string(),
            details: form.details.trim().to_string(),
        })
        .await
        .map_err(ApiError::from_data)?;

    tracing::info!(
        report_id = %report.id,
        project_id = %project.id,
        reporter_id = %auth.user_id(),
        "Bug reported"
    );
    Ok(to_project(&project.id))
}

/// Assign a developer of the project to a report
#[utoipa::path(
    post,
    path = "/account-actions/reports/{report_id}/assignments",
    tag = "reports",
    params(("report_id" = String, Path, description = "Report ID")),
    request_body(content = AssignForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Redirect to the report page"),
        (status = 400, description = "Assignee is not a developer of the project"),
        (status = 403, description = "Not a developer of this project")
    )
)]
pub async fn add_assignment(
    State(state): State<ActionsApiState>,
    dev: ReportDeveloper,
    ValidatedForm(form): ValidatedForm<AssignForm>,
) -> Result<Redirect, ApiError> {
    let repo = state.database.repository();
    let developer_id = form.developer_id.trim();

    let is_developer = repo
        .is_developer(&dev.report.project_id, developer_id)
        .await
        .map_err(ApiError::from_data)?;
    if !is_developer {
        return Err(ApiError::bad_request(
            "INVALID_ASSIGNEE",
            "Only developers of this project can be assigned",
        ));
    }

    let added = repo
        .add_assignment(&dev.report.id, developer_id)
        .await
        .map_err(ApiError::from_data)?;
    if added {
        tracing::info!(
            report_id = %dev.report.id,
            developer_id,
            assigned_by = %dev.ctx.user_id(),
            "Report assigned"
        );
    }
    Ok(to_report(&dev.report.id))
}

/// Remove an assignment
#[utoipa::path(
    post,
    path = "/account-actions/reports/{report_id}/assignments/{developer_id}/delete",
    tag = "reports",
    params(
        ("report_id" = String, Path, description = "Report ID"),
        ("developer_id" = String, Path, description = "Assigned developer's user ID")
    ),
    responses(
        (status = 303, description = "Redirect to the report page"),
        (status = 403, description = "Not a developer of this project")
    )
)]
pub async fn remove_assignment(
    State(state): State<ActionsApiState>,
    dev: ReportDeveloper,
    path: AssignmentPath,
) -> Result<Redirect, ApiError> {
    let removed = state
        .database
        .repository()
        .remove_assignment(&dev.report.id, &path.developer_id)
        .await
        .map_err(ApiError::from_data)?;
    if removed {
        tracing::info!(
            report_id = %dev.report.id,
            developer_id = %path.developer_id,
            "Assignment removed"
        );
    }
    Ok(to_report(&path.report_id))
}

/// Change a report's status, priority or severity
#[utoipa::path(
    post,
    path = "/account-actions/reports/{report_id}/tags/{tag_type}",
    tag = "reports",
    params(
        ("report_id" = String, Path, description = "Report ID"),
        ("tag_type" = String, Path, description = "status, priority or severity")
    ),
    request_body(
        content_type = "application/x-www-form-urlencoded",
        description = "A single `{tag_type}-select` field"
    ),
    responses(
        (status = 303, description = "Redirect to the report page"),
        (status = 400, description = "Unknown tag type or value"),
        (status = 403, description = "Not a developer of this project")
    )
)]
pub async fn update_tag(
    State(state): State<ActionsApiState>,
    dev: ReportDeveloper,
    path: TagPath,
    ValidatedForm(form): ValidatedForm<TagForm>,
) -> Result<Redirect, ApiError> {
    let value = form.value(&path.tag_type).ok_or_else(|| {
        ApiError::bad_request("MISSING_TAG", format!("No {} found", path.tag_type))
    })?;
    let tag = BugTag::parse(&path.tag_type, value).ok_or_else(|| {
        ApiError::bad_request(
            "INVALID_TAG",
            format!("Invalid {} value: {}", path.tag_type, value),
        )
    })?;

    state
        .database
        .repository()
        .update_tag(&dev.report.id, tag)
        .await
        .map_err(ApiError::from_data)?;

    tracing::info!(
        report_id = %dev.report.id,
        column = tag.column(),
        value,
        "Report tag updated"
    );
    Ok(to_report(&dev.report.id))
}

/// Comment on a report, optionally replying to another comment
#[utoipa::path(
    post,
    path = "/account-actions/reports/{report_id}/comment",
    tag = "reports",
    params(("report_id" = String, Path, description = "Report ID")),
    request_body(content = CommentForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Redirect to the report page"),
        (status = 400, description = "No comment found"),
        (status = 404, description = "Report not found")
    )
)]
pub async fn add_comment(
    State(state): State<ActionsApiState>,
    auth: Auth,
    path: ReportPath,
    ValidatedForm(form): ValidatedForm<CommentForm>,
) -> Result<Redirect, ApiError> {
    let repo = state.database.repository();
    let report = find_report(repo.as_ref(), &path.report_id).await?;

    let comment = repo
        .add_comment(&report.id, auth.user_id(), form.reply_to(), form.body.trim())
        .await
        .map_err(ApiError::from_data)?;

    tracing::debug!(comment_id = %comment.id, report_id = %report.id, "Comment added");
    Ok(to_report(&report.id))
}

/// Upvote a report (at most once per user)
#[utoipa::path(
    post,
    path = "/account-actions/reports/{report_id}/upvote",
    tag = "reports",
    params(("report_id" = String, Path, description = "Report ID")),
    responses(
        (status = 303, description = "Redirect to the report page"),
        (status = 404, description = "Report not found")
    )
)]
pub async fn upvote(
    State(state): State<ActionsApiState>,
    auth: Auth,
    path: ReportPath,
) -> Result<Redirect, ApiError> {
    let repo = state.database.repository();
    let report = find_report(repo.as_ref(), &path.report_id).await?;

    repo.add_upvote(&report.id, auth.user_id())
        .await
        .map_err(ApiError::from_data)?;
    Ok(to_report(&report.id))
}

/// Withdraw an upvote
#[utoipa::path(
    post,
    path = "/account-actions/reports/{report_id}/remove-upvote",
    tag = "reports",
    params(("report_id" = String, Path, description = "Report ID")),
    responses(
        (status = 303, description = "Redirect to the report page"),
        (status = 404, description = "Report not found")
    )
)]
pub async fn remove_upvote(
    State(state): State<ActionsApiState>,
    auth: Auth,
    path: ReportPath,
) -> Result<Redirect, ApiError> {
    let repo = state.database.repository();
    let report = find_report(repo.as_ref(), &path.report_id).await?;

    repo.remove_upvote(&report.id, auth.user_id())
        .await
        .map_err(ApiError::from_data)?;
    Ok(to_report(&report.id))
}

/// Flag or unflag a report as needing help
#[utoipa::path(
    post,
    path = "/account-actions/reports/{report_id}/help-wanted",
    tag = "reports",
    params(("report_id" = String, Path, description = "Report ID")),
    request_body(content = HelpWantedForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Redirect to the report page"),
        (status = 403, description = "Not a developer of this project")
    )
)]
pub async fn set_help_wanted(
    State(state): State<ActionsApiState>,
    dev: ReportDeveloper,
    ValidatedForm(form): ValidatedForm<HelpWantedForm>,
) -> Result<Redirect, ApiError> {
    let help_wanted = form.enabled();
    state
        .database
        .repository()
        .set_help_wanted(&dev.report.id, help_wanted)
        .await
        .map_err(ApiError::from_data)?;

    tracing::info!(report_id = %dev.report.id, help_wanted, "Help wanted updated");
    Ok(to_report(&dev.report.id))
}
