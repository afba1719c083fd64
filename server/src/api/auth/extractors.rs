//! Authorization extractors for Axum handlers
//!
//! These extractors combine authentication (from middleware) with the
//! developer check into a single extraction step.
//!
//! # Usage
//!
//! ```no_run
//! # use bugtracker_server::api::auth::ReportDeveloper;
//! # use bugtracker_server::api::types::ApiError;
//! pub async fn set_help_wanted(auth: ReportDeveloper) -> Result<(), ApiError> {
//!     // auth.report - the report, already loaded
//!     // auth.ctx - the session user
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use super::context::{AuthContext, AuthService};
use crate::api::extractors::{ProjectPath, ReportPath, ValidationRejection};
use crate::api::types::ApiError;
use crate::data::types::ReportRow;

/// Rejection type for auth extractors
pub enum AuthRejection {
    /// Path extraction or validation failed
    Path(ValidationRejection),
    /// Authorization failed
    Auth(ApiError),
    /// Auth context not available (middleware not applied)
    MissingContext,
}

impl From<ValidationRejection> for AuthRejection {
    fn from(v: ValidationRejection) -> Self {
        Self::Path(v)
    }
}

impl From<ApiError> for AuthRejection {
    fn from(e: ApiError) -> Self {
        Self::Auth(e)
    }
}

impl axum::response::IntoResponse for AuthRejection {
    fn into_response(self) -> axum::response::Response {
        match self {
            Self::Path(v) => v.into_response(),
            Self::Auth(e) => e.into_response(),
            Self::MissingContext => {
                ApiError::internal("Auth context not available").into_response()
            }
        }
    }
}

/// Extract auth context and service from request extensions.
fn extract_auth(parts: &Parts) -> Result<(AuthContext, Arc<AuthService>), AuthRejection> {
    let auth = parts
        .extensions
        .get::<AuthContext>()
        .cloned()
        .ok_or(AuthRejection::MissingContext)?;

    let auth_service = parts
        .extensions
        .get::<Arc<AuthService>>()
        .cloned()
        .ok_or(AuthRejection::MissingContext)?;

    Ok((auth, auth_service))
}

// ============================================================================
// Session only
// ============================================================================

/// Any logged-in user
pub struct Auth {
    pub ctx: AuthContext,
}

impl Auth {
    pub fn user_id(&self) -> &str {
        self.ctx.user_id()
    }
}

impl<S> FromRequestParts<S> for Auth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ctx = parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or(AuthRejection::MissingContext)?;

        Ok(Self { ctx })
    }
}

// ============================================================================
// Developer access
// ============================================================================

/// A developer of the project named in the `{project_id}` path segment
pub struct ProjectDeveloper {
    pub project_id: String,
    pub ctx: AuthContext,
}

impl<S> FromRequestParts<S> for ProjectDeveloper
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let ProjectPath { project_id } = ProjectPath::from_request_parts(parts, state).await?;
        let (ctx, service) = extract_auth(parts)?;

        service.require_developer(&ctx, &project_id).await?;

        Ok(Self { project_id, ctx })
    }
}

/// A developer of the project that owns the `{report_id}` report
pub struct ReportDeveloper {
    pub report: ReportRow,
    pub ctx: AuthContext,
}

impl<S> FromRequestParts<S> for ReportDeveloper
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let ReportPath { report_id } = ReportPath::from_request_parts(parts, state).await?;
        let (ctx, service) = extract_auth(parts)?;

        let report = service.require_report_developer(&ctx, &report_id).await?;

        Ok(Self { report, ctx })
    }
}
