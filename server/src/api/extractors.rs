//! Path and validation extractors for API routes
//!
//! Project, report and comment IDs are URL-safe hashes. User IDs come from
//! the identity provider (`auth0|...`) and are only checked for length and
//! control characters.

use std::ops::Deref;

use axum::Form;
use axum::extract::rejection::{FormRejection, PathRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Path, Query, Request};
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::core::constants::{MAX_ID_LENGTH, MAX_USER_ID_LENGTH};

/// Validate a hash ID: 1-64 chars, alphanumeric + dash/underscore
pub fn is_valid_hash_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_ID_LENGTH
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Validate an identity provider user ID: 1-128 chars, no control characters
pub fn is_valid_user_id(id: &str) -> bool {
    !id.is_empty() && id.len() <= MAX_USER_ID_LENGTH && !id.chars().any(char::is_control)
}

/// Raw path extractor for project-scoped routes (internal use)
#[derive(Debug, Deserialize)]
struct ProjectPathRaw {
    project_id: String,
}

/// Validated project path extractor.
///
/// Extracts and validates `project_id` from URL path parameters.
/// Returns a 400 Bad Request if validation fails.
#[derive(Debug)]
pub struct ProjectPath {
    pub project_id: String,
}

impl<S> FromRequestParts<S> for ProjectPath
where
    S: Send + Sync,
{
    type Rejection = ValidationRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<ProjectPathRaw>::from_request_parts(parts, state)
            .await
            .map_err(ValidationRejection::Path)?;

        if !is_valid_hash_id(&raw.project_id) {
            return Err(ValidationRejection::InvalidProjectId);
        }

        Ok(Self {
            project_id: raw.project_id,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ReportPathRaw {
    report_id: String,
}

/// Validated report path extractor
#[derive(Debug)]
pub struct ReportPath {
    pub report_id: String,
}

impl<S> FromRequestParts<S> for ReportPath
where
    S: Send + Sync,
{
    type Rejection = ValidationRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<ReportPathRaw>::from_request_parts(parts, state)
            .await
            .map_err(ValidationRejection::Path)?;

        if !is_valid_hash_id(&raw.report_id) {
            return Err(ValidationRejection::InvalidReportId);
        }

        Ok(Self {
            report_id: raw.report_id,
        })
    }
}

// ============================================================================
// Compound Path Extractors
// ============================================================================

#[derive(Debug, Deserialize)]
struct AssignmentPathRaw {
    report_id: String,
    developer_id: String,
}

/// Validated `report_id` + `developer_id` path extractor
#[derive(Debug)]
pub struct AssignmentPath {
    pub report_id: String,
    pub developer_id: String,
}

impl<S> FromRequestParts<S> for AssignmentPath
where
    S: Send + Sync,
{
    type Rejection = ValidationRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<AssignmentPathRaw>::from_request_parts(parts, state)
            .await
            .map_err(ValidationRejection::Path)?;

        if !is_valid_hash_id(&raw.report_id) {
            return Err(ValidationRejection::InvalidReportId);
        }
        if !is_valid_user_id(&raw.developer_id) {
            return Err(ValidationRejection::InvalidUserId);
        }

        Ok(Self {
            report_id: raw.report_id,
            developer_id: raw.developer_id,
        })
    }
}

#[derive(Debug, Deserialize)]
struct TagPathRaw {
    report_id: String,
    tag_type: String,
}

/// Validated `report_id` + `tag_type` path extractor
///
/// The tag type is checked against the whitelist later, together with its value.
#[derive(Debug)]
pub struct TagPath {
    pub report_id: String,
    pub tag_type: String,
}

impl<S> FromRequestParts<S> for TagPath
where
    S: Send + Sync,
{
    type Rejection = ValidationRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<TagPathRaw>::from_request_parts(parts, state)
            .await
            .map_err(ValidationRejection::Path)?;

        if !is_valid_hash_id(&raw.report_id) {
            return Err(ValidationRejection::InvalidReportId);
        }

        Ok(Self {
            report_id: raw.report_id,
            tag_type: raw.tag_type,
        })
    }
}

/// Validation rejection with structured error response
pub enum ValidationRejection {
    /// Failed to parse path parameters
    Path(PathRejection),
    /// Invalid project_id format
    InvalidProjectId,
    /// Invalid report_id format
    InvalidReportId,
    /// Invalid user ID format
    InvalidUserId,
    /// Failed to parse query string
    Query(QueryRejection),
    /// Failed to parse form body
    Form(FormRejection),
    /// Validation constraints not satisfied
    Validation(validator::ValidationErrors),
}

impl IntoResponse for ValidationRejection {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            Self::Path(rejection) => (
                StatusCode::BAD_REQUEST,
                "PATH_PARSE_ERROR",
                rejection.body_text(),
            ),
            Self::InvalidProjectId => (
                StatusCode::BAD_REQUEST,
                "INVALID_PROJECT_ID",
                "Invalid project_id: must be 1-64 alphanumeric chars, dashes, or underscores"
                    .to_string(),
            ),
            Self::InvalidReportId => (
                StatusCode::BAD_REQUEST,
                "INVALID_REPORT_ID",
                "Invalid report_id: must be 1-64 alphanumeric chars, dashes, or underscores"
                    .to_string(),
            ),
            Self::InvalidUserId => (
                StatusCode::BAD_REQUEST,
                "INVALID_USER_ID",
                "Invalid user id: must be 1-128 printable characters".to_string(),
            ),
            Self::Query(rejection) => (
                StatusCode::BAD_REQUEST,
                "QUERY_PARSE_ERROR",
                rejection.body_text(),
            ),
            Self::Form(rejection) => (
                StatusCode::BAD_REQUEST,
                "FORM_PARSE_ERROR",
                rejection.body_text(),
            ),
            Self::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                format_validation_errors(&errors),
            ),
        };
        (
            status,
            axum::Json(serde_json::json!({
                "error": "bad_request",
                "code": code,
                "message": message
            })),
        )
            .into_response()
    }
}

fn format_validation_errors(errors: &validator::ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{}: validation failed", field))
            })
        })
        .collect();
    // Field order in the error map is not stable
    messages.sort();
    messages.join("; ")
}

/// Query extractor with automatic validation.
///
/// Deserializes query parameters and validates them using the `validator` crate.
/// Returns a `ValidationRejection` on parse or validation failure.
#[derive(Debug)]
pub struct ValidatedQuery<T>(pub T);

impl<T> Deref for ValidatedQuery<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S, T> FromRequestParts<S> for ValidatedQuery<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ValidationRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(ValidationRejection::Query)?;
        value.validate().map_err(ValidationRejection::Validation)?;
        Ok(Self(value))
    }
}

/// URL-encoded form extractor with automatic validation.
///
/// Deserializes the form body and validates it using the `validator` crate.
/// Returns a `ValidationRejection` on parse or validation failure.
#[derive(Debug)]
pub struct ValidatedForm<T>(pub T);

impl<T> Deref for ValidatedForm<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S, T> FromRequest<S> for ValidatedForm<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ValidationRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Form(value) = Form::<T>::from_request(req, state)
            .await
            .map_err(ValidationRejection::Form)?;
        value.validate().map_err(ValidationRejection::Validation)?;
        Ok(Self(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_hash_id() {
        assert!(is_valid_hash_id("abc-DEF_123"));
        assert!(is_valid_hash_id(&"a".repeat(64)));
        assert!(!is_valid_hash_id(""));
        assert!(!is_valid_hash_id(&"a".repeat(65)));
        assert!(!is_valid_hash_id("a/b"));
        assert!(!is_valid_hash_id("a b"));
        assert!(!is_valid_hash_id("é"));
    }

    #[test]
    fn test_is_valid_user_id() {
        assert!(is_valid_user_id("auth0|5f7c8ec7c33c6c004bbafe82"));
        assert!(is_valid_user_id("google-oauth2|1234"));
        assert!(!is_valid_user_id(""));
        assert!(!is_valid_user_id("a\nb"));
        assert!(!is_valid_user_id(&"a".repeat(129)));
    }
}
