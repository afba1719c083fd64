//! Authentication middleware

use std::sync::Arc;

use axum::Json;
use axum::extract::{Request, State};
use axum::http::{StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::CookieJar;
use serde_json::json;

use super::context::{AuthContext, AuthService};
use super::jwt::JwtError;
use super::manager::AuthManager;
use crate::api::middleware::{AllowedOrigins, origin_of};
use crate::core::constants::SESSION_COOKIE_NAME;
use crate::data::TransactionalService;

/// Authentication error response
#[derive(Debug)]
pub struct AuthError {
    pub status: StatusCode,
    pub error: &'static str,
    pub code: &'static str,
    pub message: String,
}

impl AuthError {
    pub fn required() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            error: "unauthorized",
            code: "AUTH_REQUIRED",
            message: "Authentication required".to_string(),
        }
    }

    pub fn expired() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            error: "unauthorized",
            code: "TOKEN_EXPIRED",
            message: "Session has expired".to_string(),
        }
    }

    pub fn invalid() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            error: "unauthorized",
            code: "TOKEN_INVALID",
            message: "Invalid session token".to_string(),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error: "internal",
            code: "INTERNAL_ERROR",
            message: "Session could not be checked".to_string(),
        }
    }

    pub fn origin_not_allowed() -> Self {
        Self {
            status: StatusCode::FORBIDDEN,
            error: "forbidden",
            code: "ORIGIN_NOT_ALLOWED",
            message: "Request origin not allowed".to_string(),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": self.error,
            "code": self.code,
            "message": self.message,
        });
        (self.status, Json(body)).into_response()
    }
}

/// Shared auth state for middleware
#[derive(Clone)]
pub struct AuthState {
    pub auth_manager: Arc<AuthManager>,
    pub allowed_origins: AllowedOrigins,
    pub database: Arc<TransactionalService>,
}

/// Session authentication middleware
///
/// State-changing requests must come from an allowed origin (Origin header,
/// falling back to Referer). The session cookie must carry a valid token
/// whose user still has an account.
///
/// Injects into request extensions:
/// - `AuthContext` - the session user
/// - `Arc<AuthService>` - developer checks for the extractors
pub async fn require_auth(
    State(state): State<AuthState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    if !request.method().is_safe() {
        let origin_to_check = request
            .headers()
            .get(header::ORIGIN)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string())
            .or_else(|| {
                let referer = request
                    .headers()
                    .get(header::REFERER)
                    .and_then(|v| v.to_str().ok())?;
                let origin = origin_of(referer);
                if origin.is_none() {
                    tracing::debug!(referer = %referer, "Failed to parse Referer URL");
                }
                origin
            });

        if let Some(origin_str) = origin_to_check
            && !state.allowed_origins.is_allowed(&origin_str)
        {
            tracing::warn!(origin = %origin_str, "Rejected request from disallowed origin");
            return Err(AuthError::origin_not_allowed());
        }
    }

    let session_cookie = jar
        .get(SESSION_COOKIE_NAME)
        .ok_or_else(AuthError::required)?;

    let claims = state
        .auth_manager
        .validate_session(session_cookie.value())
        .map_err(|e| match e {
            JwtError::Expired => AuthError::expired(),
            other => {
                tracing::debug!(error = %other, "Rejected session token");
                AuthError::invalid()
            }
        })?;

    let account = state
        .database
        .repository()
        .get_profile(claims.user_id())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to look up session user");
            AuthError::unavailable()
        })?;
    if account.is_none() {
        tracing::debug!(user_id = %claims.user_id(), "Rejected session of deleted account");
        return Err(AuthError::required());
    }

    request
        .extensions_mut()
        .insert(Arc::new(AuthService::new(state.database.clone())));
    request
        .extensions_mut()
        .insert(AuthContext::new(claims.user_id()));

    Ok(next.run(request).await)
}
