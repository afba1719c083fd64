//! Login, logout and the OAuth callback
//!
//! These routes run without a session. `/login` stores a random `state`
//! value in a short-lived cookie and sends the browser to the identity
//! provider. The callback checks that value, exchanges the code and
//! starts a session.

use std::sync::Arc;

use axum::extract::State;
use axum::response::Redirect;
use axum::routing::get;
use axum::{Json, Router};
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use validator::Validate;

use crate::api::auth::AuthManager;
use crate::api::extractors::ValidatedQuery;
use crate::api::routes::account::types::LoggedOutView;
use crate::api::types::ApiError;
use crate::core::constants::LOGIN_STATE_COOKIE_NAME;
use crate::data::TransactionalService;
use crate::data::identity::IdentityProvider;
use crate::utils::crypto::{constant_time_eq, generate_token};

/// Random bytes in the OAuth `state` value
const LOGIN_STATE_BYTES: usize = 32;

/// Shared state for login endpoints
#[derive(Clone)]
pub struct LoginApiState {
    pub auth_manager: Arc<AuthManager>,
    pub identity: Arc<dyn IdentityProvider>,
    pub database: Arc<TransactionalService>,
    /// Externally visible base URL, without trailing slash
    pub public_url: String,
}

impl LoginApiState {
    fn callback_url(&self) -> String {
        format!("{}/login/callback", self.public_url)
    }

    fn logged_out_url(&self) -> String {
        format!("{}/account/logged-out", self.public_url)
    }
}

/// Build login routes
pub fn routes(
    auth_manager: Arc<AuthManager>,
    identity: Arc<dyn IdentityProvider>,
    database: Arc<TransactionalService>,
    public_url: &str,
) -> Router<()> {
    let state = LoginApiState {
        auth_manager,
        identity,
        database,
        public_url: public_url.trim_end_matches('/').to_string(),
    };

    Router::new()
        .route("/login", get(login))
        .route("/login/callback", get(callback))
        .route("/logout", get(logout))
        .route("/account/logged-out", get(logged_out))
        .with_state(state)
}

/// Query the identity provider sends back to the callback
#[derive(Debug, Deserialize, Validate)]
pub struct CallbackQuery {
    #[validate(length(max = 2048, message = "code is too long"))]
    pub code: Option<String>,
    #[validate(length(max = 256, message = "state is too long"))]
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// Start the authorization-code flow
#[utoipa::path(
    get,
    path = "/login",
    tag = "auth",
    responses((status = 303, description = "Redirect to the identity provider"))
)]
pub async fn login(
    State(state): State<LoginApiState>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), ApiError> {
    let login_state = generate_token(LOGIN_STATE_BYTES);
    let url = state
        .identity
        .authorize_url(&login_state, &state.callback_url())
        .map_err(ApiError::from_identity)?;

    let jar = jar.add(state.auth_manager.login_state_cookie(login_state));
    Ok((jar, Redirect::to(&url)))
}

/// Finish login: check `state`, exchange the code, start a session
#[utoipa::path(
    get,
    path = "/login/callback",
    tag = "auth",
    params(
        ("code" = Option<String>, Query, description = "Authorization code"),
        ("state" = Option<String>, Query, description = "Value set by /login"),
        ("error" = Option<String>, Query, description = "Set by the provider when login failed")
    ),
    responses(
        (status = 303, description = "Session cookie set, redirect to the dashboard"),
        (status = 400, description = "Missing code or state mismatch"),
        (status = 401, description = "Login refused by the identity provider"),
        (status = 502, description = "Identity provider unavailable")
    )
)]
pub async fn callback(
    State(state): State<LoginApiState>,
    jar: CookieJar,
    ValidatedQuery(query): ValidatedQuery<CallbackQuery>,
) -> Result<(CookieJar, Redirect), ApiError> {
    if let Some(error) = &query.error {
        tracing::warn!(error = %error, description = ?query.error_description, "Login refused");
        return Err(ApiError::unauthorized(
            "LOGIN_FAILED",
            query
                .error_description
                .clone()
                .unwrap_or_else(|| error.clone()),
        ));
    }

    let expected = jar
        .get(LOGIN_STATE_COOKIE_NAME)
        .map(|c| c.value().to_string())
        .unwrap_or_default();
    let received = query.state.as_deref().unwrap_or_default();
    if expected.is_empty() || !constant_time_eq(&expected, received) {
        tracing::warn!("Login callback with missing or mismatched state");
        return Err(ApiError::bad_request(
            "LOGIN_STATE_MISMATCH",
            "Login expired or was started elsewhere, please log in again",
        ));
    }

    let code = query
        .code
        .as_deref()
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::bad_request("MISSING_CODE", "No authorization code found"))?;

    let user = state
        .identity
        .exchange_code(code, &state.callback_url())
        .await
        .map_err(ApiError::from_identity)?;

    let created = state
        .database
        .repository()
        .add_user_if_none(&user.id)
        .await
        .map_err(ApiError::from_data)?;

    let token = state
        .auth_manager
        .create_session(&user.id)
        .map_err(|e| ApiError::internal(format!("Failed to create session: {}", e)))?;

    tracing::info!(user_id = %user.id, first_login = created, "User logged in");

    let jar = jar
        .remove(state.auth_manager.login_state_removal_cookie())
        .add(state.auth_manager.session_cookie(token));
    Ok((jar, Redirect::to("/account/dashboard")))
}

/// Clear the session and log out at the identity provider
#[utoipa::path(
    get,
    path = "/logout",
    tag = "auth",
    responses((status = 303, description = "Redirect to the provider logout"))
)]
pub async fn logout(
    State(state): State<LoginApiState>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), ApiError> {
    let url = state
        .identity
        .logout_url(&state.logged_out_url())
        .map_err(ApiError::from_identity)?;

    let jar = jar.remove(state.auth_manager.session_removal_cookie());
    Ok((jar, Redirect::to(&url)))
}

/// Page shown after logging out or deleting the account
#[utoipa::path(
    get,
    path = "/account/logged-out",
    tag = "auth",
    responses((status = 200, description = "Logged-out page", body = LoggedOutView))
)]
pub async fn logged_out() -> Json<LoggedOutView> {
    Json(LoggedOutView {
        message: "You have been logged out".to_string(),
    })
}
