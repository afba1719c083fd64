//! Authentication manager
//!
//! Owns the session signing key and builds the cookies that carry the
//! session token and the login `state` value.

use anyhow::Result;
use axum_extra::extract::cookie::{Cookie, SameSite};

use super::jwt::{JwtError, SessionClaims, create_session_token, validate_session_token};
use crate::core::SecretManager;
use crate::core::config::SessionConfig;
use crate::core::constants::{
    AUTH_METHOD_OAUTH, LOGIN_STATE_COOKIE_NAME, LOGIN_STATE_TTL_MINUTES, SESSION_COOKIE_NAME,
};

/// Path the login state cookie is scoped to
const LOGIN_COOKIE_PATH: &str = "/login";

#[derive(Debug)]
pub struct AuthManager {
    signing_key: Vec<u8>,
    ttl_days: u32,
    secure_cookie: bool,
}

impl AuthManager {
    /// Initialize with the persisted (or configured) signing key
    pub async fn init(secrets: &SecretManager, session: &SessionConfig) -> Result<Self> {
        let signing_key = secrets.get_session_signing_key().await?;
        tracing::debug!(
            ttl_days = session.ttl_days,
            secure_cookie = session.secure_cookie,
            "Session auth initialized"
        );
        Ok(Self::new(signing_key, session))
    }

    pub fn new(signing_key: Vec<u8>, session: &SessionConfig) -> Self {
        Self {
            signing_key,
            ttl_days: session.ttl_days,
            secure_cookie: session.secure_cookie,
        }
    }

    /// Issue a session token for a user who completed login
    pub fn create_session(&self, user_id: &str) -> Result<String> {
        create_session_token(&self.signing_key, user_id, AUTH_METHOD_OAUTH, self.ttl_days)
    }

    /// Validate a JWT session token
    pub fn validate_session(&self, jwt: &str) -> Result<SessionClaims, JwtError> {
        validate_session_token(jwt, &self.signing_key)
    }

    pub fn session_cookie(&self, token: String) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE_NAME, token))
            .http_only(true)
            .secure(self.secure_cookie)
            .same_site(SameSite::Lax)
            .path("/")
            .max_age(time::Duration::days(i64::from(self.ttl_days)))
            .build()
    }

    /// Cookie matching the session cookie, for removal from a jar
    pub fn session_removal_cookie(&self) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE_NAME, ""))
            .http_only(true)
            .secure(self.secure_cookie)
            .same_site(SameSite::Lax)
            .path("/")
            .max_age(time::Duration::seconds(0))
            .build()
    }

    pub fn login_state_cookie(&self, state: String) -> Cookie<'static> {
        Cookie::build((LOGIN_STATE_COOKIE_NAME, state))
            .http_only(true)
            .secure(self.secure_cookie)
            // Lax so the cookie survives the top-level redirect back from the provider
            .same_site(SameSite::Lax)
            .path(LOGIN_COOKIE_PATH)
            .max_age(time::Duration::minutes(LOGIN_STATE_TTL_MINUTES))
            .build()
    }

    pub fn login_state_removal_cookie(&self) -> Cookie<'static> {
        Cookie::build((LOGIN_STATE_COOKIE_NAME, ""))
            .http_only(true)
            .secure(self.secure_cookie)
            .same_site(SameSite::Lax)
            .path(LOGIN_COOKIE_PATH)
            .max_age(time::Duration::seconds(0))
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager(secure_cookie: bool) -> AuthManager {
        AuthManager::new(
            vec![7u8; 32],
            &SessionConfig {
                ttl_days: 7,
                secure_cookie,
            },
        )
    }

    #[test]
    fn test_session_round_trip() {
        let auth = manager(false);
        let token = auth.create_session("auth0|alice").unwrap();
        let claims = auth.validate_session(&token).unwrap();
        assert_eq!(claims.user_id(), "auth0|alice");
        assert_eq!(claims.auth_method, AUTH_METHOD_OAUTH);
    }

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = manager(true).session_cookie("jwt".into());
        assert_eq!(cookie.name(), SESSION_COOKIE_NAME);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(time::Duration::days(7)));
    }

    #[test]
    fn test_login_state_cookie_scoped_to_login() {
        let cookie = manager(false).login_state_cookie("abc".into());
        assert_eq!(cookie.path(), Some("/login"));
        assert_eq!(
            cookie.max_age(),
            Some(time::Duration::minutes(LOGIN_STATE_TTL_MINUTES))
        );
    }
}
