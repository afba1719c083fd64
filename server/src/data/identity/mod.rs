//! Identity provider integration
//!
//! Names, emails and logins live at an external Auth0-compatible provider.
//! `IdentityProvider` is the seam the handlers use; `Auth0Client` is the
//! production implementation.

mod auth0;

pub use auth0::Auth0Client;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A user as known to the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityUser {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub picture: Option<String>,
}

#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Identity provider returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Unexpected identity provider response: {0}")]
    Decode(String),

    #[error("Identity provider configuration error: {0}")]
    Config(String),
}

impl IdentityError {
    /// True when the provider answered 404 for the requested resource
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status: 404, .. })
    }
}

/// Operations the application needs from the identity provider
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// URL of the provider's login page for an authorization-code flow
    fn authorize_url(&self, state: &str, redirect_uri: &str) -> Result<String, IdentityError>;

    /// Exchange an authorization code for the logged-in user's identity
    async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<IdentityUser, IdentityError>;

    /// URL that ends the provider session and returns to `return_to`
    fn logout_url(&self, return_to: &str) -> Result<String, IdentityError>;

    async fn get_user(&self, id: &str) -> Result<IdentityUser, IdentityError>;

    /// Search users by name; `page` starts at 1
    async fn search_users(&self, query: &str, page: u32)
    -> Result<Vec<IdentityUser>, IdentityError>;

    async fn update_username(&self, id: &str, name: &str) -> Result<(), IdentityError>;

    async fn delete_user(&self, id: &str) -> Result<(), IdentityError>;
}
