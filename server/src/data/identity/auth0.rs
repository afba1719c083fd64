//! Auth0 management and login client

use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::Expiry;
use moka::future::Cache;
use reqwest::Url;
use serde::Deserialize;

use super::{IdentityError, IdentityProvider, IdentityUser};
use crate::core::config::IdentityConfig;
use crate::core::constants::{
    IDENTITY_LOGIN_SCOPE, IDENTITY_REQUEST_TIMEOUT_SECS, IDENTITY_SEARCH_PER_PAGE,
    IDENTITY_TOKEN_DEFAULT_TTL_SECS, IDENTITY_TOKEN_EXPIRY_MARGIN_SECS,
};

const MANAGEMENT_TOKEN_KEY: &str = "management";

#[derive(Clone)]
struct CachedToken {
    access_token: String,
    ttl: Duration,
}

/// Expire each token at its own lifetime
struct TokenExpiry;

impl Expiry<&'static str, CachedToken> for TokenExpiry {
    fn expire_after_create(
        &self,
        _key: &&'static str,
        value: &CachedToken,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<u64>,
}

/// User object as returned by the management API and `/userinfo`
#[derive(Deserialize)]
struct Auth0User {
    #[serde(alias = "sub")]
    user_id: String,
    nickname: Option<String>,
    name: Option<String>,
    email: Option<String>,
    picture: Option<String>,
}

impl From<Auth0User> for IdentityUser {
    fn from(user: Auth0User) -> Self {
        let name = user
            .nickname
            .or(user.name)
            .unwrap_or_else(|| user.user_id.clone());
        Self {
            id: user.user_id,
            name,
            email: user.email,
            picture: user.picture,
        }
    }
}

/// Client for an Auth0 tenant
pub struct Auth0Client {
    client: reqwest::Client,
    config: IdentityConfig,
    base_url: Url,
    tokens: Cache<&'static str, CachedToken>,
}

impl Auth0Client {
    pub fn new(config: IdentityConfig) -> Result<Self, IdentityError> {
        let base_url = Url::parse(&config.base_url())
            .map_err(|e| IdentityError::Config(format!("invalid domain: {}", e)))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(IDENTITY_REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| IdentityError::Config(format!("failed to build HTTP client: {}", e)))?;

        let tokens = Cache::builder()
            .max_capacity(1)
            .expire_after(TokenExpiry)
            .build();

        tracing::debug!(domain = %config.domain, "Identity client initialized");
        Ok(Self {
            client,
            config,
            base_url,
            tokens,
        })
    }

    /// URL under the tenant with each segment percent-encoded
    fn url(&self, segments: &[&str]) -> Result<Url, IdentityError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| IdentityError::Config("domain cannot be a base URL".to_string()))?
            .clear()
            .extend(segments);
        Ok(url)
    }

    fn user_url(&self, id: &str) -> Result<Url, IdentityError> {
        self.url(&["api", "v2", "users", id])
    }

    async fn management_token(&self) -> Result<String, IdentityError> {
        if let Some(cached) = self.tokens.get(MANAGEMENT_TOKEN_KEY).await {
            return Ok(cached.access_token);
        }

        let body = serde_json::json!({
            "grant_type": "client_credentials",
            "client_id": self.config.client_id,
            "client_secret": self.config.client_secret,
            "audience": self.config.audience,
        });
        let resp = self
            .client
            .post(self.url(&["oauth", "token"])?)
            .json(&body)
            .send()
            .await?;
        let token: TokenResponse = read_json(resp).await?;

        let ttl = token_cache_ttl(token.expires_in);
        if !ttl.is_zero() {
            self.tokens
                .insert(
                    MANAGEMENT_TOKEN_KEY,
                    CachedToken {
                        access_token: token.access_token.clone(),
                        ttl,
                    },
                )
                .await;
        }
        tracing::debug!(ttl_secs = ttl.as_secs(), "Fetched management token");
        Ok(token.access_token)
    }
}

/// How long a token may be reused, leaving a margin before it expires
fn token_cache_ttl(expires_in: Option<u64>) -> Duration {
    let lifetime = expires_in.unwrap_or(IDENTITY_TOKEN_DEFAULT_TTL_SECS);
    Duration::from_secs(lifetime.saturating_sub(IDENTITY_TOKEN_EXPIRY_MARGIN_SECS))
}

/// Characters with a meaning in Lucene query syntax
const LUCENE_SPECIAL: &[char] = &[
    '+', '-', '&', '|', '!', '(', ')', '{', '}', '[', ']', '^', '"', '~', '*', '?', ':', '\\',
    '/',
];

/// Escape user input so it is matched as a single literal term
fn escape_lucene(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if LUCENE_SPECIAL.contains(&c) || c.is_whitespace() {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Lucene query for a nickname search: `*q*` for longer input, `q*` otherwise
fn nickname_query(query: &str) -> String {
    let query = query.trim();
    let term = escape_lucene(query);
    if query.chars().count() > 2 {
        format!("nickname:*{}*", term)
    } else {
        format!("nickname:{}*", term)
    }
}

async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, IdentityError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(IdentityError::Status {
        status: status.as_u16(),
        body,
    })
}

async fn read_json<T: serde::de::DeserializeOwned>(
    resp: reqwest::Response,
) -> Result<T, IdentityError> {
    let resp = check_status(resp).await?;
    let bytes = resp.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| IdentityError::Decode(e.to_string()))
}

#[async_trait]
impl IdentityProvider for Auth0Client {
    fn authorize_url(&self, state: &str, redirect_uri: &str) -> Result<String, IdentityError> {
        let mut url = self.url(&["authorize"])?;
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", redirect_uri)
            .append_pair("scope", IDENTITY_LOGIN_SCOPE)
            .append_pair("state", state);
        Ok(url.into())
    }

    async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<IdentityUser, IdentityError> {
        let body = serde_json::json!({
            "grant_type": "authorization_code",
            "client_id": self.config.client_id,
            "client_secret": self.config.client_secret,
            "code": code,
            "redirect_uri": redirect_uri,
        });
        let resp = self
            .client
            .post(self.url(&["oauth", "token"])?)
            .json(&body)
            .send()
            .await?;
        let token: TokenResponse = read_json(resp).await?;

        let resp = self
            .client
            .get(self.url(&["userinfo"])?)
            .bearer_auth(&token.access_token)
            .send()
            .await?;
        let user: Auth0User = read_json(resp).await?;
        Ok(user.into())
    }

    fn logout_url(&self, return_to: &str) -> Result<String, IdentityError> {
        let mut url = self.url(&["v2", "logout"])?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("returnTo", return_to);
        Ok(url.into())
    }

    async fn get_user(&self, id: &str) -> Result<IdentityUser, IdentityError> {
        let token = self.management_token().await?;
        let resp = self
            .client
            .get(self.user_url(id)?)
            .bearer_auth(token)
            .send()
            .await?;
        let user: Auth0User = read_json(resp).await?;
        Ok(user.into())
    }

    async fn search_users(
        &self,
        query: &str,
        page: u32,
    ) -> Result<Vec<IdentityUser>, IdentityError> {
        let token = self.management_token().await?;

        let mut url = self.url(&["api", "v2", "users"])?;
        url.query_pairs_mut()
            .append_pair("q", &nickname_query(query))
            .append_pair("search_engine", "v3")
            .append_pair("page", &page.saturating_sub(1).to_string())
            .append_pair("per_page", &IDENTITY_SEARCH_PER_PAGE.to_string());

        let resp = self.client.get(url).bearer_auth(token).send().await?;
        let users: Vec<Auth0User> = read_json(resp).await?;
        Ok(users.into_iter().map(Into::into).collect())
    }

    async fn update_username(&self, id: &str, name: &str) -> Result<(), IdentityError> {
        let token = self.management_token().await?;
        let resp = self
            .client
            .patch(self.user_url(id)?)
            .bearer_auth(token)
            .json(&serde_json::json!({ "nickname": name }))
            .send()
            .await?;
        check_status(resp).await?;
        tracing::debug!(user_id = %id, "Updated username at identity provider");
        Ok(())
    }

    async fn delete_user(&self, id: &str) -> Result<(), IdentityError> {
        let token = self.management_token().await?;
        let resp = self
            .client
            .delete(self.user_url(id)?)
            .bearer_auth(token)
            .send()
            .await?;
        check_status(resp).await?;
        tracing::debug!(user_id = %id, "Deleted user at identity provider");
        Ok(())
    }
}
