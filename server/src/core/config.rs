use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::utils::file::expand_path;

use super::cli::CliConfig;
use super::constants::{
    APP_DOT_FOLDER, AVATAR_MAX_BYTES_CEILING, CONFIG_FILE_NAME, DEFAULT_AVATAR_MAX_BYTES,
    DEFAULT_HOST, DEFAULT_PORT, DEFAULT_SESSION_TTL_DAYS,
};

// =============================================================================
// File Config Structs (all fields optional, merged across files)
// =============================================================================

/// Server configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ServerFileConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub public_url: Option<String>,
}

/// Identity provider configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct IdentityFileConfig {
    pub domain: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub audience: Option<String>,
}

/// Session configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct SessionFileConfig {
    pub ttl_days: Option<u32>,
    pub secure_cookie: Option<bool>,
}

/// Upload configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct UploadsFileConfig {
    pub avatar_max_bytes: Option<usize>,
}

/// File-based configuration (JSON)
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub server: Option<ServerFileConfig>,
    pub identity: Option<IdentityFileConfig>,
    pub session: Option<SessionFileConfig>,
    pub uploads: Option<UploadsFileConfig>,
    pub debug: Option<bool>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

impl FileConfig {
    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading config file");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Warn about unknown fields in the config
    fn warn_unknown_fields(&self) {
        if let serde_json::Value::Object(map) = &self.extra
            && !map.is_empty()
        {
            let keys_str: String = map
                .keys()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            tracing::warn!(
                fields = %keys_str,
                "Unknown fields in config file (possible typos)"
            );
        }
    }

    /// Merge another FileConfig into this one (other takes precedence)
    fn merge(&mut self, other: FileConfig) {
        if let Some(server) = other.server {
            let current = self.server.get_or_insert_with(ServerFileConfig::default);
            if server.host.is_some() {
                current.host = server.host;
            }
            if server.port.is_some() {
                current.port = server.port;
            }
            if server.public_url.is_some() {
                current.public_url = server.public_url;
            }
        }

        if let Some(identity) = other.identity {
            let current = self.identity.get_or_insert_with(IdentityFileConfig::default);
            if identity.domain.is_some() {
                current.domain = identity.domain;
            }
            if identity.client_id.is_some() {
                current.client_id = identity.client_id;
            }
            if identity.client_secret.is_some() {
                current.client_secret = identity.client_secret;
            }
            if identity.audience.is_some() {
                current.audience = identity.audience;
            }
        }

        if let Some(session) = other.session {
            let current = self.session.get_or_insert_with(SessionFileConfig::default);
            if session.ttl_days.is_some() {
                current.ttl_days = session.ttl_days;
            }
            if session.secure_cookie.is_some() {
                current.secure_cookie = session.secure_cookie;
            }
        }

        if let Some(uploads) = other.uploads
            && uploads.avatar_max_bytes.is_some()
        {
            let current = self.uploads.get_or_insert_with(UploadsFileConfig::default);
            current.avatar_max_bytes = uploads.avatar_max_bytes;
        }

        if other.debug.is_some() {
            self.debug = other.debug;
        }
    }
}

// =============================================================================
// Runtime Config Structs (final merged configuration)
// =============================================================================

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Externally visible base URL without trailing slash
    pub public_url: String,
}

/// Identity provider configuration
#[derive(Clone)]
pub struct IdentityConfig {
    /// Tenant domain without scheme (e.g. `example.eu.auth0.com`)
    pub domain: String,
    pub client_id: String,
    pub client_secret: String,
    pub audience: String,
}

impl std::fmt::Debug for IdentityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityConfig")
            .field("domain", &self.domain)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("audience", &self.audience)
            .finish()
    }
}

impl IdentityConfig {
    /// Base URL of the tenant (`https://{domain}`)
    pub fn base_url(&self) -> String {
        format!("https://{}", self.domain)
    }
}

/// Session configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub ttl_days: u32,
    pub secure_cookie: bool,
}

/// Upload configuration
#[derive(Debug, Clone)]
pub struct UploadsConfig {
    pub avatar_max_bytes: usize,
}

/// Final merged application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub identity: IdentityConfig,
    pub session: SessionConfig,
    pub uploads: UploadsConfig,
    pub debug: bool,
}

impl AppConfig {
    /// Load configuration from all sources
    ///
    /// Priority (lowest to highest):
    /// 1. Defaults
    /// 2. Profile directory config (~/.bugtracker/bugtracker.json)
    /// 3. Local directory config OR CLI-specified config path
    /// 4. CLI arguments (which include env var fallbacks via clap)
    pub fn load(cli: &CliConfig) -> Result<Self> {
        tracing::debug!("Loading application configuration");

        let mut file_config = FileConfig::default();
        let mut found_configs: Vec<String> = Vec::new();

        if let Some(profile_path) = get_profile_config_path()
            && profile_path.exists()
        {
            let profile_config = FileConfig::load_from_file(&profile_path)?;
            profile_config.warn_unknown_fields();
            file_config.merge(profile_config);
            found_configs.push(profile_path.display().to_string());
        }

        let overlay_path = if let Some(ref path) = cli.config {
            let expanded = expand_path(&path.to_string_lossy());
            if !expanded.exists() {
                anyhow::bail!("Config file not found: {}", expanded.display());
            }
            Some(expanded)
        } else {
            let local = PathBuf::from(CONFIG_FILE_NAME);
            if local.exists() { Some(local) } else { None }
        };

        if let Some(path) = overlay_path {
            let overlay_config = FileConfig::load_from_file(&path)?;
            overlay_config.warn_unknown_fields();
            file_config.merge(overlay_config);
            found_configs.push(path.display().to_string());
        }

        tracing::debug!(configs = ?found_configs, "Config files loaded");

        let config = Self::from_layers(cli, file_config);
        config.validate()?;

        tracing::debug!(
            host = %config.server.host,
            port = config.server.port,
            public_url = %config.server.public_url,
            identity_domain = %config.identity.domain,
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Layer configs: defaults -> file config -> CLI/env overrides
    fn from_layers(cli: &CliConfig, file_config: FileConfig) -> Self {
        let file_server = file_config.server.unwrap_or_default();
        let file_identity = file_config.identity.unwrap_or_default();
        let file_session = file_config.session.unwrap_or_default();
        let file_uploads = file_config.uploads.unwrap_or_default();

        let host = cli
            .host
            .clone()
            .or(file_server.host)
            .unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = cli.port.or(file_server.port).unwrap_or(DEFAULT_PORT);

        let public_url = cli
            .public_url
            .clone()
            .or(file_server.public_url)
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| {
                let display_host = if is_all_interfaces(&host) {
                    "localhost"
                } else {
                    host.as_str()
                };
                format!("http://{}:{}", display_host, port)
            });

        let domain = normalize_domain(
            &cli.identity_domain
                .clone()
                .or(file_identity.domain)
                .unwrap_or_default(),
        );
        let audience = cli
            .identity_audience
            .clone()
            .or(file_identity.audience)
            .unwrap_or_else(|| format!("https://{}/api/v2/", domain));

        let identity = IdentityConfig {
            client_id: cli
                .identity_client_id
                .clone()
                .or(file_identity.client_id)
                .unwrap_or_default(),
            client_secret: cli
                .identity_client_secret
                .clone()
                .or(file_identity.client_secret)
                .unwrap_or_default(),
            audience,
            domain,
        };

        let session = SessionConfig {
            ttl_days: cli
                .session_ttl_days
                .or(file_session.ttl_days)
                .unwrap_or(DEFAULT_SESSION_TTL_DAYS),
            // Secure cookies follow the public URL scheme unless set explicitly
            secure_cookie: file_session
                .secure_cookie
                .unwrap_or_else(|| public_url.starts_with("https://")),
        };

        let uploads = UploadsConfig {
            avatar_max_bytes: cli
                .avatar_max_bytes
                .or(file_uploads.avatar_max_bytes)
                .unwrap_or(DEFAULT_AVATAR_MAX_BYTES),
        };

        Self {
            server: ServerConfig {
                host,
                port,
                public_url,
            },
            identity,
            session,
            uploads,
            debug: cli.debug || file_config.debug.unwrap_or(false),
        }
    }

    /// Validate the configuration for consistency and correctness
    fn validate(&self) -> Result<()> {
        if self.server.host.is_empty() {
            anyhow::bail!("Configuration error: server.host must not be empty");
        }
        if self.server.port == 0 {
            anyhow::bail!("Configuration error: server.port must be greater than 0");
        }
        if reqwest::Url::parse(&self.server.public_url).is_err() {
            anyhow::bail!(
                "Configuration error: server.public_url is not a valid URL: {}",
                self.server.public_url
            );
        }

        if self.identity.domain.is_empty() {
            anyhow::bail!(
                "Configuration error: identity.domain is required (set --identity-domain or BUGTRACKER_IDENTITY_DOMAIN)"
            );
        }
        if self.identity.client_id.is_empty() {
            anyhow::bail!("Configuration error: identity.client_id is required");
        }
        if self.identity.client_secret.is_empty() {
            anyhow::bail!("Configuration error: identity.client_secret is required");
        }

        if self.session.ttl_days == 0 {
            anyhow::bail!("Configuration error: session.ttl_days must be greater than 0");
        }

        if self.uploads.avatar_max_bytes == 0
            || self.uploads.avatar_max_bytes > AVATAR_MAX_BYTES_CEILING
        {
            anyhow::bail!(
                "Configuration error: uploads.avatar_max_bytes must be between 1 and {}",
                AVATAR_MAX_BYTES_CEILING
            );
        }

        if !self.session.secure_cookie && self.server.public_url.starts_with("https://") {
            tracing::warn!("session.secure_cookie is disabled while serving over https");
        }

        Ok(())
    }
}

/// Get the profile config path (~/.bugtracker/bugtracker.json)
fn get_profile_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(APP_DOT_FOLDER).join(CONFIG_FILE_NAME))
}

/// Strip scheme and trailing slashes from a tenant domain
fn normalize_domain(domain: &str) -> String {
    let trimmed = domain.trim();
    let without_scheme = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed);
    without_scheme.trim_end_matches('/').to_string()
}

/// Check if host binds to all network interfaces
pub fn is_all_interfaces(host: &str) -> bool {
    matches!(host, "0.0.0.0" | "::" | "[::]")
}
