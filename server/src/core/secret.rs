//! Server secret storage
//!
//! The session signing key is read from `BUGTRACKER_SESSION_SECRET` when set,
//! otherwise it is persisted in `secrets.json` inside the data directory so
//! sessions survive restarts.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use super::constants::{ENV_SESSION_SECRET, SECRETS_FILENAME};
use super::storage::AppStorage;
use crate::utils::crypto;

/// Vault key of the session signing key
const SECRET_KEY_SESSION_SIGNING: &str = "session_signing_key";

/// Signing key length in bytes
const SIGNING_KEY_LEN: usize = 32;

/// Where secrets come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretBackend {
    /// Process environment (read-only)
    Env,
    /// JSON file in the data directory
    File(PathBuf),
}

impl SecretBackend {
    /// Human-readable backend name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Env => "Environment",
            Self::File(_) => "File",
        }
    }
}

/// A secret with its creation metadata
#[derive(Clone, Serialize, Deserialize)]
pub struct Secret {
    pub value: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secret")
            .field("value", &"[REDACTED]")
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            value: value.into(),
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct SecretVault {
    secrets: HashMap<String, Secret>,
}

/// Secret manager backed by the environment or a file vault
///
/// The vault is cached in memory after the initial load.
#[derive(Debug, Clone)]
pub struct SecretManager {
    backend: SecretBackend,
    vault: Arc<RwLock<SecretVault>>,
    save_mutex: Arc<tokio::sync::Mutex<()>>,
}

impl SecretManager {
    /// Initialize the secret manager
    pub async fn init(storage: &AppStorage) -> Result<Self> {
        let backend = Self::detect_backend(storage);
        let vault = match &backend {
            SecretBackend::File(path) => Self::load_vault_from_file(path).await?,
            SecretBackend::Env => SecretVault::default(),
        };

        tracing::debug!(backend = backend.name(), "Secret manager initialized");
        Ok(Self {
            backend,
            vault: Arc::new(RwLock::new(vault)),
            save_mutex: Arc::new(tokio::sync::Mutex::new(())),
        })
    }

    /// Get the active backend
    pub fn backend(&self) -> &SecretBackend {
        &self.backend
    }

    /// Store a secret, preserving its original creation time
    pub async fn set(&self, name: &str, mut secret: Secret) -> Result<()> {
        {
            let mut vault = self.vault.write().await;
            if let Some(existing) = vault.secrets.get(name) {
                secret.created_at = existing.created_at;
            }
            secret.updated_at = Utc::now();
            vault.secrets.insert(name.to_string(), secret);
        }
        self.save_vault().await?;
        tracing::debug!(name, "Stored secret");
        Ok(())
    }

    /// Get a secret value
    pub async fn get_value(&self, name: &str) -> Option<String> {
        let vault = self.vault.read().await;
        vault.secrets.get(name).map(|s| s.value.clone())
    }

    /// Get the session signing key, creating it if it doesn't exist
    pub async fn get_session_signing_key(&self) -> Result<Vec<u8>> {
        if let SecretBackend::Env = self.backend {
            let hex = std::env::var(ENV_SESSION_SECRET)
                .with_context(|| format!("{} is not set", ENV_SESSION_SECRET))?;
            let key = crypto::decode_hex(hex.trim())
                .with_context(|| format!("{} must be hex-encoded", ENV_SESSION_SECRET))?;
            if key.len() < SIGNING_KEY_LEN {
                return Err(anyhow!(
                    "{} must encode at least {} bytes",
                    ENV_SESSION_SECRET,
                    SIGNING_KEY_LEN
                ));
            }
            return Ok(key);
        }

        if let Some(key_hex) = self.get_value(SECRET_KEY_SESSION_SIGNING).await {
            if let Ok(key) = crypto::decode_hex(&key_hex)
                && key.len() == SIGNING_KEY_LEN
            {
                return Ok(key);
            }
            tracing::warn!("Stored session signing key has invalid format, regenerating");
        }

        let key = crypto::generate_key(SIGNING_KEY_LEN);
        self.set(SECRET_KEY_SESSION_SIGNING, Secret::new(crypto::encode_hex(&key)))
            .await?;
        tracing::debug!("Created new session signing key");
        Ok(key)
    }

    fn detect_backend(storage: &AppStorage) -> SecretBackend {
        if std::env::var(ENV_SESSION_SECRET).is_ok_and(|v| !v.trim().is_empty()) {
            return SecretBackend::Env;
        }
        SecretBackend::File(storage.data_path(SECRETS_FILENAME))
    }

    async fn load_vault_from_file(path: &Path) -> Result<SecretVault> {
        match tokio::fs::read_to_string(path).await {
            Ok(json) => {
                let vault: SecretVault =
                    serde_json::from_str(&json).context("Failed to parse secrets file")?;
                tracing::debug!(count = vault.secrets.len(), "Loaded secrets from file");
                Ok(vault)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No existing secrets file, creating new vault");
                Ok(SecretVault::default())
            }
            Err(e) => Err(anyhow!("Failed to load secrets file: {}", e)),
        }
    }

    async fn save_vault(&self) -> Result<()> {
        let path = match &self.backend {
            SecretBackend::File(path) => path,
            SecretBackend::Env => return Err(anyhow!("Environment secrets are read-only")),
        };

        let _guard = self.save_mutex.lock().await;
        let json = {
            let vault = self.vault.read().await;
            serde_json::to_string_pretty(&*vault).context("Failed to serialize vault")?
        };

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .context("Failed to create secrets directory")?;
        }
        tokio::fs::write(path, json)
            .await
            .context("Failed to write secrets file")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_manager(dir: &Path) -> SecretManager {
        SecretManager {
            backend: SecretBackend::File(dir.join(SECRETS_FILENAME)),
            vault: Arc::new(RwLock::new(SecretVault::default())),
            save_mutex: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    #[test]
    fn test_secret_debug_redacts_value() {
        let secret = Secret::new("super-secret-key");
        let debug = format!("{:?}", secret);
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("super-secret-key"));
    }

    #[tokio::test]
    async fn test_signing_key_is_persisted_and_reused() {
        let temp = tempfile::tempdir().unwrap();
        let manager = file_manager(temp.path());

        let first = manager.get_session_signing_key().await.unwrap();
        assert_eq!(first.len(), SIGNING_KEY_LEN);
        assert!(temp.path().join(SECRETS_FILENAME).exists());

        let reloaded = SecretManager {
            vault: Arc::new(RwLock::new(
                SecretManager::load_vault_from_file(&temp.path().join(SECRETS_FILENAME))
                    .await
                    .unwrap(),
            )),
            ..file_manager(temp.path())
        };
        let second = reloaded.get_session_signing_key().await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_invalid_stored_key_is_regenerated() {
        let temp = tempfile::tempdir().unwrap();
        let manager = file_manager(temp.path());
        manager
            .set(SECRET_KEY_SESSION_SIGNING, Secret::new("not-hex"))
            .await
            .unwrap();

        let key = manager.get_session_signing_key().await.unwrap();
        assert_eq!(key.len(), SIGNING_KEY_LEN);
        assert_ne!(
            manager.get_value(SECRET_KEY_SESSION_SIGNING).await.unwrap(),
            "not-hex"
        );
    }

    #[tokio::test]
    async fn test_set_preserves_created_at() {
        let temp = tempfile::tempdir().unwrap();
        let manager = file_manager(temp.path());
        manager.set("k", Secret::new("v1")).await.unwrap();
        let created = manager.vault.read().await.secrets["k"].created_at;

        manager.set("k", Secret::new("v2")).await.unwrap();
        let vault = manager.vault.read().await;
        assert_eq!(vault.secrets["k"].created_at, created);
        assert_eq!(vault.secrets["k"].value, "v2");
    }

    #[tokio::test]
    async fn test_missing_file_loads_empty_vault() {
        let temp = tempfile::tempdir().unwrap();
        let vault = SecretManager::load_vault_from_file(&temp.path().join("none.json"))
            .await
            .unwrap();
        assert!(vault.secrets.is_empty());
    }

    #[test]
    fn test_backend_names() {
        assert_eq!(SecretBackend::Env.name(), "Environment");
        assert_eq!(SecretBackend::File(PathBuf::from("/tmp/x")).name(), "File");
    }
}
