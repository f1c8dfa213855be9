//! Store configuration
//!
//! Paths and variable names are plain JSON settings with defaults that match
//! the historical layout (`.session_key` / `.facebook_session` in the working
//! directory). Environment overrides are applied on top by the caller.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{CacheError, Result};
use crate::source::Environment;
use crate::storage::{KeyFile, KeyStore, KeychainKeyStore, DEFAULT_KEYCHAIN_SERVICE};

/// Default key file name
pub const DEFAULT_KEY_FILE: &str = ".session_key";
/// Default session record file name
pub const DEFAULT_SESSION_FILE: &str = ".facebook_session";
/// Default identity variable
pub const DEFAULT_IDENTITY_VAR: &str = "FACEBOOK_EMAIL";
/// Default secret variable
pub const DEFAULT_SECRET_VAR: &str = "FACEBOOK_PASSWORD";

/// Override for `keyFile`
pub const KEY_FILE_ENV: &str = "CREDCACHE_KEY_FILE";
/// Override for `sessionFile`
pub const SESSION_FILE_ENV: &str = "CREDCACHE_SESSION_FILE";
/// Override for `keyBackend`
pub const KEY_BACKEND_ENV: &str = "CREDCACHE_KEY_BACKEND";

/// Where the session encryption key lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyBackend {
    /// Raw key file at `keyFile`
    #[default]
    File,
    /// OS keychain entry
    Keychain,
}

impl std::str::FromStr for KeyBackend {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(Self::File),
            "keychain" => Ok(Self::Keychain),
            other => Err(CacheError::ConfigError(format!(
                "unknown key backend '{}', expected 'file' or 'keychain'",
                other
            ))),
        }
    }
}

/// Credential store configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreConfig {
    /// Path of the raw key file (file backend)
    pub key_file: PathBuf,
    /// Path of the encrypted session record
    pub session_file: PathBuf,
    /// Environment variable holding the identity
    pub identity_var: String,
    /// Environment variable holding the secret
    pub secret_var: String,
    /// Key storage backend
    pub key_backend: KeyBackend,
    /// Keychain service name (keychain backend)
    pub keychain_service: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            key_file: PathBuf::from(DEFAULT_KEY_FILE),
            session_file: PathBuf::from(DEFAULT_SESSION_FILE),
            identity_var: DEFAULT_IDENTITY_VAR.to_string(),
            secret_var: DEFAULT_SECRET_VAR.to_string(),
            key_backend: KeyBackend::File,
            keychain_service: DEFAULT_KEYCHAIN_SERVICE.to_string(),
        }
    }
}

impl StoreConfig {
    /// Default configuration with both files placed in `dir`
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            key_file: dir.join(DEFAULT_KEY_FILE),
            session_file: dir.join(DEFAULT_SESSION_FILE),
            ..Self::default()
        }
    }

    /// Per-user data directory, for callers that do not want the files in the
    /// working directory
    pub fn user_data_dir() -> Result<PathBuf> {
        ProjectDirs::from("com", "credcache", "credcache")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .ok_or_else(|| {
                CacheError::ConfigError("Could not determine data directory".to_string())
            })
    }

    /// Load configuration from a JSON file; a missing file yields defaults
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = ?path, "No config file found, using defaults");
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        debug!(path = ?path, "Loaded config");
        Ok(config)
    }

    /// Save configuration as pretty JSON
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Apply `CREDCACHE_*` overrides from the environment
    pub fn apply_env_overrides(&mut self, env: &dyn Environment) -> Result<()> {
        if let Some(path) = env.non_empty(KEY_FILE_ENV) {
            self.key_file = PathBuf::from(path);
        }
        if let Some(path) = env.non_empty(SESSION_FILE_ENV) {
            self.session_file = PathBuf::from(path);
        }
        if let Some(backend) = env.non_empty(KEY_BACKEND_ENV) {
            self.key_backend = backend.parse()?;
        }
        Ok(())
    }

    /// Build the key store this configuration selects
    pub fn key_store(&self) -> Box<dyn KeyStore> {
        match self.key_backend {
            KeyBackend::File => Box::new(KeyFile::new(&self.key_file)),
            // One keychain entry per session file so separate stores stay isolated
            KeyBackend::Keychain => Box::new(KeychainKeyStore::new(
                &self.keychain_service,
                &format!("session-key:{}", self.session_file.display()),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = StoreConfig::default();
        assert_eq!(config.key_file, PathBuf::from(".session_key"));
        assert_eq!(config.session_file, PathBuf::from(".facebook_session"));
        assert_eq!(config.identity_var, "FACEBOOK_EMAIL");
        assert_eq!(config.secret_var, "FACEBOOK_PASSWORD");
        assert_eq!(config.key_backend, KeyBackend::File);
    }

    #[test]
    fn test_in_dir() {
        let config = StoreConfig::in_dir(Path::new("/var/lib/agent"));
        assert_eq!(config.key_file, PathBuf::from("/var/lib/agent/.session_key"));
        assert_eq!(
            config.session_file,
            PathBuf::from("/var/lib/agent/.facebook_session")
        );
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = StoreConfig::load_from_file(&temp_dir.path().join("none.json")).unwrap();
        assert_eq!(config, StoreConfig::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("credcache.json");
        std::fs::write(&path, r#"{"identityVar": "AGENT_LOGIN", "keyBackend": "keychain"}"#)
            .unwrap();

        let config = StoreConfig::load_from_file(&path).unwrap();
        assert_eq!(config.identity_var, "AGENT_LOGIN");
        assert_eq!(config.secret_var, "FACEBOOK_PASSWORD");
        assert_eq!(config.key_backend, KeyBackend::Keychain);
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("credcache.json");

        let mut config = StoreConfig::in_dir(temp_dir.path());
        config.secret_var = "AGENT_SECRET".to_string();
        config.save_to_file(&path).unwrap();

        assert_eq!(StoreConfig::load_from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_env_overrides() {
        let mut env = HashMap::new();
        env.insert(KEY_FILE_ENV.to_string(), "/tmp/k".to_string());
        env.insert(SESSION_FILE_ENV.to_string(), "/tmp/s".to_string());
        env.insert(KEY_BACKEND_ENV.to_string(), "Keychain".to_string());

        let mut config = StoreConfig::default();
        config.apply_env_overrides(&env).unwrap();

        assert_eq!(config.key_file, PathBuf::from("/tmp/k"));
        assert_eq!(config.session_file, PathBuf::from("/tmp/s"));
        assert_eq!(config.key_backend, KeyBackend::Keychain);
    }

    #[test]
    fn test_bad_backend_override() {
        let mut env = HashMap::new();
        env.insert(KEY_BACKEND_ENV.to_string(), "vault".to_string());

        let mut config = StoreConfig::default();
        assert!(matches!(
            config.apply_env_overrides(&env),
            Err(CacheError::ConfigError(_))
        ));
    }

    #[test]
    fn test_key_store_selection() {
        let mut config = StoreConfig::default();
        assert_eq!(config.key_store().backend_name(), "Key File");

        config.key_backend = KeyBackend::Keychain;
        assert_ne!(config.key_store().backend_name(), "Key File");
    }
}
