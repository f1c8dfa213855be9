//! Credential store orchestration
//!
//! Resolution chain, first success wins:
//! 1. in-memory slot
//! 2. encrypted session record
//! 3. identity/secret environment variables
//! 4. interactive prompt
//!
//! Only [`CacheError::MissingCredentials`] escapes [`CredentialStore::acquire_credentials`];
//! decryption and persistence problems are logged and degrade to the next source.

use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::config::StoreConfig;
use crate::credential::{CredentialPair, CredentialSource};
use crate::crypto::{decrypt_field, encrypt_field};
use crate::error::{CacheError, LoadFailure, Result};
use crate::session::{SessionFile, SessionRecord};
use crate::source::{CredentialPrompt, Environment, ProcessEnvironment, TerminalPrompt};
use crate::storage::KeyStore;

const IDENTITY_PROMPT: &str = "Email: ";
const SECRET_PROMPT: &str = "Password: ";

/// Store state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreState {
    /// No pair in memory
    Empty,
    /// Walking the resolution chain
    Resolving,
    /// A pair is held in memory; later acquisitions return it directly
    Cached,
}

/// Result of a best-effort persist
#[derive(Debug)]
pub enum PersistOutcome {
    /// Session record written
    Persisted,
    /// Nothing was written; the pair is still cached in memory
    Failed(CacheError),
}

impl PersistOutcome {
    pub fn is_persisted(&self) -> bool {
        matches!(self, Self::Persisted)
    }
}

/// Snapshot of the store and its files
#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
    pub state: StoreState,
    pub source: Option<CredentialSource>,
    pub session_file: PathBuf,
    pub session_exists: bool,
    pub session_timestamp: Option<String>,
    pub key_backend: &'static str,
    pub key_exists: bool,
}

/// Local credential cache
pub struct CredentialStore {
    config: StoreConfig,
    session_file: SessionFile,
    key_store: Box<dyn KeyStore>,
    environment: Box<dyn Environment>,
    prompt: Box<dyn CredentialPrompt>,
    cached: Option<(CredentialPair, CredentialSource)>,
    state: StoreState,
}

impl CredentialStore {
    /// Create a store using the process environment and the terminal prompt
    pub fn new(config: StoreConfig) -> Self {
        let session_file = SessionFile::new(&config.session_file);
        let key_store = config.key_store();

        Self {
            config,
            session_file,
            key_store,
            environment: Box::new(ProcessEnvironment),
            prompt: Box::new(
                TerminalPrompt::new().with_header("Login credentials required"),
            ),
            cached: None,
            state: StoreState::Empty,
        }
    }

    /// Replace the environment source
    pub fn with_environment(mut self, environment: impl Environment + 'static) -> Self {
        self.environment = Box::new(environment);
        self
    }

    /// Replace the interactive prompt
    pub fn with_prompt(mut self, prompt: impl CredentialPrompt + 'static) -> Self {
        self.prompt = Box::new(prompt);
        self
    }

    /// Replace the key backend chosen by the configuration
    pub fn with_key_store(mut self, key_store: impl KeyStore + 'static) -> Self {
        self.key_store = Box::new(key_store);
        self
    }

    /// Get the configuration
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Get the current state
    pub fn state(&self) -> StoreState {
        self.state
    }

    /// Where the cached pair came from, if one is cached
    pub fn source(&self) -> Option<CredentialSource> {
        self.cached.as_ref().map(|(_, source)| *source)
    }

    /// Produce a credential pair, consulting sources in order
    pub fn acquire_credentials(&mut self) -> Result<CredentialPair> {
        if let Some((pair, _)) = &self.cached {
            debug!("Using credentials cached in memory");
            return Ok(pair.clone());
        }

        self.state = StoreState::Resolving;
        let resolved = self.resolve();
        if resolved.is_err() {
            self.state = StoreState::Empty;
        }
        resolved
    }

    fn resolve(&mut self) -> Result<CredentialPair> {
        if let Some(pair) = self.load_persisted_credentials() {
            return Ok(pair);
        }

        if let Some(pair) = self.environment_credentials() {
            info!(
                identity = %pair.masked_identity(),
                var = %self.config.identity_var,
                "Using credentials from environment variables"
            );
            self.store_pair(pair.clone(), CredentialSource::Environment);
            return Ok(pair);
        }

        let pair = self.prompt_credentials()?;
        self.store_pair(pair.clone(), CredentialSource::Prompt);
        Ok(pair)
    }

    fn environment_credentials(&self) -> Option<CredentialPair> {
        let identity = self.environment.non_empty(&self.config.identity_var)?;
        let secret = self.environment.non_empty(&self.config.secret_var)?;
        CredentialPair::new(identity, secret).ok()
    }

    fn prompt_credentials(&mut self) -> Result<CredentialPair> {
        let identity = match self.prompt.read_identity(IDENTITY_PROMPT) {
            Ok(identity) => identity.trim().to_string(),
            Err(e) => {
                warn!(error = %e, "Could not read identity");
                String::new()
            }
        };
        if identity.is_empty() {
            return Err(CacheError::MissingCredentials);
        }

        let secret = match self.prompt.read_secret(SECRET_PROMPT) {
            Ok(secret) => secret,
            Err(e) => {
                warn!(error = %e, "Could not read secret");
                String::new()
            }
        };

        CredentialPair::new(identity, secret).map_err(|_| CacheError::MissingCredentials)
    }

    /// Encrypt and save a pair, and cache it in memory
    ///
    /// Never fails past this call: a failure is logged and returned as
    /// [`PersistOutcome::Failed`], the previous session record is left as it
    /// was, and the pair is cached regardless.
    pub fn persist_credentials(&mut self, pair: &CredentialPair) -> PersistOutcome {
        self.store_pair(pair.clone(), CredentialSource::Supplied)
    }

    fn store_pair(&mut self, pair: CredentialPair, source: CredentialSource) -> PersistOutcome {
        let outcome = match self.write_record(&pair) {
            Ok(()) => {
                info!(identity = %pair.masked_identity(), "Credentials saved for this session");
                PersistOutcome::Persisted
            }
            Err(e) => {
                warn!(
                    error = %e,
                    path = ?self.session_file.path(),
                    "Could not save session credentials"
                );
                PersistOutcome::Failed(e)
            }
        };

        self.cache(pair, source);
        outcome
    }

    fn write_record(&self, pair: &CredentialPair) -> Result<()> {
        let key = match self.key_store.load_or_create() {
            Ok(key) => key,
            // A broken key with no record to protect is safe to replace
            Err(CacheError::KeyError(reason)) if !self.session_file.exists() => {
                warn!(
                    backend = self.key_store.backend_name(),
                    reason = %reason,
                    "Replacing unusable session key; no session record depends on it"
                );
                self.key_store.delete()?;
                self.key_store.load_or_create()?
            }
            Err(e) => return Err(e),
        };

        // Encrypt both fields before touching the file
        let identity_ciphertext = encrypt_field(pair.identity(), &key)?;
        let secret_ciphertext = encrypt_field(pair.expose_secret(), &key)?;

        self.session_file
            .write(&SessionRecord::new(identity_ciphertext, secret_ciphertext))
    }

    /// Decrypt the persisted pair and cache it; `None` if it cannot be used
    pub fn load_persisted_credentials(&mut self) -> Option<CredentialPair> {
        match self.try_load_persisted() {
            Ok(pair) => {
                info!(
                    identity = %pair.masked_identity(),
                    "Credentials loaded from previous session"
                );
                self.cache(pair.clone(), CredentialSource::Session);
                Some(pair)
            }
            Err(failure) if failure.is_absent() => {
                debug!(path = ?self.session_file.path(), "No previous session");
                None
            }
            Err(failure) => {
                warn!(
                    error = %failure,
                    path = ?self.session_file.path(),
                    "Could not load session credentials"
                );
                None
            }
        }
    }

    /// Decrypt the persisted pair without touching the memory slot
    ///
    /// Creates the key if it is missing, so a record left behind by a deleted
    /// key fails authentication instead of matching a stale key.
    pub fn try_load_persisted(&self) -> std::result::Result<CredentialPair, LoadFailure> {
        let record = self.session_file.read()?;
        let key = self
            .key_store
            .load_or_create()
            .map_err(LoadFailure::KeyUnavailable)?;

        let identity = decrypt_field(&record.identity_ciphertext, &key).map_err(|source| {
            LoadFailure::Undecryptable {
                field: "identity",
                source,
            }
        })?;
        let secret = decrypt_field(&record.secret_ciphertext, &key).map_err(|source| {
            LoadFailure::Undecryptable {
                field: "secret",
                source,
            }
        })?;

        CredentialPair::new(identity, secret).map_err(|e| LoadFailure::Malformed(e.to_string()))
    }

    /// Delete the session record and key, and empty the memory slot
    ///
    /// Idempotent. Deletion errors are logged; the memory slot is emptied
    /// regardless. The key is kept while a record it encrypts is still on disk.
    pub fn clear_session(&mut self) {
        match self.session_file.remove() {
            Ok(_) => {
                if let Err(e) = self.key_store.delete() {
                    warn!(error = %e, backend = self.key_store.backend_name(), "Could not remove session key");
                }
            }
            Err(e) => {
                warn!(error = %e, path = ?self.session_file.path(), "Could not remove session record");
                warn!(
                    backend = self.key_store.backend_name(),
                    "Keeping session key because the record could not be removed"
                );
            }
        }

        self.cached = None;
        self.state = StoreState::Empty;
        info!("Session data cleared");
    }

    /// Report the store state and what is on disk
    pub fn status(&self) -> SessionStatus {
        let session_timestamp = self
            .session_file
            .read()
            .ok()
            .map(|record| record.timestamp);

        SessionStatus {
            state: self.state,
            source: self.source(),
            session_file: self.session_file.path().to_path_buf(),
            session_exists: self.session_file.exists(),
            session_timestamp,
            key_backend: self.key_store.backend_name(),
            key_exists: self.key_store.exists(),
        }
    }

    fn cache(&mut self, pair: CredentialPair, source: CredentialSource) {
        self.cached = Some((pair, source));
        self.state = StoreState::Cached;
    }
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("session_file", &self.session_file.path())
            .field("key_backend", &self.key_store.backend_name())
            .field("state", &self.state)
            .field("source", &self.source())
            .finish()
    }
}
