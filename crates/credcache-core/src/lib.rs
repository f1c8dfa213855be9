//! # credcache-core
//!
//! Local credential cache for long-running automation agents:
//! - Layered resolution: memory, encrypted session file, environment, interactive prompt
//! - AES-256-GCM per-field encryption of the persisted session record
//! - Key file (or OS keychain) management with zeroize-on-drop key material
//! - Explicit store objects with explicit paths, so isolated stores can coexist

pub mod config;
pub mod credential;
pub mod crypto;
pub mod error;
pub mod session;
pub mod source;
pub mod storage;
mod store;

pub use config::{KeyBackend, StoreConfig};
pub use credential::{CredentialPair, CredentialSource};
pub use crypto::{decrypt_field, encrypt_field, EncryptedData, EncryptionKey};
pub use error::{CacheError, LoadFailure, Result};
pub use session::{SessionFile, SessionRecord};
pub use source::{
    CredentialPrompt, DisabledPrompt, Environment, ProcessEnvironment, ScriptedPrompt,
    TerminalPrompt,
};
pub use storage::{KeyFile, KeyStore, KeychainKeyStore};
pub use store::{CredentialStore, PersistOutcome, SessionStatus, StoreState};
