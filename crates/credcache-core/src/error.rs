//! Error types for credcache-core

use thiserror::Error;

/// Result type alias for credential cache operations
pub type Result<T> = std::result::Result<T, CacheError>;

/// Credential cache error types
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("No valid credentials provided")]
    MissingCredentials,

    #[error("Incomplete credentials: {0} is empty")]
    IncompleteCredentials(&'static str),

    #[error("Encryption failed: {0}")]
    EncryptionError(String),

    #[error("Decryption failed: {0}")]
    DecryptionError(String),

    #[error("Invalid key material: {0}")]
    KeyError(String),

    #[error("Keychain error: {0}")]
    KeychainError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Why a persisted session could not be reused
///
/// Every variant is absorbed by the store and turned into "not available";
/// the classification exists for diagnostics and tests.
#[derive(Error, Debug)]
pub enum LoadFailure {
    #[error("no session record present")]
    Absent,

    #[error("malformed session record: {0}")]
    Malformed(String),

    #[error("encryption key unavailable: {0}")]
    KeyUnavailable(#[source] CacheError),

    #[error("{field} field could not be decrypted: {source}")]
    Undecryptable {
        field: &'static str,
        #[source]
        source: CacheError,
    },

    #[error("failed to read session record: {0}")]
    Io(#[from] std::io::Error),
}

impl LoadFailure {
    /// Absence is the expected first-run case and is not worth a warning
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}
