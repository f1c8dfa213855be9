//! Key storage trait definitions

use crate::crypto::EncryptionKey;
use crate::error::Result;

/// Trait for encryption key backends
pub trait KeyStore: Send {
    /// Read the key if one has been stored
    fn load(&self) -> Result<Option<EncryptionKey>>;

    /// Read the key, generating and storing a new one if none exists
    fn load_or_create(&self) -> Result<EncryptionKey>;

    /// Remove the stored key; succeeds when there is nothing to remove
    fn delete(&self) -> Result<()>;

    /// Check if a key is currently stored
    fn exists(&self) -> bool;

    /// Get a human-readable name for this backend
    fn backend_name(&self) -> &'static str;
}
