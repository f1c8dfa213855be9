//! Key material with automatic zeroization

use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Length of the symmetric key in bytes (AES-256)
pub const KEY_LEN: usize = 32;

/// Session encryption key - automatically zeroed when dropped
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct EncryptionKey {
    key: [u8; KEY_LEN],
}

impl EncryptionKey {
    /// Create a key from raw bytes
    pub fn new(key: [u8; KEY_LEN]) -> Self {
        Self { key }
    }

    /// Generate a fresh random key from the OS RNG
    pub fn generate() -> Self {
        let mut key = [0u8; KEY_LEN];
        rand::rngs::OsRng.fill_bytes(&mut key);
        Self { key }
    }

    /// Get the key bytes (use carefully - avoid copying)
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.key
    }

    /// Create from a slice (must be exactly 32 bytes)
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        if slice.len() != KEY_LEN {
            return None;
        }
        let mut key = [0u8; KEY_LEN];
        key.copy_from_slice(slice);
        Some(Self { key })
    }
}

impl Clone for EncryptionKey {
    fn clone(&self) -> Self {
        Self { key: self.key }
    }
}

impl std::fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_from_slice() {
        let bytes = [42u8; KEY_LEN];
        let key = EncryptionKey::from_slice(&bytes).unwrap();
        assert_eq!(key.as_bytes(), &bytes);
    }

    #[test]
    fn test_key_from_invalid_slice() {
        assert!(EncryptionKey::from_slice(&[42u8; 16]).is_none());
        assert!(EncryptionKey::from_slice(&[]).is_none());
    }

    #[test]
    fn test_generated_keys_differ() {
        let a = EncryptionKey::generate();
        let b = EncryptionKey::generate();
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn test_debug_redacted() {
        let key = EncryptionKey::new([7u8; KEY_LEN]);
        let debug = format!("{:?}", key);
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains('7'));
    }
}
