//! Cryptographic primitives for the session record
//!
//! This module provides:
//! - AES-256-GCM authenticated encryption of individual record fields
//! - Base64 text encoding of `nonce || ciphertext || tag`
//! - Zeroize-on-drop key material

mod encryption;
mod secure_memory;

pub use encryption::{decrypt, decrypt_field, encrypt, encrypt_field, EncryptedData};
pub use secure_memory::{EncryptionKey, KEY_LEN};
