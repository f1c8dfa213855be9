//! AES-256-GCM authenticated encryption of session record fields
//!
//! Text format: standard base64 of `nonce || ciphertext || auth_tag`
//! - Nonce: 12 bytes (96 bits) - standard for GCM
//! - Ciphertext: same length as the plaintext
//! - Auth tag: 16 bytes (128 bits)

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use rand::RngCore;

use super::EncryptionKey;
use crate::error::{CacheError, Result};

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// Encrypted field with nonce and auth tag
#[derive(Debug, Clone)]
pub struct EncryptedData {
    /// Nonce (12 bytes for GCM)
    pub nonce: [u8; NONCE_LEN],
    /// Authentication tag (16 bytes)
    pub auth_tag: [u8; TAG_LEN],
    /// Encrypted ciphertext
    pub ciphertext: Vec<u8>,
}

impl EncryptedData {
    /// Encode as base64 of `nonce || ciphertext || tag`
    pub fn to_encoded(&self) -> String {
        let mut raw = Vec::with_capacity(NONCE_LEN + self.ciphertext.len() + TAG_LEN);
        raw.extend_from_slice(&self.nonce);
        raw.extend_from_slice(&self.ciphertext);
        raw.extend_from_slice(&self.auth_tag);
        STANDARD.encode(raw)
    }

    /// Parse the base64 text form
    pub fn from_encoded(s: &str) -> Result<Self> {
        let raw = STANDARD
            .decode(s.trim())
            .map_err(|e| CacheError::DecryptionError(format!("Invalid base64: {}", e)))?;

        if raw.len() < NONCE_LEN + TAG_LEN {
            return Err(CacheError::DecryptionError(format!(
                "Ciphertext too short: expected at least {} bytes, got {}",
                NONCE_LEN + TAG_LEN,
                raw.len()
            )));
        }

        let tag_start = raw.len() - TAG_LEN;

        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(&raw[..NONCE_LEN]);

        let mut auth_tag = [0u8; TAG_LEN];
        auth_tag.copy_from_slice(&raw[tag_start..]);

        Ok(Self {
            nonce,
            auth_tag,
            ciphertext: raw[NONCE_LEN..tag_start].to_vec(),
        })
    }
}

/// Encrypt plaintext using AES-256-GCM with a random nonce
pub fn encrypt(plaintext: &[u8], key: &EncryptionKey) -> Result<EncryptedData> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| CacheError::EncryptionError(e.to_string()))?;

    let mut nonce = [0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut nonce);

    // aes-gcm appends the auth tag to the ciphertext
    let ciphertext_with_tag = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|e| CacheError::EncryptionError(e.to_string()))?;

    if ciphertext_with_tag.len() < TAG_LEN {
        return Err(CacheError::EncryptionError(
            "Ciphertext too short".to_string(),
        ));
    }

    let tag_start = ciphertext_with_tag.len() - TAG_LEN;
    let mut auth_tag = [0u8; TAG_LEN];
    auth_tag.copy_from_slice(&ciphertext_with_tag[tag_start..]);

    Ok(EncryptedData {
        nonce,
        auth_tag,
        ciphertext: ciphertext_with_tag[..tag_start].to_vec(),
    })
}

/// Decrypt and authenticate ciphertext using AES-256-GCM
pub fn decrypt(encrypted: &EncryptedData, key: &EncryptionKey) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| CacheError::DecryptionError(e.to_string()))?;

    let mut ciphertext_with_tag = encrypted.ciphertext.clone();
    ciphertext_with_tag.extend_from_slice(&encrypted.auth_tag);

    cipher
        .decrypt(Nonce::from_slice(&encrypted.nonce), ciphertext_with_tag.as_slice())
        .map_err(|e| CacheError::DecryptionError(e.to_string()))
}

/// Encrypt a record field and return its text form
pub fn encrypt_field(plaintext: &str, key: &EncryptionKey) -> Result<String> {
    Ok(encrypt(plaintext.as_bytes(), key)?.to_encoded())
}

/// Decrypt a record field from its text form
pub fn decrypt_field(encoded: &str, key: &EncryptionKey) -> Result<String> {
    let encrypted = EncryptedData::from_encoded(encoded)?;
    let plaintext = decrypt(&encrypted, key)?;
    String::from_utf8(plaintext)
        .map_err(|e| CacheError::DecryptionError(format!("Invalid UTF-8: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let key = EncryptionKey::generate();
        let encrypted = encrypt(b"Hello, World!", &key).unwrap();
        let decrypted = decrypt(&encrypted, &key).unwrap();

        assert_eq!(decrypted, b"Hello, World!");
    }

    #[test]
    fn test_field_roundtrip() {
        let key = EncryptionKey::generate();
        let encoded = encrypt_field("p@ss w0rd ñ", &key).unwrap();

        assert_eq!(decrypt_field(&encoded, &key).unwrap(), "p@ss w0rd ñ");
    }

    #[test]
    fn test_encoded_form_is_base64_text() {
        let key = EncryptionKey::generate();
        let encoded = encrypt_field("a@x.com", &key).unwrap();

        assert!(encoded
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '/' || c == '='));
        let raw = STANDARD.decode(&encoded).unwrap();
        assert_eq!(raw.len(), NONCE_LEN + "a@x.com".len() + TAG_LEN);
    }

    #[test]
    fn test_different_nonces_produce_different_ciphertext() {
        let key = EncryptionKey::generate();

        let first = encrypt(b"same plaintext", &key).unwrap();
        let second = encrypt(b"same plaintext", &key).unwrap();

        assert_ne!(first.nonce, second.nonce);
        assert_ne!(first.ciphertext, second.ciphertext);
    }

    #[test]
    fn test_wrong_key_fails_decryption() {
        let encoded = encrypt_field("secret", &EncryptionKey::generate()).unwrap();

        let result = decrypt_field(&encoded, &EncryptionKey::generate());
        assert!(matches!(result, Err(CacheError::DecryptionError(_))));
    }

    #[test]
    fn test_every_flipped_byte_is_detected() {
        let key = EncryptionKey::generate();
        let encoded = encrypt_field("p@ss1", &key).unwrap();
        let raw = STANDARD.decode(&encoded).unwrap();

        for i in 0..raw.len() {
            let mut tampered = raw.clone();
            tampered[i] ^= 0x01;
            let result = decrypt_field(&STANDARD.encode(&tampered), &key);
            assert!(result.is_err(), "flip at byte {} went undetected", i);
        }
    }

    #[test]
    fn test_invalid_encodings() {
        let key = EncryptionKey::generate();

        assert!(decrypt_field("", &key).is_err());
        assert!(decrypt_field("not base64 at all!", &key).is_err());
        assert!(decrypt_field(&STANDARD.encode([0u8; 20]), &key).is_err());
    }
}
