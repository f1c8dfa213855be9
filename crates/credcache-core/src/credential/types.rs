//! Credential type definitions

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{CacheError, Result};

/// Where the cached pair came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialSource {
    /// Decrypted from the persisted session record
    Session,
    /// Read from the identity/secret environment variables
    Environment,
    /// Entered at the interactive prompt
    Prompt,
    /// Handed to the store directly by the caller
    Supplied,
}

impl std::fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Session => "session",
            Self::Environment => "environment",
            Self::Prompt => "prompt",
            Self::Supplied => "supplied",
        };
        f.write_str(name)
    }
}

/// Login identity and secret - automatically zeroed when dropped
///
/// Both fields are non-empty by construction.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct CredentialPair {
    identity: String,
    secret: String,
}

impl CredentialPair {
    /// Create a pair, rejecting empty fields
    pub fn new(identity: impl Into<String>, secret: impl Into<String>) -> Result<Self> {
        let identity = identity.into();
        let secret = secret.into();

        if identity.is_empty() {
            return Err(CacheError::IncompleteCredentials("identity"));
        }
        if secret.is_empty() {
            return Err(CacheError::IncompleteCredentials("secret"));
        }

        Ok(Self { identity, secret })
    }

    /// The login identity (e.g. an email address)
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Get the secret value (use carefully)
    pub fn expose_secret(&self) -> &str {
        &self.secret
    }

    /// Consume and return `(identity, secret)`
    pub fn into_parts(mut self) -> (String, String) {
        (
            std::mem::take(&mut self.identity),
            std::mem::take(&mut self.secret),
        )
    }

    /// Identity with everything but its first character and domain hidden
    ///
    /// `alice@example.com` becomes `a***@example.com`; identities without an
    /// `@` become `a***`.
    pub fn masked_identity(&self) -> String {
        let (local, domain) = match self.identity.split_once('@') {
            Some((local, domain)) => (local, Some(domain)),
            None => (self.identity.as_str(), None),
        };

        let first: String = local.chars().take(1).collect();
        match domain {
            Some(domain) => format!("{}***@{}", first, domain),
            None => format!("{}***", first),
        }
    }
}

impl std::fmt::Debug for CredentialPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialPair")
            .field("identity", &self.masked_identity())
            .field("secret", &"[REDACTED]")
            .finish()
    }
}
