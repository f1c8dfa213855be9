//! Key file backend
//!
//! Stores the raw 32 key bytes in a file with no passphrase of its own.
//! Anyone who can read both this file and the session record can recover the
//! secret; on unix the file is created owner-only (0600).

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use super::KeyStore;
use crate::crypto::{EncryptionKey, KEY_LEN};
use crate::error::{CacheError, Result};

/// Attempts made to read a key file that another process is still writing
const SETTLE_ATTEMPTS: u32 = 5;
/// Pause between those attempts
const SETTLE_DELAY: Duration = Duration::from_millis(20);

/// Key stored as raw bytes in a local file
#[derive(Debug, Clone)]
pub struct KeyFile {
    path: PathBuf,
}

impl KeyFile {
    /// Create a key file backend for the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the key file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_key(&self) -> Result<EncryptionKey> {
        let bytes = std::fs::read(&self.path)?;
        EncryptionKey::from_slice(&bytes).ok_or_else(|| {
            CacheError::KeyError(format!(
                "{:?} holds {} bytes, expected {}",
                self.path,
                bytes.len(),
                KEY_LEN
            ))
        })
    }

    /// Read the key, giving a concurrent creator time to finish writing
    ///
    /// A short file is retried a few times before it is reported as a
    /// `KeyError`; a missing file is returned as `IoError(NotFound)` at once.
    fn read_settled_key(&self) -> Result<EncryptionKey> {
        let mut attempt = 1;
        loop {
            match self.read_key() {
                Err(CacheError::KeyError(_)) if attempt < SETTLE_ATTEMPTS => {
                    debug!(path = ?self.path, attempt, "Key file incomplete, retrying");
                    std::thread::sleep(SETTLE_DELAY);
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    /// Write a fresh key, refusing to replace an existing file
    fn create_key(&self) -> Result<Option<EncryptionKey>> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let mut opts = OpenOptions::new();
        opts.create_new(true).write(true);

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            opts.mode(0o600);
        }

        let mut file = match opts.open(&self.path) {
            Ok(file) => file,
            // Another process created it first; use theirs
            Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let key = EncryptionKey::generate();
        file.write_all(key.as_bytes())?;
        file.sync_all()?;

        info!(path = ?self.path, "Generated new session key");
        Ok(Some(key))
    }
}

impl KeyStore for KeyFile {
    fn load(&self) -> Result<Option<EncryptionKey>> {
        match self.read_key() {
            Ok(key) => Ok(Some(key)),
            Err(CacheError::IoError(e)) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn load_or_create(&self) -> Result<EncryptionKey> {
        match self.read_settled_key() {
            Ok(key) => {
                debug!(path = ?self.path, "Loaded session key");
                return Ok(key);
            }
            Err(CacheError::IoError(e)) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }

        match self.create_key()? {
            Some(key) => Ok(key),
            None => self.read_settled_key(),
        }
    }

    fn delete(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = ?self.path, "Deleted session key");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn exists(&self) -> bool {
        self.path.exists()
    }

    fn backend_name(&self) -> &'static str {
        "Key File"
    }
}
