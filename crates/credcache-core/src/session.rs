//! Persisted session record
//!
//! The record holds the two independently encrypted credential fields and the
//! time it was written. It is plain JSON so it survives any ciphertext bytes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{LoadFailure, Result};

/// Encrypted credential pair as stored on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Base64 AES-256-GCM ciphertext of the identity
    pub identity_ciphertext: String,
    /// Base64 AES-256-GCM ciphertext of the secret
    pub secret_ciphertext: String,
    /// RFC 3339 time the record was written
    pub timestamp: String,
}

impl SessionRecord {
    /// Create a record stamped with the current time
    pub fn new(identity_ciphertext: String, secret_ciphertext: String) -> Self {
        Self {
            identity_ciphertext,
            secret_ciphertext,
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    /// Parse the timestamp; `None` if it is not RFC 3339
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.timestamp)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

/// Session record file manager
#[derive(Debug, Clone)]
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    /// Create a session file manager for the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the session file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if a session record is present
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read the record, classifying absent and malformed files
    pub fn read(&self) -> std::result::Result<SessionRecord, LoadFailure> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(LoadFailure::Absent),
            Err(e) if e.kind() == ErrorKind::InvalidData => {
                return Err(LoadFailure::Malformed("not UTF-8".to_string()))
            }
            Err(e) => return Err(LoadFailure::Io(e)),
        };

        serde_json::from_str(&contents).map_err(|e| LoadFailure::Malformed(e.to_string()))
    }

    /// Write the record, replacing any previous one
    ///
    /// Writes to a sibling temp file first, so a failed write leaves the
    /// previous record in place.
    pub fn write(&self, record: &SessionRecord) -> Result<()> {
        let contents = serde_json::to_string_pretty(record)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let temp_path = self.temp_path();
        if let Err(e) = self.write_temp(&temp_path, contents.as_bytes()) {
            let _ = std::fs::remove_file(&temp_path);
            return Err(e);
        }

        if let Err(e) = std::fs::rename(&temp_path, &self.path) {
            let _ = std::fs::remove_file(&temp_path);
            return Err(e.into());
        }

        debug!(path = ?self.path, "Saved session record");
        Ok(())
    }

    /// Delete the record; returns whether a file was removed
    pub fn remove(&self) -> Result<bool> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = ?self.path, "Removed session record");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Create the temp file owner-only (0600 on unix) and fill it
    fn write_temp(&self, temp_path: &Path, contents: &[u8]) -> Result<()> {
        // A stale temp file would keep its old permissions
        match std::fs::remove_file(temp_path) {
            Err(e) if e.kind() != ErrorKind::NotFound => return Err(e.into()),
            _ => {}
        }

        let mut opts = OpenOptions::new();
        opts.create_new(true).write(true);

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            opts.mode(0o600);
        }

        let mut file = opts.open(temp_path)?;
        file.write_all(contents)?;
        file.sync_all()?;
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record() -> SessionRecord {
        SessionRecord::new("aWRlbnRpdHk=".to_string(), "c2VjcmV0".to_string())
    }

    #[test]
    fn test_write_and_read() {
        let temp_dir = TempDir::new().unwrap();
        let file = SessionFile::new(temp_dir.path().join(".facebook_session"));

        let written = record();
        file.write(&written).unwrap();

        assert!(file.exists());
        assert_eq!(file.read().unwrap(), written);
    }

    #[test]
    fn test_json_field_names() {
        let temp_dir = TempDir::new().unwrap();
        let file = SessionFile::new(temp_dir.path().join(".facebook_session"));
        file.write(&record()).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(file.path()).unwrap()).unwrap();
        assert!(value.get("identity_ciphertext").is_some());
        assert!(value.get("secret_ciphertext").is_some());
        assert!(value.get("timestamp").is_some());
    }

    #[test]
    fn test_read_absent() {
        let temp_dir = TempDir::new().unwrap();
        let file = SessionFile::new(temp_dir.path().join("missing"));

        assert!(file.read().unwrap_err().is_absent());
    }

    #[test]
    fn test_read_truncated_is_malformed() {
        let temp_dir = TempDir::new().unwrap();
        let file = SessionFile::new(temp_dir.path().join(".facebook_session"));
        file.write(&record()).unwrap();

        let contents = std::fs::read_to_string(file.path()).unwrap();
        std::fs::write(file.path(), &contents[..contents.len() / 2]).unwrap();

        assert!(matches!(file.read(), Err(LoadFailure::Malformed(_))));
    }

    #[test]
    fn test_read_missing_field_is_malformed() {
        let temp_dir = TempDir::new().unwrap();
        let file = SessionFile::new(temp_dir.path().join(".facebook_session"));
        std::fs::write(file.path(), r#"{"identity_ciphertext": "abc"}"#).unwrap();

        assert!(matches!(file.read(), Err(LoadFailure::Malformed(_))));
    }

    #[test]
    fn test_read_binary_garbage_is_malformed() {
        let temp_dir = TempDir::new().unwrap();
        let file = SessionFile::new(temp_dir.path().join(".facebook_session"));
        std::fs::write(file.path(), [0xff, 0xfe, 0x00, 0x81]).unwrap();

        assert!(matches!(file.read(), Err(LoadFailure::Malformed(_))));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let file = SessionFile::new(temp_dir.path().join(".facebook_session"));
        file.write(&record()).unwrap();

        assert!(file.remove().unwrap());
        assert!(!file.remove().unwrap());
        assert!(!file.exists());
    }

    #[test]
    fn test_no_temp_file_left_behind() {
        let temp_dir = TempDir::new().unwrap();
        let file = SessionFile::new(temp_dir.path().join(".facebook_session"));
        file.write(&record()).unwrap();

        let entries: Vec<_> = std::fs::read_dir(temp_dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_record_is_owner_only_despite_stale_temp() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let file = SessionFile::new(temp_dir.path().join(".facebook_session"));

        // World-readable leftover from an interrupted write
        let stale = file.temp_path();
        std::fs::write(&stale, "stale").unwrap();
        std::fs::set_permissions(&stale, std::fs::Permissions::from_mode(0o644)).unwrap();

        file.write(&record()).unwrap();

        let mode = std::fs::metadata(file.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert!(!stale.exists());
        assert_eq!(file.read().unwrap().secret_ciphertext, "c2VjcmV0");
    }

    #[test]
    fn test_timestamp_parses() {
        let record = record();
        let created = record.created_at().unwrap();
        assert!((Utc::now() - created).num_seconds() < 60);

        let legacy = SessionRecord {
            timestamp: "0".to_string(),
            ..record
        };
        assert!(legacy.created_at().is_none());
    }
}
