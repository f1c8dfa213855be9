//! Storage backends for the session encryption key
//!
//! This module provides two backends:
//! 1. Key file next to the session record (default)
//! 2. OS keychain

mod key_file;
mod keychain;
mod traits;

pub use key_file::KeyFile;
pub use keychain::{KeychainKeyStore, DEFAULT_SERVICE as DEFAULT_KEYCHAIN_SERVICE};
pub use traits::KeyStore;
