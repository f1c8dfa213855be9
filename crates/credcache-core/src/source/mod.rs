//! Credential sources the store consults after its own caches
//!
//! Both are capabilities injected into the store so tests and embedding
//! callers can script them.

mod env;
mod prompt;

pub use env::{Environment, ProcessEnvironment};
pub use prompt::{CredentialPrompt, DisabledPrompt, ScriptedPrompt, TerminalPrompt};
