//! Interactive credential prompts

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

/// Reads an identity (echoed) and a secret (masked) from a human
pub trait CredentialPrompt: Send {
    /// Read the identity as visible input
    fn read_identity(&mut self, prompt: &str) -> io::Result<String>;

    /// Read the secret without echoing it
    fn read_secret(&mut self, prompt: &str) -> io::Result<String>;
}

/// Prompt on the controlling terminal
///
/// The identity is read from stdin; the secret goes through `rpassword`,
/// which disables echo on the tty.
#[derive(Debug, Clone, Default)]
pub struct TerminalPrompt {
    header: Option<String>,
}

impl TerminalPrompt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Line printed to stderr before the first question
    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = Some(header.into());
        self
    }
}

impl CredentialPrompt for TerminalPrompt {
    fn read_identity(&mut self, prompt: &str) -> io::Result<String> {
        let mut stderr = io::stderr();
        if let Some(header) = &self.header {
            writeln!(stderr, "\n{}", header)?;
        }
        write!(stderr, "{}", prompt)?;
        stderr.flush()?;

        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        Ok(line)
    }

    fn read_secret(&mut self, prompt: &str) -> io::Result<String> {
        rpassword::prompt_password(prompt)
    }
}

/// Replays queued answers; an exhausted queue yields empty input
#[derive(Debug, Clone, Default)]
pub struct ScriptedPrompt {
    identities: VecDeque<String>,
    secrets: VecDeque<String>,
}

impl ScriptedPrompt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one identity/secret answer pair
    pub fn answer(mut self, identity: impl Into<String>, secret: impl Into<String>) -> Self {
        self.identities.push_back(identity.into());
        self.secrets.push_back(secret.into());
        self
    }
}

impl CredentialPrompt for ScriptedPrompt {
    fn read_identity(&mut self, _prompt: &str) -> io::Result<String> {
        Ok(self.identities.pop_front().unwrap_or_default())
    }

    fn read_secret(&mut self, _prompt: &str) -> io::Result<String> {
        Ok(self.secrets.pop_front().unwrap_or_default())
    }
}

/// Never asks; for callers that must not block on a human
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledPrompt;

impl CredentialPrompt for DisabledPrompt {
    fn read_identity(&mut self, _prompt: &str) -> io::Result<String> {
        Ok(String::new())
    }

    fn read_secret(&mut self, _prompt: &str) -> io::Result<String> {
        Ok(String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_prompt_replays_in_order() {
        let mut prompt = ScriptedPrompt::new()
            .answer("first@x.com", "one")
            .answer("second@x.com", "two");

        assert_eq!(prompt.read_identity("Email: ").unwrap(), "first@x.com");
        assert_eq!(prompt.read_secret("Password: ").unwrap(), "one");
        assert_eq!(prompt.read_identity("Email: ").unwrap(), "second@x.com");
        assert_eq!(prompt.read_secret("Password: ").unwrap(), "two");
        assert_eq!(prompt.read_identity("Email: ").unwrap(), "");
    }

    #[test]
    fn test_disabled_prompt_is_empty() {
        let mut prompt = DisabledPrompt;
        assert!(prompt.read_identity("Email: ").unwrap().is_empty());
        assert!(prompt.read_secret("Password: ").unwrap().is_empty());
    }
}
