//! Environment variable lookup

use std::collections::HashMap;

/// Read access to environment-style variables
pub trait Environment: Send {
    /// Value of `name`, or `None` if unset or not valid unicode
    fn var(&self, name: &str) -> Option<String>;

    /// Value of `name` only if it is set and non-empty
    fn non_empty(&self, name: &str) -> Option<String> {
        self.var(name).filter(|value| !value.is_empty())
    }
}

/// The real process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnvironment;

impl Environment for ProcessEnvironment {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl Environment for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

impl<E: Environment + ?Sized> Environment for Box<E> {
    fn var(&self, name: &str) -> Option<String> {
        (**self).var(name)
    }
}
