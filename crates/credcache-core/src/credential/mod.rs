//! Login credential types

mod types;

pub use types::*;
