//! Portal credential.
//!
//! The token is passed verbatim as the `Authorization` header. It never
//! appears in `Debug` output or logs.

use mx_common::{Error, Result};
use std::fmt;

/// Opaque authorization token.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Credential(token.into())
    }

    /// Credential from an optional raw value, rejecting blank tokens.
    pub fn from_option(token: Option<String>) -> Result<Self> {
        match token {
            Some(t) if !t.trim().is_empty() => Ok(Credential(t.trim().to_string())),
            _ => Err(Error::MissingCredential),
        }
    }

    /// Raw header value.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential(<redacted, {} chars>)", self.0.len())
    }
}
