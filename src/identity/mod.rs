//! Visitor identity resolution.
//!
//! - [`preview`]: design-time / live preview detection
//! - [`resolver`]: cookie and broker identity sources behind one idempotent resolver

pub mod preview;
pub mod resolver;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque token naming a visitor.
///
/// Comes from the `BrowserId` cookie, its fallback, or a broker payload;
/// never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BrowserIdentity(String);

impl BrowserIdentity {
    /// Wrap a raw value; only the empty string is not an identity.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.is_empty() {
            None
        } else {
            Some(Self(value))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BrowserIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of one resolution attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved(BrowserIdentity),
    /// The page is a preview; nothing was read or sent.
    Preview,
    /// No identity cookie exists. Not an error.
    Missing,
}

impl Resolution {
    pub fn identity(&self) -> Option<&BrowserIdentity> {
        match self {
            Resolution::Resolved(identity) => Some(identity),
            _ => None,
        }
    }
}
