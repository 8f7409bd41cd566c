//! Anonymous visitor session token.

use core::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque identifier correlating an anonymous visitor with their cart lines.
///
/// Generated once per browser (UUID v4), persisted in the visitor's session,
/// and never rotated. Every cart record carries the token of its owner.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    /// Generate a fresh random token.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wrap an existing token value.
    ///
    /// Returns `None` for blank input, which is treated as "no token".
    #[must_use]
    pub fn from_existing(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            None
        } else {
            Some(Self(value))
        }
    }

    /// The token as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SessionToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
