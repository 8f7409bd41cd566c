//! Status enums for stored entities.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Triage status of a visitor's contact message.
///
/// The storefront only ever writes [`ContactStatus::New`]; the other states
/// are set by whoever answers the inbox and are accepted when reading records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ContactStatus {
    #[default]
    New,
    Read,
    Replied,
    Archived,
}

impl ContactStatus {
    /// Wire representation of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Read => "read",
            Self::Replied => "replied",
            Self::Archived => "archived",
        }
    }
}

impl fmt::Display for ContactStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
