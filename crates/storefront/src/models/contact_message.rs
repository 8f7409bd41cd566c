//! Contact form messages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tipsy_tank_core::{ContactMessageId, ContactStatus, Email};

use crate::gateway::{Creatable, Entity};
use crate::models::timestamp::optional_timestamp;

/// A stored visitor message. Create-only from the storefront.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactMessage {
    pub id: ContactMessageId,
    pub name: String,
    /// Kept as a plain string; records written elsewhere aren't re-validated.
    pub email: String,
    pub message: String,
    #[serde(default)]
    pub status: ContactStatus,
    #[serde(default, deserialize_with = "optional_timestamp")]
    pub created_date: Option<DateTime<Utc>>,
}

impl Entity for ContactMessage {
    const NAME: &'static str = "ContactMessage";
    type Id = ContactMessageId;

    fn id(&self) -> &ContactMessageId {
        &self.id
    }
}

impl Creatable for ContactMessage {
    type Draft = NewContactMessage;
}

/// Fields for a new contact message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewContactMessage {
    pub name: String,
    pub email: Email,
    pub message: String,
    pub status: ContactStatus,
}
