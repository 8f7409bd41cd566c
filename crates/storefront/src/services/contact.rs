//! Contact form intake.

use thiserror::Error;
use tracing::{info, instrument};

use tipsy_tank_core::{ContactStatus, Email};

use crate::gateway::{Gateway, GatewayError};
use crate::models::{ContactMessage, NewContactMessage};

/// Errors from submitting a contact message.
#[derive(Debug, Error)]
pub enum ContactError {
    #[error("failed to submit message: {0}")]
    Submit(#[from] GatewayError),
}

/// A validated contact form.
#[derive(Debug, Clone)]
pub struct ContactSubmission {
    pub name: String,
    pub email: Email,
    pub message: String,
}

/// Stores visitor messages for the team to answer.
#[derive(Clone)]
pub struct ContactIntake {
    gateway: Gateway,
}

impl ContactIntake {
    #[must_use]
    pub const fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    /// Store one message with status `new`.
    ///
    /// # Errors
    ///
    /// Returns [`ContactError::Submit`] if the record can't be created.
    #[instrument(skip(self, submission), fields(email_domain = %submission.email.domain()))]
    pub async fn submit(
        &self,
        submission: ContactSubmission,
    ) -> Result<ContactMessage, ContactError> {
        let draft = NewContactMessage {
            name: submission.name,
            email: submission.email,
            message: submission.message,
            status: ContactStatus::New,
        };
        let stored = self.gateway.create::<ContactMessage>(&draft).await?;
        info!(message_id = %stored.id, "Contact message received");
        Ok(stored)
    }
}
