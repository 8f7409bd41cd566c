//! Contact form route handlers.
//!
//! Messages are stored in the entity store with status `new`. A failed
//! submission re-renders the form with what the visitor typed.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::{error, instrument};

use tipsy_tank_core::Email;

use crate::services::ContactSubmission;
use crate::state::AppState;

/// Contact form data.
#[derive(Debug, Default, Deserialize)]
pub struct ContactForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub message: String,
}

/// Contact page template.
#[derive(Template, WebTemplate)]
#[template(path = "contact/form.html")]
pub struct ContactFormTemplate {
    pub form: ContactForm,
    pub error: Option<String>,
}

/// Message received template.
#[derive(Template, WebTemplate)]
#[template(path = "contact/thanks.html")]
pub struct ContactThanksTemplate {
    pub name: String,
}

/// Check the form; the error is the message shown above it.
fn validate(form: &ContactForm) -> Result<ContactSubmission, &'static str> {
    let name = form.name.trim();
    let message = form.message.trim();
    if name.is_empty() || form.email.trim().is_empty() || message.is_empty() {
        return Err("Please fill in all fields.");
    }

    let email = Email::parse(&form.email).map_err(|_| "Please enter a valid email address.")?;

    Ok(ContactSubmission {
        name: name.to_string(),
        email,
        message: message.to_string(),
    })
}

/// Display the contact form.
#[instrument]
pub async fn show() -> ContactFormTemplate {
    ContactFormTemplate {
        form: ContactForm::default(),
        error: None,
    }
}

/// Submit a contact message.
#[instrument(skip(state, form))]
pub async fn submit(State(state): State<AppState>, Form(form): Form<ContactForm>) -> Response {
    let submission = match validate(&form) {
        Ok(submission) => submission,
        Err(message) => {
            return (
                StatusCode::BAD_REQUEST,
                ContactFormTemplate {
                    form,
                    error: Some(message.to_string()),
                },
            )
                .into_response();
        }
    };

    let name = submission.name.clone();
    match state.contact().submit(submission).await {
        Ok(_) => ContactThanksTemplate { name }.into_response(),
        Err(e) => {
            let event_id = sentry::capture_error(&e);
            error!(error = %e, sentry_event_id = %event_id, "Contact submission failed");
            (
                StatusCode::BAD_GATEWAY,
                ContactFormTemplate {
                    form,
                    error: Some("Something went wrong. Please try again.".to_string()),
                },
            )
                .into_response()
        }
    }
}
