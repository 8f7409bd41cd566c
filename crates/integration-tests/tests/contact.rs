//! Integration tests for the contact form.

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;

use tipsy_tank_core::ContactStatus;
use tipsy_tank_integration_tests::TestApp;

#[tokio::test]
async fn test_contact_form_renders() {
    let app = TestApp::spawn().await;

    let resp = app.get("/contact").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await.unwrap().contains("name=\"message\""));
}

#[tokio::test]
async fn test_submit_stores_new_message() {
    let app = TestApp::spawn().await;

    let resp = app
        .post_form(
            "/contact",
            &[
                ("name", "Robin"),
                ("email", "Robin@Example.com"),
                ("message", "Does the Deluxe Kit fit a magnum bottle?"),
            ],
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.unwrap();
    assert!(body.contains("Message sent!"));
    assert!(body.contains("Thanks, Robin."));

    let messages = app.contact_messages().await;
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].email, "robin@example.com");
    assert_eq!(messages[0].status, ContactStatus::New);
}

#[tokio::test]
async fn test_submit_requires_all_fields() {
    let app = TestApp::spawn().await;

    let resp = app
        .post_form(
            "/contact",
            &[("name", "Robin"), ("email", "robin@example.com"), ("message", "  ")],
        )
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = resp.text().await.unwrap();
    assert!(body.contains("Please fill in all fields."));
    assert!(body.contains("value=\"Robin\""));
    assert!(app.contact_messages().await.is_empty());
}

#[tokio::test]
async fn test_submit_rejects_invalid_email() {
    let app = TestApp::spawn().await;

    let resp = app
        .post_form(
            "/contact",
            &[("name", "Robin"), ("email", "robin-at-example"), ("message", "Hi")],
        )
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(
        resp.text()
            .await
            .unwrap()
            .contains("Please enter a valid email address.")
    );
    assert!(app.contact_messages().await.is_empty());
}

#[tokio::test]
async fn test_submit_failure_keeps_form_values() {
    let app = TestApp::spawn().await;
    app.set_store_unavailable(true).await;

    let resp = app
        .post_form(
            "/contact",
            &[
                ("name", "Robin"),
                ("email", "robin@example.com"),
                ("message", "Hello there"),
            ],
        )
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    let body = resp.text().await.unwrap();
    assert!(body.contains("Something went wrong. Please try again."));
    assert!(body.contains("Hello there"));

    app.set_store_unavailable(false).await;
    assert!(app.contact_messages().await.is_empty());
}
