//! Anonymous visitor identity.
//!
//! A visitor is identified by a [`SessionToken`] kept in their session under
//! [`keys::SESSION_TOKEN`]. The token is created the first time a cart
//! operation needs it and is never rotated.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;
use tower_sessions::Session;
use tracing::warn;

use tipsy_tank_core::SessionToken;

use crate::models::session::keys;

/// A persisted client-state slot could not be read or written.
#[derive(Debug, Error)]
#[error("session store error: {0}")]
pub struct TokenStoreError(String);

/// Somewhere a visitor's token survives between requests.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Read the raw persisted value, if any.
    async fn load_token(&self) -> Result<Option<String>, TokenStoreError>;

    /// Persist `token`.
    async fn save_token(&self, token: &SessionToken) -> Result<(), TokenStoreError>;
}

#[async_trait]
impl TokenStore for Session {
    async fn load_token(&self) -> Result<Option<String>, TokenStoreError> {
        self.get::<String>(keys::SESSION_TOKEN)
            .await
            .map_err(|e| TokenStoreError(e.to_string()))
    }

    async fn save_token(&self, token: &SessionToken) -> Result<(), TokenStoreError> {
        self.insert(keys::SESSION_TOKEN, token.as_str())
            .await
            .map_err(|e| TokenStoreError(e.to_string()))
    }
}

/// In-process token slot, one per simulated visitor.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    value: Mutex<Option<String>>,
    fail_writes: AtomicBool,
}

impl MemoryTokenStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn load_token(&self) -> Result<Option<String>, TokenStoreError> {
        Ok(self.value.lock().await.clone())
    }

    async fn save_token(&self, token: &SessionToken) -> Result<(), TokenStoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(TokenStoreError("writes disabled".to_string()));
        }
        *self.value.lock().await = Some(token.as_str().to_string());
        Ok(())
    }
}

/// The visitor's token, if one was ever persisted.
///
/// Read paths use this so that merely viewing a page doesn't mint a token.
pub async fn existing_session_token<S: TokenStore + ?Sized>(store: &S) -> Option<SessionToken> {
    match store.load_token().await {
        Ok(value) => value.and_then(SessionToken::from_existing),
        Err(e) => {
            warn!(error = %e, "Failed to read session token");
            None
        }
    }
}

/// Return the visitor's token, creating and persisting one if absent.
///
/// If the store can't be written the fresh token is still returned; the
/// visitor then gets a new token (and an empty cart) on their next request.
pub async fn get_or_create_session_token<S: TokenStore + ?Sized>(store: &S) -> SessionToken {
    if let Some(token) = existing_session_token(store).await {
        return token;
    }

    let token = SessionToken::generate();
    if let Err(e) = store.save_token(&token).await {
        warn!(error = %e, "Failed to persist new session token");
    }
    token
}
