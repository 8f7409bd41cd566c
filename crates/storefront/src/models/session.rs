//! Session-stored visitor state.

/// Session keys.
pub mod keys {
    /// Key holding the visitor's cart ownership token.
    pub const SESSION_TOKEN: &str = "tipsy_session";
}
