//! Tipsy Tank Core - Shared types library.
//!
//! This crate provides common types used across all Tipsy Tank components:
//! - `storefront` - Public-facing shop for the DIY bottle-aquarium kits
//! - `cli` - Command-line tools for migrations and catalog seeding
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no HTTP clients.
//! This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, emails, session
//!   tokens, and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
