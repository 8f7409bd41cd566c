//! Business logic services for storefront.
//!
//! # Services
//!
//! - `session` - Anonymous visitor token (get-or-create)
//! - `cart` - Cart lines, merge-on-add, quantities and totals
//! - `notifier` - Cart change broadcast feeding the header badge
//! - `catalog` - Cached product reads and derived views
//! - `contact` - Contact form intake

pub mod cart;
pub mod catalog;
pub mod contact;
pub mod notifier;
pub mod session;

pub use cart::{CartError, CartService, CartTotals, CartView, compute_totals};
pub use catalog::{CatalogError, CatalogReader, CategoryFilter};
pub use contact::{ContactError, ContactIntake, ContactSubmission};
pub use notifier::{CartChanged, CartNotifier, CartSubscription};
