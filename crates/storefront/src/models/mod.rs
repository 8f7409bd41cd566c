//! Entity records stored in the hosted entity store.
//!
//! Every record type implements [`crate::gateway::Entity`]; the capability
//! traits it additionally implements decide what the storefront may do with it.

pub mod cart_item;
pub mod contact_message;
pub mod product;
pub mod session;
mod timestamp;

pub use cart_item::{CartItem, CartItemPatch, NewCartItem};
pub use contact_message::{ContactMessage, NewContactMessage};
pub use product::{Product, ProductDraft};
