//! Cart aggregate: one visitor's line items and their totals.
//!
//! # Rules
//!
//! - At most one line per (session, product); re-adding increments it
//! - A stored quantity is always positive; setting zero or less deletes the line
//! - A line is only touched after confirming it belongs to the caller's token
//! - Totals are derived on every read, never stored
//!
//! Mutations for the same token are serialized inside this process. Two
//! storefront processes can still interleave a read-modify-write on the same
//! line; the entity API offers no conditional update to prevent that.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

use tipsy_tank_core::{CartItemId, Price, SessionToken};

use crate::gateway::{Filter, Gateway, GatewayError};
use crate::models::{CartItem, CartItemPatch, NewCartItem, Product};
use crate::services::notifier::CartNotifier;

/// Subtotals strictly above this ship free.
pub const FREE_SHIPPING_THRESHOLD: Price = Price::from_cents(7500);

/// Shipping charged at or below the threshold.
pub const FLAT_SHIPPING_FEE: Price = Price::from_cents(999);

/// Idle per-session locks are dropped after this long.
const LOCK_IDLE: Duration = Duration::from_secs(300);

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// Reading the cart failed.
    #[error("failed to load cart: {0}")]
    Read(#[source] GatewayError),

    /// Creating, updating or deleting a line failed.
    #[error("failed to update cart: {0}")]
    Write(#[source] GatewayError),

    /// The line doesn't exist or belongs to another session.
    #[error("cart line not found: {0}")]
    LineNotFound(CartItemId),

    /// The requested quantity can't be stored.
    #[error("invalid quantity: {0}")]
    InvalidQuantity(i64),
}

/// Derived money figures for a set of lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartTotals {
    pub subtotal: Price,
    pub shipping: Price,
    pub total: Price,
    /// Units across all lines (header badge).
    pub item_count: u32,
}

impl CartTotals {
    #[must_use]
    pub fn is_free_shipping(&self) -> bool {
        self.shipping.is_zero()
    }

    /// How much more to spend before shipping becomes free.
    ///
    /// `None` once the subtotal reaches the threshold.
    #[must_use]
    pub fn free_shipping_remaining(&self) -> Option<Price> {
        (self.subtotal < FREE_SHIPPING_THRESHOLD)
            .then(|| FREE_SHIPPING_THRESHOLD.saturating_sub(self.subtotal))
    }
}

/// Compute subtotal, shipping and total for `items`.
#[must_use]
pub fn compute_totals(items: &[CartItem]) -> CartTotals {
    let subtotal: Price = items.iter().map(CartItem::line_total).sum();
    let shipping = if subtotal > FREE_SHIPPING_THRESHOLD {
        Price::ZERO
    } else {
        FLAT_SHIPPING_FEE
    };
    let item_count = items
        .iter()
        .fold(0u32, |count, item| count.saturating_add(item.quantity));

    CartTotals {
        subtotal,
        shipping,
        total: subtotal + shipping,
        item_count,
    }
}

/// What the cart page and fragments render.
#[derive(Debug, Clone)]
pub struct CartView {
    pub items: Vec<CartItem>,
    pub totals: CartTotals,
    /// The read failed and the view shows an empty cart instead.
    pub degraded: bool,
}

/// Cart operations for anonymous visitors.
#[derive(Clone)]
pub struct CartService {
    gateway: Gateway,
    notifier: CartNotifier,
    locks: Cache<SessionToken, Arc<Mutex<()>>>,
}

impl CartService {
    #[must_use]
    pub fn new(gateway: Gateway, notifier: CartNotifier) -> Self {
        let locks = Cache::builder()
            .max_capacity(10_000)
            .time_to_idle(LOCK_IDLE)
            .build();
        Self {
            gateway,
            notifier,
            locks,
        }
    }

    async fn session_lock(&self, token: &SessionToken) -> Arc<Mutex<()>> {
        self.locks
            .get_with(token.clone(), async { Arc::new(Mutex::new(())) })
            .await
    }

    fn session_filter(token: &SessionToken) -> Filter {
        Filter::new().eq("session_id", token.as_str())
    }

    /// Add one unit of `product`: create a line or increment the existing one.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Write`] if any gateway call fails.
    #[instrument(skip(self, token, product), fields(session = %token, product_id = %product.id))]
    pub async fn add_or_increment(
        &self,
        token: &SessionToken,
        product: &Product,
    ) -> Result<CartItem, CartError> {
        let lock = self.session_lock(token).await;
        let _guard = lock.lock().await;

        let filter = Self::session_filter(token).eq("product_id", product.id.as_str());
        let existing: Vec<CartItem> = self
            .gateway
            .filter(&filter)
            .await
            .map_err(CartError::Write)?;

        let item = if let Some(line) = existing.first() {
            let patch = CartItemPatch {
                quantity: line.quantity.saturating_add(1),
            };
            self.gateway
                .update::<CartItem>(&line.id, &patch)
                .await
                .map_err(CartError::Write)?
        } else {
            let draft = NewCartItem {
                product_id: product.id.clone(),
                product_name: product.name.clone(),
                price: product.price,
                quantity: 1,
                session_id: token.clone(),
            };
            self.gateway
                .create::<CartItem>(&draft)
                .await
                .map_err(CartError::Write)?
        };

        info!(line_id = %item.id, quantity = item.quantity, "Added to cart");
        self.notifier.notify(token);
        Ok(item)
    }

    /// Find `line_id` among the caller's lines.
    async fn owned_line(
        &self,
        token: &SessionToken,
        line_id: &CartItemId,
    ) -> Result<CartItem, CartError> {
        let lines: Vec<CartItem> = self
            .gateway
            .filter(&Self::session_filter(token))
            .await
            .map_err(CartError::Write)?;

        lines
            .into_iter()
            .find(|line| &line.id == line_id)
            .ok_or_else(|| CartError::LineNotFound(line_id.clone()))
    }

    /// Set a line's quantity; zero or less removes it.
    ///
    /// Returns the updated line, or `None` if it was deleted.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::LineNotFound`] if the line isn't the caller's,
    /// [`CartError::InvalidQuantity`] if the quantity is too large to store,
    /// and [`CartError::Write`] if a gateway call fails.
    #[instrument(skip(self, token), fields(session = %token))]
    pub async fn set_quantity(
        &self,
        token: &SessionToken,
        line_id: &CartItemId,
        new_quantity: i64,
    ) -> Result<Option<CartItem>, CartError> {
        let quantity = if new_quantity <= 0 {
            None
        } else {
            Some(u32::try_from(new_quantity).map_err(|_| CartError::InvalidQuantity(new_quantity))?)
        };

        let lock = self.session_lock(token).await;
        let _guard = lock.lock().await;

        let line = self.owned_line(token, line_id).await?;

        let updated = match quantity {
            None => {
                self.gateway
                    .delete::<CartItem>(&line.id)
                    .await
                    .map_err(CartError::Write)?;
                info!(line_id = %line.id, "Removed cart line (quantity dropped to zero)");
                None
            }
            Some(quantity) => {
                let item = self
                    .gateway
                    .update::<CartItem>(&line.id, &CartItemPatch { quantity })
                    .await
                    .map_err(CartError::Write)?;
                info!(line_id = %item.id, quantity, "Updated cart line quantity");
                Some(item)
            }
        };

        self.notifier.notify(token);
        Ok(updated)
    }

    /// Delete a line.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::LineNotFound`] if the line isn't the caller's and
    /// [`CartError::Write`] if a gateway call fails.
    #[instrument(skip(self, token), fields(session = %token))]
    pub async fn remove(&self, token: &SessionToken, line_id: &CartItemId) -> Result<(), CartError> {
        let lock = self.session_lock(token).await;
        let _guard = lock.lock().await;

        let line = self.owned_line(token, line_id).await?;
        self.gateway
            .delete::<CartItem>(&line.id)
            .await
            .map_err(CartError::Write)?;

        info!(line_id = %line.id, "Removed cart line");
        self.notifier.notify(token);
        Ok(())
    }

    /// All lines owned by `token`, in gateway order.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Read`] if the gateway call fails.
    #[instrument(skip(self, token), fields(session = %token))]
    pub async fn get_items(&self, token: &SessionToken) -> Result<Vec<CartItem>, CartError> {
        self.gateway
            .filter(&Self::session_filter(token))
            .await
            .map_err(CartError::Read)
    }

    /// Units in the cart (Σ quantity).
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Read`] if the gateway call fails.
    pub async fn item_count(&self, token: &SessionToken) -> Result<u32, CartError> {
        let items = self.get_items(token).await?;
        Ok(compute_totals(&items).item_count)
    }

    /// Lines plus totals for rendering. A visitor without a token has an
    /// empty cart; a failed read degrades to an empty cart too.
    pub async fn view(&self, token: Option<&SessionToken>) -> CartView {
        let (items, degraded) = match token {
            None => (Vec::new(), false),
            Some(token) => match self.get_items(token).await {
                Ok(items) => (items, false),
                Err(e) => {
                    warn!(error = %e, "Showing empty cart after failed read");
                    (Vec::new(), true)
                }
            },
        };
        let totals = compute_totals(&items);
        CartView {
            items,
            totals,
            degraded,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::gateway::{EntityStore, MemoryEntityStore};
    use crate::services::notifier::CartSubscription;
    use serde_json::json;
    use tipsy_tank_core::ProductId;

    fn line(price_cents: i64, quantity: u32) -> CartItem {
        CartItem {
            id: CartItemId::new("l"),
            product_id: ProductId::new("p"),
            product_name: "Kit".to_string(),
            price: Price::from_cents(price_cents),
            quantity,
            session_id: SessionToken::generate(),
            created_date: None,
        }
    }

    fn product(id: &str, price_cents: i64) -> Product {
        serde_json::from_value(json!({
            "id": id,
            "name": format!("Kit {id}"),
            "price": Price::from_cents(price_cents),
            "slug": id,
        }))
        .unwrap()
    }

    fn service() -> (CartService, Arc<MemoryEntityStore>, CartNotifier) {
        let store = Arc::new(MemoryEntityStore::new());
        let notifier = CartNotifier::new();
        let service = CartService::new(Gateway::new(store.clone()), notifier.clone());
        (service, store, notifier)
    }

    #[test]
    fn test_totals_empty_cart() {
        let totals = compute_totals(&[]);
        assert_eq!(totals.subtotal, Price::ZERO);
        assert_eq!(totals.shipping, Price::from_cents(999));
        assert_eq!(totals.total, Price::from_cents(999));
        assert_eq!(totals.item_count, 0);
    }

    #[test]
    fn test_totals_above_threshold_ship_free() {
        let totals = compute_totals(&[line(4500, 2)]);
        assert_eq!(totals.subtotal, Price::from_cents(9000));
        assert!(totals.is_free_shipping());
        assert_eq!(totals.total, Price::from_cents(9000));
        assert_eq!(totals.free_shipping_remaining(), None);
    }

    #[test]
    fn test_totals_below_threshold() {
        let totals = compute_totals(&[line(2000, 1)]);
        assert_eq!(totals.shipping, Price::from_cents(999));
        assert_eq!(totals.total, Price::from_cents(2999));
        assert_eq!(totals.free_shipping_remaining(), Some(Price::from_cents(5500)));
    }

    #[test]
    fn test_threshold_is_strict() {
        let totals = compute_totals(&[line(7500, 1)]);
        assert_eq!(totals.shipping, FLAT_SHIPPING_FEE);
        assert_eq!(totals.total, Price::from_cents(8499));
        assert_eq!(totals.free_shipping_remaining(), None);

        let totals = compute_totals(&[line(7501, 1)]);
        assert!(totals.is_free_shipping());
    }

    #[test]
    fn test_subtotal_is_exact() {
        let totals = compute_totals(&[line(10, 1), line(20, 1)]);
        assert_eq!(totals.subtotal, Price::from_cents(30));
        assert_eq!(totals.item_count, 2);
    }

    #[tokio::test]
    async fn test_double_add_merges_into_one_line() {
        let (cart, _, _) = service();
        let token = SessionToken::generate();
        let kit = product("starter-kit", 4500);

        cart.add_or_increment(&token, &kit).await.unwrap();
        cart.add_or_increment(&token, &kit).await.unwrap();

        let items = cart.get_items(&token).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 2);
        assert_eq!(items[0].price, Price::from_cents(4500));
        assert_eq!(items[0].product_name, "Kit starter-kit");
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let (cart, _, _) = service();
        let alice = SessionToken::generate();
        let bob = SessionToken::generate();
        let kit = product("starter-kit", 4500);

        cart.add_or_increment(&alice, &kit).await.unwrap();
        cart.add_or_increment(&bob, &kit).await.unwrap();

        assert_eq!(cart.item_count(&alice).await.unwrap(), 1);
        assert_eq!(cart.item_count(&bob).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_set_quantity_zero_deletes() {
        let (cart, _, _) = service();
        let token = SessionToken::generate();
        let item = cart
            .add_or_increment(&token, &product("deluxe-kit", 6500))
            .await
            .unwrap();

        let updated = cart.set_quantity(&token, &item.id, 0).await.unwrap();
        assert!(updated.is_none());
        assert!(cart.get_items(&token).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_set_quantity_negative_deletes() {
        let (cart, store, _) = service();
        let token = SessionToken::generate();
        let item = cart
            .add_or_increment(&token, &product("deluxe-kit", 6500))
            .await
            .unwrap();

        assert!(cart.set_quantity(&token, &item.id, -3).await.unwrap().is_none());
        assert_eq!(store.count("CartItem").await, 0);
    }

    #[tokio::test]
    async fn test_set_quantity_updates_and_changes_subtotal_by_delta() {
        let (cart, _, _) = service();
        let token = SessionToken::generate();
        let item = cart
            .add_or_increment(&token, &product("maze-extension-kit", 2500))
            .await
            .unwrap();

        let before = compute_totals(&cart.get_items(&token).await.unwrap()).subtotal;
        let updated = cart.set_quantity(&token, &item.id, 3).await.unwrap().unwrap();
        assert_eq!(updated.quantity, 3);

        let after = compute_totals(&cart.get_items(&token).await.unwrap()).subtotal;
        assert_eq!(after, before + Price::from_cents(2500).times(2));
    }

    #[tokio::test]
    async fn test_set_quantity_too_large_is_rejected() {
        let (cart, store, _) = service();
        let token = SessionToken::generate();
        let item = cart
            .add_or_increment(&token, &product("deluxe-kit", 6500))
            .await
            .unwrap();
        let writes = store.write_calls();

        let result = cart.set_quantity(&token, &item.id, i64::MAX).await;
        assert!(matches!(result, Err(CartError::InvalidQuantity(_))));
        assert_eq!(store.write_calls(), writes);
    }

    #[tokio::test]
    async fn test_foreign_line_is_not_touched() {
        let (cart, store, _) = service();
        let owner = SessionToken::generate();
        let intruder = SessionToken::generate();
        let item = cart
            .add_or_increment(&owner, &product("starter-kit", 4500))
            .await
            .unwrap();
        let writes = store.write_calls();

        assert!(matches!(
            cart.set_quantity(&intruder, &item.id, 5).await,
            Err(CartError::LineNotFound(_))
        ));
        assert!(matches!(
            cart.remove(&intruder, &item.id).await,
            Err(CartError::LineNotFound(_))
        ));
        assert_eq!(store.write_calls(), writes);
        assert_eq!(cart.item_count(&owner).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_remove_only_line_empties_cart() {
        let (cart, _, _) = service();
        let token = SessionToken::generate();
        let item = cart
            .add_or_increment(&token, &product("starter-kit", 4500))
            .await
            .unwrap();

        cart.remove(&token, &item.id).await.unwrap();

        let view = cart.view(Some(&token)).await;
        assert!(view.items.is_empty());
        assert_eq!(view.totals.subtotal, Price::ZERO);
        assert!(!view.degraded);
    }

    async fn assert_quiet(sub: &mut CartSubscription) {
        let woke = tokio::time::timeout(Duration::from_millis(50), sub.changed()).await;
        assert!(woke.is_err(), "unexpected cart change signal");
    }

    #[tokio::test]
    async fn test_add_notifies_only_on_success() {
        let (cart, store, notifier) = service();
        let token = SessionToken::generate();
        let mut sub = notifier.subscribe(token.clone());
        let kit = product("starter-kit", 4500);

        cart.add_or_increment(&token, &kit).await.unwrap();
        assert!(sub.changed().await);

        store.set_unavailable(true);
        assert!(matches!(
            cart.add_or_increment(&token, &kit).await,
            Err(CartError::Write(_))
        ));
        assert_quiet(&mut sub).await;
    }

    #[tokio::test]
    async fn test_set_quantity_update_notifies() {
        let (cart, _, notifier) = service();
        let token = SessionToken::generate();
        let item = cart
            .add_or_increment(&token, &product("starter-kit", 4500))
            .await
            .unwrap();
        let mut sub = notifier.subscribe(token.clone());

        cart.set_quantity(&token, &item.id, 4).await.unwrap();
        assert!(sub.changed().await);
    }

    #[tokio::test]
    async fn test_set_quantity_delete_notifies() {
        let (cart, _, notifier) = service();
        let token = SessionToken::generate();
        let item = cart
            .add_or_increment(&token, &product("starter-kit", 4500))
            .await
            .unwrap();
        let mut sub = notifier.subscribe(token.clone());

        assert!(cart.set_quantity(&token, &item.id, 0).await.unwrap().is_none());
        assert!(sub.changed().await);
    }

    #[tokio::test]
    async fn test_remove_notifies() {
        let (cart, _, notifier) = service();
        let token = SessionToken::generate();
        let item = cart
            .add_or_increment(&token, &product("starter-kit", 4500))
            .await
            .unwrap();
        let mut sub = notifier.subscribe(token.clone());

        cart.remove(&token, &item.id).await.unwrap();
        assert!(sub.changed().await);
    }

    #[tokio::test]
    async fn test_failed_writes_do_not_notify() {
        let (cart, store, notifier) = service();
        let token = SessionToken::generate();
        let item = cart
            .add_or_increment(&token, &product("starter-kit", 4500))
            .await
            .unwrap();
        let mut sub = notifier.subscribe(token.clone());

        store.set_unavailable(true);
        assert!(matches!(
            cart.set_quantity(&token, &item.id, 2).await,
            Err(CartError::Write(_))
        ));
        assert!(matches!(
            cart.set_quantity(&token, &item.id, 0).await,
            Err(CartError::Write(_))
        ));
        assert!(matches!(
            cart.remove(&token, &item.id).await,
            Err(CartError::Write(_))
        ));
        assert_quiet(&mut sub).await;
    }

    #[tokio::test]
    async fn test_foreign_line_does_not_notify() {
        let (cart, _, notifier) = service();
        let owner = SessionToken::generate();
        let intruder = SessionToken::generate();
        let item = cart
            .add_or_increment(&owner, &product("starter-kit", 4500))
            .await
            .unwrap();
        let mut owner_sub = notifier.subscribe(owner.clone());
        let mut intruder_sub = notifier.subscribe(intruder.clone());

        assert!(matches!(
            cart.set_quantity(&intruder, &item.id, 3).await,
            Err(CartError::LineNotFound(_))
        ));
        assert!(matches!(
            cart.remove(&intruder, &item.id).await,
            Err(CartError::LineNotFound(_))
        ));
        assert_quiet(&mut owner_sub).await;
        assert_quiet(&mut intruder_sub).await;
    }

    #[tokio::test]
    async fn test_invalid_quantity_does_not_notify() {
        let (cart, _, notifier) = service();
        let token = SessionToken::generate();
        let item = cart
            .add_or_increment(&token, &product("starter-kit", 4500))
            .await
            .unwrap();
        let mut sub = notifier.subscribe(token.clone());

        assert!(matches!(
            cart.set_quantity(&token, &item.id, i64::MAX).await,
            Err(CartError::InvalidQuantity(_))
        ));
        assert_quiet(&mut sub).await;
    }

    #[tokio::test]
    async fn test_read_failure_degrades_view() {
        let (cart, store, _) = service();
        let token = SessionToken::generate();
        cart.add_or_increment(&token, &product("starter-kit", 4500))
            .await
            .unwrap();

        store.set_unavailable(true);
        assert!(matches!(cart.get_items(&token).await, Err(CartError::Read(_))));

        let view = cart.view(Some(&token)).await;
        assert!(view.items.is_empty());
        assert!(view.degraded);
    }

    #[tokio::test]
    async fn test_unset_quantity_increments_from_one() {
        let (cart, store, _) = service();
        let token = SessionToken::generate();
        store
            .create(
                "CartItem",
                json!({
                    "product_id": "starter-kit",
                    "product_name": "Starter Kit",
                    "price": 45,
                    "quantity": null,
                    "session_id": token.as_str(),
                }),
            )
            .await
            .unwrap();

        let item = cart
            .add_or_increment(&token, &product("starter-kit", 4500))
            .await
            .unwrap();
        assert_eq!(item.quantity, 2);
    }

    #[tokio::test]
    async fn test_concurrent_adds_same_session_do_not_duplicate() {
        let (cart, _, _) = service();
        let token = SessionToken::generate();
        let kit = product("starter-kit", 4500);

        let (a, b) = tokio::join!(
            cart.add_or_increment(&token, &kit),
            cart.add_or_increment(&token, &kit)
        );
        a.unwrap();
        b.unwrap();

        let items = cart.get_items(&token).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 2);
    }
}
