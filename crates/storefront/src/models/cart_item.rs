//! Cart line items.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use tipsy_tank_core::{CartItemId, Price, ProductId, SessionToken};

use crate::gateway::{Creatable, Deletable, Entity, Updatable};
use crate::models::timestamp::optional_timestamp;

/// One product line in a visitor's cart.
///
/// `product_name` and `price` are copied from the product when the line is
/// created and are not refreshed afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: CartItemId,
    pub product_id: ProductId,
    #[serde(default)]
    pub product_name: String,
    pub price: Price,
    #[serde(default = "default_quantity", deserialize_with = "quantity_or_one")]
    pub quantity: u32,
    pub session_id: SessionToken,
    #[serde(default, deserialize_with = "optional_timestamp")]
    pub created_date: Option<DateTime<Utc>>,
}

impl CartItem {
    /// `price × quantity`.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price.times(self.quantity)
    }
}

const fn default_quantity() -> u32 {
    1
}

/// Records with the quantity unset (null or zero) count as one unit.
fn quantity_or_one<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let quantity = Option::<u32>::deserialize(deserializer)?;
    Ok(quantity.filter(|q| *q > 0).unwrap_or(1))
}

impl Entity for CartItem {
    const NAME: &'static str = "CartItem";
    type Id = CartItemId;

    fn id(&self) -> &CartItemId {
        &self.id
    }
}

impl Creatable for CartItem {
    type Draft = NewCartItem;
}

impl Updatable for CartItem {
    type Patch = CartItemPatch;
}

impl Deletable for CartItem {}

/// Fields for a new cart line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewCartItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub price: Price,
    pub quantity: u32,
    pub session_id: SessionToken,
}

/// Partial update of a cart line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CartItemPatch {
    pub quantity: u32,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(quantity: serde_json::Value) -> serde_json::Value {
        json!({
            "id": "line1",
            "product_id": "p1",
            "product_name": "Starter Kit",
            "price": 45,
            "quantity": quantity,
            "session_id": "token-1",
        })
    }

    #[test]
    fn test_unset_quantity_reads_as_one() {
        let item: CartItem = serde_json::from_value(record(json!(null))).unwrap();
        assert_eq!(item.quantity, 1);

        let item: CartItem = serde_json::from_value(record(json!(0))).unwrap();
        assert_eq!(item.quantity, 1);

        let mut missing = record(json!(1));
        missing.as_object_mut().unwrap().remove("quantity");
        let item: CartItem = serde_json::from_value(missing).unwrap();
        assert_eq!(item.quantity, 1);
    }

    #[test]
    fn test_created_date_is_read_when_present() {
        let mut stamped = record(json!(1));
        stamped["created_date"] = json!("2025-06-01T12:00:00.000000");
        let item: CartItem = serde_json::from_value(stamped).unwrap();
        assert_eq!(
            item.created_date.unwrap().to_rfc3339(),
            "2025-06-01T12:00:00+00:00"
        );

        let item: CartItem = serde_json::from_value(record(json!(1))).unwrap();
        assert!(item.created_date.is_none());
    }

    #[test]
    fn test_line_total() {
        let item: CartItem = serde_json::from_value(record(json!(3))).unwrap();
        assert_eq!(item.line_total(), Price::from_cents(13500));
    }

    #[test]
    fn test_new_cart_item_wire_format() {
        let draft = NewCartItem {
            product_id: ProductId::new("p1"),
            product_name: "Starter Kit".to_string(),
            price: Price::from_cents(4500),
            quantity: 1,
            session_id: SessionToken::from_existing("token-1").unwrap(),
        };
        let json = serde_json::to_value(&draft).unwrap();
        assert_eq!(json["product_id"], "p1");
        assert_eq!(json["session_id"], "token-1");
        assert_eq!(json["quantity"], 1);
    }
}
