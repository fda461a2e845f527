//! Cart record and line item types.
//!
//! These mirror the JSON layout kept in the session:
//!
//! ```text
//! shoppingcart
//!   items      { "opt5": { id, price, qty, name, uri, value, req_shipping, freight_charge } } | null
//!   rowcount
//!   itemcount
//!   subtotal
//! ```

use crate::error::CartError;
use crate::ids::ItemId;
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// The cart record stored in a session.
///
/// Totals are maintained incrementally by [`crate::CartManager`] and are not
/// re-derived from `items`, so they can drift when callers edit attributes
/// directly. Use [`ShoppingCart::is_consistent`] to detect that.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShoppingCart {
    /// Line items keyed by cart item key. `None` until the first item is added.
    pub items: Option<BTreeMap<String, CartItem>>,
    /// Number of distinct item keys.
    pub rowcount: i64,
    /// Sum of quantities.
    pub itemcount: i64,
    /// Sum of `price * qty`, in minor units.
    pub subtotal: i64,
}

impl ShoppingCart {
    /// Create an empty cart.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the cart holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.as_ref().map_or(true, |items| items.is_empty())
    }

    /// Get an item by its cart item key.
    pub fn item(&self, cart_id: &str) -> Option<&CartItem> {
        self.items.as_ref().and_then(|items| items.get(cart_id))
    }

    /// Iterate over stored items.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &CartItem)> {
        self.items.iter().flatten()
    }

    /// Whether any stored item needs shipping.
    pub fn requires_shipping(&self) -> bool {
        self.iter().any(|(_, item)| item.meta.req_shipping)
    }

    /// Totals derived from the items alone.
    pub fn recomputed(&self) -> Result<Self, CartError> {
        let mut itemcount: i64 = 0;
        let mut subtotal: i64 = 0;
        for (_, item) in self.iter() {
            itemcount = itemcount.checked_add(item.qty).ok_or(CartError::Overflow)?;
            subtotal = subtotal
                .checked_add(item.line_total()?)
                .ok_or(CartError::Overflow)?;
        }

        Ok(Self {
            items: self.items.clone(),
            rowcount: self.iter().count() as i64,
            itemcount,
            subtotal,
        })
    }

    /// Whether the stored totals match the items.
    pub fn is_consistent(&self) -> bool {
        self.recomputed().is_ok_and(|derived| {
            derived.rowcount == self.rowcount
                && derived.itemcount == self.itemcount
                && derived.subtotal == self.subtotal
        })
    }
}

/// A line item in the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    /// Item identifier as supplied on add.
    pub id: ItemId,
    /// Unit price, in minor units.
    pub price: i64,
    /// Quantity.
    pub qty: i64,
    /// Display and fulfilment data copied at add time.
    #[serde(flatten)]
    pub meta: ItemMeta,
}

impl CartItem {
    /// `price * qty`.
    pub fn line_total(&self) -> Result<i64, CartError> {
        self.price
            .checked_mul(self.qty)
            .ok_or(CartError::Overflow)
    }
}

/// Item metadata supplied by the caller on add.
///
/// Missing fields default to empty, `false` or zero. Deserialization is
/// lenient, see [`ItemMeta::from_value`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemMeta {
    /// Display name.
    #[serde(deserialize_with = "scalar_text")]
    pub name: String,
    /// Link back to the item.
    #[serde(deserialize_with = "scalar_text")]
    pub uri: String,
    /// Free-form value chosen by the caller (e.g. a selected option).
    #[serde(deserialize_with = "scalar_text")]
    pub value: String,
    /// Whether the item must be shipped.
    #[serde(deserialize_with = "truthy")]
    pub req_shipping: bool,
    /// Per-item freight charge, in minor units.
    #[serde(deserialize_with = "integer_amount")]
    pub freight_charge: i64,
}

impl ItemMeta {
    /// Create metadata with a display name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Build metadata from a loosely-typed JSON object.
    ///
    /// Keys are read the way form or session input usually arrives:
    ///
    /// - `name`, `uri` and `value` take any scalar; numbers and booleans are
    ///   kept as their JSON text and `null` becomes `""`.
    /// - `req_shipping` is truthy unless it is `false`, `null`, zero, `""`,
    ///   `"0"`, or an empty array or object.
    /// - `freight_charge` takes an integer or a string holding one.
    ///
    /// Anything else (an object as `name`, `"free"` as `freight_charge`) is a
    /// [`CartError::Serialization`] error.
    pub fn from_value(value: Value) -> Result<Self, CartError> {
        Ok(serde_json::from_value(value)?)
    }

    /// Set the URI.
    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = uri.into();
        self
    }

    /// Set the value.
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    /// Mark whether the item requires shipping.
    pub fn with_shipping(mut self, req_shipping: bool) -> Self {
        self.req_shipping = req_shipping;
        self
    }

    /// Set the freight charge.
    pub fn with_freight_charge(mut self, freight_charge: i64) -> Self {
        self.freight_charge = freight_charge;
        self
    }
}

fn scalar_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(String::new()),
        Value::String(text) => Ok(text),
        Value::Bool(flag) => Ok(flag.to_string()),
        Value::Number(number) => Ok(number.to_string()),
        _ => Err(de::Error::custom("expected a string, number or boolean")),
    }
}

fn truthy<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => false,
        Value::Bool(flag) => flag,
        Value::Number(number) => number.as_f64().map_or(true, |n| n != 0.0),
        Value::String(text) => !(text.is_empty() || text == "0"),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    })
}

fn integer_amount<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(0),
        Value::Number(number) => number
            .as_i64()
            .ok_or_else(|| de::Error::custom(format!("amount {number} is not an integer"))),
        Value::String(text) => text
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("amount {text:?} is not an integer"))),
        _ => Err(de::Error::custom("expected an integer amount")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(id: &str, price: i64, qty: i64, shipping: bool) -> CartItem {
        CartItem {
            id: ItemId::new(id),
            price,
            qty,
            meta: ItemMeta::new(id).with_shipping(shipping),
        }
    }

    fn cart_with(items: Vec<(&str, CartItem)>) -> ShoppingCart {
        let items: BTreeMap<String, CartItem> =
            items.into_iter().map(|(k, v)| (k.to_string(), v)).collect();
        ShoppingCart {
            items: Some(items),
            ..ShoppingCart::default()
        }
    }

    #[test]
    fn test_new_cart_serializes_with_null_items() {
        let value = serde_json::to_value(ShoppingCart::new()).unwrap();
        assert_eq!(
            value,
            json!({"items": null, "rowcount": 0, "itemcount": 0, "subtotal": 0})
        );
    }

    #[test]
    fn test_item_serializes_flat() {
        let value = serde_json::to_value(item("5", 10, 2, true)).unwrap();
        assert_eq!(
            value,
            json!({
                "id": "5",
                "price": 10,
                "qty": 2,
                "name": "5",
                "uri": "",
                "value": "",
                "req_shipping": true,
                "freight_charge": 0
            })
        );
    }

    #[test]
    fn test_item_deserializes_with_missing_meta() {
        let parsed: CartItem = serde_json::from_value(json!({"id": "5", "price": 10, "qty": 2})).unwrap();
        assert_eq!(parsed.meta, ItemMeta::default());
    }

    #[test]
    fn test_is_empty() {
        assert!(ShoppingCart::new().is_empty());
        assert!(cart_with(vec![]).is_empty());
        assert!(!cart_with(vec![("opt1", item("1", 1, 1, false))]).is_empty());
    }

    #[test]
    fn test_requires_shipping() {
        let cart = cart_with(vec![
            ("opt1", item("1", 1, 1, false)),
            ("opt2", item("2", 1, 1, true)),
        ]);
        assert!(cart.requires_shipping());

        let cart = cart_with(vec![("opt1", item("1", 1, 1, false))]);
        assert!(!cart.requires_shipping());
        assert!(!ShoppingCart::new().requires_shipping());
    }

    #[test]
    fn test_recomputed_totals() {
        let cart = cart_with(vec![
            ("opt1", item("1", 250, 2, false)),
            ("opt2", item("2", 100, 3, true)),
        ]);
        let derived = cart.recomputed().unwrap();
        assert_eq!(derived.rowcount, 2);
        assert_eq!(derived.itemcount, 5);
        assert_eq!(derived.subtotal, 800);
        assert!(derived.is_consistent());
        assert!(!cart.is_consistent());
    }

    #[test]
    fn test_line_total_overflow() {
        let big = item("1", i64::MAX, 2, false);
        assert!(matches!(big.line_total(), Err(CartError::Overflow)));
    }

    #[test]
    fn test_meta_from_value_defaults_missing_keys() {
        let meta = ItemMeta::from_value(json!({"name": "A", "req_shipping": true})).unwrap();
        assert_eq!(meta.name, "A");
        assert!(meta.req_shipping);
        assert_eq!(meta.uri, "");
        assert_eq!(meta.freight_charge, 0);
    }

    #[test]
    fn test_meta_from_value_reads_shipping_truthiness() {
        let shipping = |flag: Value| {
            ItemMeta::from_value(json!({"req_shipping": flag}))
                .unwrap()
                .req_shipping
        };
        assert!(shipping(json!(1)));
        assert!(shipping(json!("yes")));
        assert!(shipping(json!("1")));
        assert!(shipping(json!(["gift"])));
        assert!(!shipping(json!(0)));
        assert!(!shipping(json!("0")));
        assert!(!shipping(json!("")));
        assert!(!shipping(json!(null)));
        assert!(!shipping(json!([])));
    }

    #[test]
    fn test_meta_from_value_accepts_scalar_text() {
        let meta = ItemMeta::from_value(json!({
            "name": "Poster",
            "uri": null,
            "value": 42,
            "freight_charge": "150"
        }))
        .unwrap();
        assert_eq!(meta.name, "Poster");
        assert_eq!(meta.uri, "");
        assert_eq!(meta.value, "42");
        assert_eq!(meta.freight_charge, 150);

        let meta = ItemMeta::from_value(json!({"value": true})).unwrap();
        assert_eq!(meta.value, "true");
    }

    #[test]
    fn test_meta_from_value_rejects_unusable_shapes() {
        let result = ItemMeta::from_value(json!({"name": {"first": "A"}}));
        assert!(matches!(result, Err(CartError::Serialization(_))));

        let result = ItemMeta::from_value(json!({"freight_charge": "free"}));
        assert!(matches!(result, Err(CartError::Serialization(_))));

        let result = ItemMeta::from_value(json!({"freight_charge": 1.5}));
        assert!(matches!(result, Err(CartError::Serialization(_))));
    }

    #[test]
    fn test_item_with_loose_meta_deserializes() {
        let parsed: CartItem = serde_json::from_value(json!({
            "id": "5",
            "price": 10,
            "qty": 2,
            "req_shipping": 1,
            "value": 7
        }))
        .unwrap();
        assert!(parsed.meta.req_shipping);
        assert_eq!(parsed.meta.value, "7");
    }
}
