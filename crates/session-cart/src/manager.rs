//! Cart operations against a session store.

use crate::cart::{CartItem, ItemMeta, ShoppingCart};
use crate::config::{CartConfig, ReaddPricing};
use crate::error::CartError;
use crate::ids::ItemId;
use kv_session::{path, SessionStore};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Reads and mutates the cart record of a session.
///
/// The manager holds no session state of its own: every operation takes the
/// caller's session, so one manager can serve any number of requests.
///
/// # Example
///
/// ```rust,ignore
/// use kv_session::MemorySession;
/// use session_cart::{CartManager, ItemMeta};
///
/// let carts = CartManager::new();
/// let mut session = MemorySession::new();
///
/// carts.add_item(&mut session, "5", 1000, 2, ItemMeta::new("Rust Book").with_shipping(true))?;
/// assert_eq!(carts.subtotal(&session)?, 2000);
/// carts.remove_row(&mut session, "opt5")?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct CartManager {
    config: CartConfig,
}

impl CartManager {
    /// Create a manager with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a manager with a validated configuration.
    pub fn with_config(config: CartConfig) -> Result<Self, CartError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The active configuration.
    pub fn config(&self) -> &CartConfig {
        &self.config
    }

    /// Key under which an item is stored in `items`.
    pub fn cart_id(&self, item_id: &ItemId) -> String {
        format!("{}{}", self.config.item_key_prefix, item_id)
    }

    /// Create an empty cart, overwriting any existing one.
    pub fn initialize<S: SessionStore>(&self, session: &mut S) -> Result<(), CartError> {
        let record = serde_json::to_value(ShoppingCart::new())?;
        session.put(&self.config.session_key, record)?;
        debug!(session_key = %self.config.session_key, "cart initialized");
        Ok(())
    }

    /// Read a dotted cart attribute (`items`, `rowcount`, `items.opt5.qty`),
    /// or the whole record when `attribute` is `None` or empty.
    ///
    /// Returns `None` when nothing (or `null`) is stored there, including
    /// when there is no cart.
    pub fn get<S: SessionStore>(
        &self,
        session: &S,
        attribute: Option<&str>,
    ) -> Result<Option<Value>, CartError> {
        let key = self.attribute_path(attribute.unwrap_or_default());
        Ok(session.get(&key)?.filter(|value| !value.is_null()))
    }

    /// The typed cart record, if one exists.
    pub fn cart<S: SessionStore>(&self, session: &S) -> Result<Option<ShoppingCart>, CartError> {
        match self.get(session, None)? {
            Some(record) => Ok(Some(serde_json::from_value(record)?)),
            None => Ok(None),
        }
    }

    /// All stored items; empty when there is no cart or no items.
    pub fn items<S: SessionStore>(
        &self,
        session: &S,
    ) -> Result<BTreeMap<String, CartItem>, CartError> {
        match self.get(session, Some("items"))? {
            Some(items) => Ok(serde_json::from_value(items)?),
            None => Ok(BTreeMap::new()),
        }
    }

    /// A single item by cart item key.
    pub fn item<S: SessionStore>(
        &self,
        session: &S,
        cart_id: &str,
    ) -> Result<Option<CartItem>, CartError> {
        Ok(self.items(session)?.remove(cart_id))
    }

    /// Stored count of distinct items (0 without a cart).
    pub fn rowcount<S: SessionStore>(&self, session: &S) -> Result<i64, CartError> {
        self.counter(session, "rowcount")
    }

    /// Stored sum of quantities (0 without a cart).
    pub fn itemcount<S: SessionStore>(&self, session: &S) -> Result<i64, CartError> {
        self.counter(session, "itemcount")
    }

    /// Stored subtotal (0 without a cart).
    pub fn subtotal<S: SessionStore>(&self, session: &S) -> Result<i64, CartError> {
        self.counter(session, "subtotal")
    }

    /// Overwrite a cart attribute.
    pub fn replace<S: SessionStore>(
        &self,
        session: &mut S,
        attribute: &str,
        value: Value,
    ) -> Result<(), CartError> {
        if attribute.is_empty() {
            return Err(CartError::InvalidArgument(
                "replace requires an attribute".to_string(),
            ));
        }

        let key = self.attribute_path(attribute);
        session.forget(&key)?;
        session.put(&key, value)?;
        Ok(())
    }

    /// Add `delta` to a numeric cart attribute. A missing attribute counts as 0.
    pub fn update<S: SessionStore>(
        &self,
        session: &mut S,
        attribute: &str,
        delta: i64,
    ) -> Result<(), CartError> {
        if attribute.is_empty() {
            return Err(CartError::InvalidArgument(
                "update requires an attribute".to_string(),
            ));
        }

        let current = self.counter(session, attribute)?;
        let next = current.checked_add(delta).ok_or(CartError::Overflow)?;
        self.replace(session, attribute, Value::from(next))
    }

    /// Whether a cart exists, and with `with_items`, whether it has any rows.
    pub fn exists<S: SessionStore>(&self, session: &S, with_items: bool) -> Result<bool, CartError> {
        if !session.has(&self.config.session_key)? {
            return Ok(false);
        }
        if with_items {
            let rows = self
                .get(session, Some("rowcount"))?
                .and_then(|value| value.as_i64())
                .unwrap_or(0);
            return Ok(rows > 0);
        }
        Ok(true)
    }

    /// Add `qty` of an item, creating the cart if needed.
    ///
    /// Adding an item already in the cart increases its quantity. Under
    /// [`ReaddPricing::Original`] the stored price and metadata are kept and
    /// the extra units are priced at the stored price; `price` and `meta` are
    /// ignored. Under [`ReaddPricing::Latest`] the line is re-priced at `price`.
    pub fn add_item<S: SessionStore>(
        &self,
        session: &mut S,
        item_id: impl Into<ItemId>,
        price: i64,
        qty: i64,
        meta: ItemMeta,
    ) -> Result<(), CartError> {
        let item_id = item_id.into();
        let cart_id = self.cart_id(&item_id);
        let mut items = self.items(session)?;

        if let Some(existing) = items.get_mut(&cart_id) {
            let new_qty = existing.qty.checked_add(qty).ok_or(CartError::Overflow)?;
            let subtotal_delta = match self.config.readd_pricing {
                ReaddPricing::Original => {
                    qty.checked_mul(existing.price).ok_or(CartError::Overflow)?
                }
                ReaddPricing::Latest => {
                    let before = existing.line_total()?;
                    let after = new_qty.checked_mul(price).ok_or(CartError::Overflow)?;
                    existing.price = price;
                    after.checked_sub(before).ok_or(CartError::Overflow)?
                }
            };
            existing.qty = new_qty;

            let totals = self.next_totals(session, 0, qty, subtotal_delta)?;
            self.write_rows(session, &items, totals)?;
            debug!(cart_id = %cart_id, qty, total_qty = new_qty, "cart item quantity increased");
            return Ok(());
        }

        let line_total = qty.checked_mul(price).ok_or(CartError::Overflow)?;
        let totals = self.next_totals(session, 1, qty, line_total)?;
        if !session.has(&self.config.session_key)? {
            self.initialize(session)?;
        }

        items.insert(
            cart_id.clone(),
            CartItem {
                id: item_id,
                price,
                qty,
                meta,
            },
        );
        self.write_rows(session, &items, totals)?;
        debug!(cart_id = %cart_id, price, qty, "item added to cart");
        Ok(())
    }

    /// Remove a row by its full cart item key (e.g. `opt5`).
    ///
    /// Leaves the cart untouched and returns [`CartError::ItemNotFound`] when
    /// the key is not in the cart, or [`CartError::Overflow`] when the totals
    /// cannot absorb the removal.
    pub fn remove_row<S: SessionStore>(&self, session: &mut S, cart_id: &str) -> Result<(), CartError> {
        let mut items = self.items(session)?;
        let Some(item) = items.remove(cart_id) else {
            warn!(cart_id, "remove requested for item not in cart");
            return Err(CartError::ItemNotFound(cart_id.to_string()));
        };

        let qty_delta = item.qty.checked_neg().ok_or(CartError::Overflow)?;
        let subtotal_delta = item
            .line_total()?
            .checked_neg()
            .ok_or(CartError::Overflow)?;

        let totals = self.next_totals(session, -1, qty_delta, subtotal_delta)?;
        self.write_rows(session, &items, totals)?;
        debug!(cart_id, qty = item.qty, "cart row removed");
        Ok(())
    }

    /// Whether any stored item requires shipping.
    pub fn requires_shipping<S: SessionStore>(&self, session: &S) -> Result<bool, CartError> {
        Ok(self.items(session)?.values().any(|item| item.meta.req_shipping))
    }

    /// Delete the cart from the session.
    pub fn kill<S: SessionStore>(&self, session: &mut S) -> Result<(), CartError> {
        session.forget(&self.config.session_key)?;
        debug!(session_key = %self.config.session_key, "cart destroyed");
        Ok(())
    }

    /// Stored counters shifted by the given deltas. Reads only.
    fn next_totals<S: SessionStore>(
        &self,
        session: &S,
        rows: i64,
        qty: i64,
        subtotal: i64,
    ) -> Result<Totals, CartError> {
        let shift = |current: i64, delta: i64| current.checked_add(delta).ok_or(CartError::Overflow);
        Ok(Totals {
            rowcount: shift(self.rowcount(session)?, rows)?,
            itemcount: shift(self.itemcount(session)?, qty)?,
            subtotal: shift(self.subtotal(session)?, subtotal)?,
        })
    }

    fn write_rows<S: SessionStore>(
        &self,
        session: &mut S,
        items: &BTreeMap<String, CartItem>,
        totals: Totals,
    ) -> Result<(), CartError> {
        let items = serde_json::to_value(items)?;
        self.replace(session, "items", items)?;
        self.replace(session, "rowcount", Value::from(totals.rowcount))?;
        self.replace(session, "itemcount", Value::from(totals.itemcount))?;
        self.replace(session, "subtotal", Value::from(totals.subtotal))?;
        Ok(())
    }

    fn attribute_path(&self, attribute: &str) -> String {
        path::join(&self.config.session_key, attribute)
    }

    fn counter<S: SessionStore>(&self, session: &S, attribute: &str) -> Result<i64, CartError> {
        match self.get(session, Some(attribute))? {
            Some(value) => value
                .as_i64()
                .ok_or_else(|| CartError::NotNumeric(attribute.to_string())),
            None => Ok(0),
        }
    }
}

/// Counter values computed before a multi-field write.
#[derive(Debug, Clone, Copy)]
struct Totals {
    rowcount: i64,
    itemcount: i64,
    subtotal: i64,
}
