//! Session-scoped shopping cart.
//!
//! Keeps one cart per session inside a [`kv_session::SessionStore`]:
//!
//! - **Records**: [`ShoppingCart`], [`CartItem`], [`ItemMeta`]
//! - **Operations**: [`CartManager`] (add, remove, query, destroy)
//! - **Configuration**: [`CartConfig`], [`ReaddPricing`]
//!
//! The cart does no pricing, tax, inventory or checkout work. Prices and
//! totals are integers in minor units.
//!
//! # Example
//!
//! ```rust,ignore
//! use kv_session::{Cache, Session, SessionId};
//! use session_cart::prelude::*;
//!
//! let mut session = Session::load(Cache::open_default()?, SessionId::from("abc123"))?;
//! let carts = CartManager::new();
//!
//! carts.add_item(&mut session, "5", 1000, 2, ItemMeta::new("Rust Book").with_shipping(true))?;
//! if carts.requires_shipping(&session)? {
//!     // collect an address
//! }
//!
//! session.save()?;
//! ```

pub mod cart;
pub mod config;
pub mod error;
pub mod ids;
mod manager;

pub use cart::{CartItem, ItemMeta, ShoppingCart};
pub use config::{CartConfig, ReaddPricing};
pub use error::CartError;
pub use ids::ItemId;
pub use manager::CartManager;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::cart::{CartItem, ItemMeta, ShoppingCart};
    pub use crate::config::{CartConfig, ReaddPricing};
    pub use crate::error::CartError;
    pub use crate::ids::ItemId;
    pub use crate::manager::CartManager;
}
