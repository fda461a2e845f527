//! Key-Value backed session store.
//!
//! Exposes one session's data as a JSON document addressed by dotted key
//! paths (`shoppingcart.items.opt5`), through the [`SessionStore`] trait.
//!
//! - [`MemorySession`] keeps the document in memory.
//! - [`Session`] loads the document from a [`Cache`] and writes it back on
//!   [`Session::save`].
//!
//! # Example
//!
//! ```rust,ignore
//! use kv_session::{Cache, Session, SessionId, SessionStore};
//! use serde_json::json;
//!
//! let cache = Cache::open_default()?;
//! let mut session = Session::load(cache, SessionId::from("abc123"))?;
//!
//! session.put("shoppingcart.rowcount", json!(1))?;
//! assert!(session.has("shoppingcart")?);
//!
//! session.save()?;
//! ```

mod error;
mod kv;
mod memory;
pub mod path;
mod session;
mod store;

pub use error::SessionError;
pub use kv::{Cache, DEFAULT_STORE};
pub use memory::MemorySession;
pub use session::{Session, SessionData, SessionId};
pub use store::SessionStore;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{Cache, MemorySession, Session, SessionError, SessionId, SessionStore};
}
