//! In-memory session store.

use crate::{path, SessionError, SessionStore};
use serde_json::{Map, Value};

/// A session document held entirely in memory.
///
/// Useful for tests and for callers that load and persist the session
/// document themselves.
#[derive(Debug, Clone, PartialEq)]
pub struct MemorySession {
    document: Value,
}

impl MemorySession {
    /// Create an empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing document. Non-object documents start empty.
    pub fn from_value(document: Value) -> Self {
        if document.is_object() {
            Self { document }
        } else {
            Self::default()
        }
    }

    /// Borrow the whole session document.
    pub fn document(&self) -> &Value {
        &self.document
    }

    /// Consume the session and return its document.
    pub fn into_inner(self) -> Value {
        self.document
    }
}

impl Default for MemorySession {
    fn default() -> Self {
        Self {
            document: Value::Object(Map::new()),
        }
    }
}

impl SessionStore for MemorySession {
    fn get(&self, key: &str) -> Result<Option<Value>, SessionError> {
        Ok(path::lookup(&self.document, key)?.cloned())
    }

    fn put(&mut self, key: &str, value: Value) -> Result<(), SessionError> {
        path::insert(&mut self.document, key, value)
    }

    fn forget(&mut self, key: &str) -> Result<(), SessionError> {
        path::remove(&mut self.document, key)?;
        Ok(())
    }
}
