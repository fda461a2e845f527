//! The session store abstraction.

use crate::SessionError;
use serde_json::Value;

/// Dotted key-path access to the data of a single session.
///
/// Implementations own (or borrow exclusively) one session document for the
/// duration of a request. Paths follow [`crate::path`] rules.
pub trait SessionStore {
    /// Read the value at `path`, or `None` if nothing is stored there.
    ///
    /// A stored `null` is returned as `Some(Value::Null)`.
    fn get(&self, path: &str) -> Result<Option<Value>, SessionError>;

    /// Write `value` at `path`, creating intermediate structure as needed.
    fn put(&mut self, path: &str, value: Value) -> Result<(), SessionError>;

    /// Delete the value at `path`. Deleting a missing path is a no-op.
    fn forget(&mut self, path: &str) -> Result<(), SessionError>;

    /// Read the value at `path`, falling back to `default` when absent.
    fn get_or(&self, path: &str, default: Value) -> Result<Value, SessionError> {
        Ok(self.get(path)?.unwrap_or(default))
    }

    /// Whether a non-null value is stored at `path`.
    fn has(&self, path: &str) -> Result<bool, SessionError> {
        Ok(self.get(path)?.is_some_and(|v| !v.is_null()))
    }
}

impl<S: SessionStore + ?Sized> SessionStore for &mut S {
    fn get(&self, path: &str) -> Result<Option<Value>, SessionError> {
        (**self).get(path)
    }

    fn put(&mut self, path: &str, value: Value) -> Result<(), SessionError> {
        (**self).put(path, value)
    }

    fn forget(&mut self, path: &str) -> Result<(), SessionError> {
        (**self).forget(path)
    }
}
