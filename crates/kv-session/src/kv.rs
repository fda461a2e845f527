//! Key-Value store wrapper with automatic serialization.
//!
//! [`Cache`] handles JSON encoding; the byte storage underneath depends on the
//! target. `wasm32` builds talk to Spin's key-value API, other builds keep
//! named in-process maps.

use crate::SessionError;
use serde::{de::DeserializeOwned, Serialize};

/// Name of the store opened by [`Cache::open_default`].
pub const DEFAULT_STORE: &str = "default";

#[cfg(target_arch = "wasm32")]
mod backend {
    use crate::SessionError;
    use spin_sdk::key_value::{Error, Store};

    fn store_error(err: Error) -> SessionError {
        SessionError::StoreError(err.to_string())
    }

    pub(super) struct Backend(Store);

    impl Backend {
        pub(super) fn open(name: &str) -> Result<Self, SessionError> {
            Store::open(name)
                .map(Self)
                .map_err(|e| SessionError::OpenError(format!("{}: {}", name, e)))
        }

        pub(super) fn read(&self, key: &str) -> Result<Option<Vec<u8>>, SessionError> {
            self.0.get(key).map_err(store_error)
        }

        pub(super) fn write(&self, key: &str, bytes: Vec<u8>) -> Result<(), SessionError> {
            self.0.set(key, &bytes).map_err(store_error)
        }

        pub(super) fn remove(&self, key: &str) -> Result<(), SessionError> {
            self.0.delete(key).map_err(store_error)
        }

        pub(super) fn contains(&self, key: &str) -> Result<bool, SessionError> {
            self.0.exists(key).map_err(store_error)
        }

        pub(super) fn list(&self) -> Result<Vec<String>, SessionError> {
            self.0.get_keys().map_err(store_error)
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod backend {
    use crate::SessionError;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

    type Bucket = Arc<Mutex<HashMap<String, Vec<u8>>>>;

    /// Buckets by store name, so every `open` of a name sees the same data.
    static REGISTRY: OnceLock<Mutex<HashMap<String, Bucket>>> = OnceLock::new();

    pub(super) struct Backend(Bucket);

    impl Backend {
        pub(super) fn open(name: &str) -> Result<Self, SessionError> {
            let mut registry = REGISTRY
                .get_or_init(Default::default)
                .lock()
                .map_err(|_| SessionError::OpenError(format!("store registry poisoned: {}", name)))?;
            Ok(Self(registry.entry(name.to_string()).or_default().clone()))
        }

        pub(super) fn private() -> Self {
            Self(Bucket::default())
        }

        pub(super) fn read(&self, key: &str) -> Result<Option<Vec<u8>>, SessionError> {
            Ok(self.lock()?.get(key).cloned())
        }

        pub(super) fn write(&self, key: &str, bytes: Vec<u8>) -> Result<(), SessionError> {
            self.lock()?.insert(key.to_string(), bytes);
            Ok(())
        }

        pub(super) fn remove(&self, key: &str) -> Result<(), SessionError> {
            self.lock()?.remove(key);
            Ok(())
        }

        pub(super) fn contains(&self, key: &str) -> Result<bool, SessionError> {
            Ok(self.lock()?.contains_key(key))
        }

        pub(super) fn list(&self) -> Result<Vec<String>, SessionError> {
            Ok(self.lock()?.keys().cloned().collect())
        }

        fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, Vec<u8>>>, SessionError> {
            self.0
                .lock()
                .map_err(|_| SessionError::StoreError("store lock poisoned".to_string()))
        }
    }
}

/// Type-safe cache backed by a Key-Value store.
///
/// On `wasm32` this is Spin's Key-Value Store. On other targets each named
/// store is an in-process map, shared by every `Cache` opened with that name.
///
/// Provides automatic JSON serialization for any type that implements
/// `Serialize` and `DeserializeOwned`.
pub struct Cache {
    backend: backend::Backend,
}

impl Cache {
    /// Open the default Key-Value store.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let cache = Cache::open_default()?;
    /// ```
    pub fn open_default() -> Result<Self, SessionError> {
        Self::open(DEFAULT_STORE)
    }

    /// Open a named Key-Value store.
    pub fn open(name: &str) -> Result<Self, SessionError> {
        Ok(Self {
            backend: backend::Backend::open(name)?,
        })
    }

    /// Create a private store not shared with any other `Cache`.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn in_memory() -> Self {
        Self {
            backend: backend::Backend::private(),
        }
    }

    /// Get a value from the cache.
    ///
    /// Returns `None` if the key doesn't exist.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let data: Option<SessionData> = cache.get("session:sess_abc")?;
    /// ```
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, SessionError> {
        match self.backend.read(key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Set a value in the cache.
    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), SessionError> {
        let bytes = serde_json::to_vec(value)?;
        self.backend.write(key, bytes)
    }

    /// Delete a value from the cache. Missing keys are not an error.
    pub fn delete(&self, key: &str) -> Result<(), SessionError> {
        self.backend.remove(key)
    }

    /// Check if a key exists in the cache.
    pub fn exists(&self, key: &str) -> Result<bool, SessionError> {
        self.backend.contains(key)
    }

    /// Get all keys in the cache, sorted.
    pub fn keys(&self) -> Result<Vec<String>, SessionError> {
        let mut keys = self.backend.list()?;
        keys.sort();
        Ok(keys)
    }
}

/// Helper to build cache keys with namespacing.
///
/// # Example
///
/// ```rust,ignore
/// let key = cache_key!("session", session_id);
/// // Returns "session:sess_abc"
/// ```
#[macro_export]
macro_rules! cache_key {
    ($prefix:expr, $($part:expr),+) => {{
        let mut key = String::from($prefix);
        $(
            key.push(':');
            key.push_str(&$part.to_string());
        )+
        key
    }};
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_delete() {
        let cache = Cache::in_memory();
        cache.set("k", &vec![1, 2, 3]).unwrap();
        assert!(cache.exists("k").unwrap());
        assert_eq!(cache.get::<Vec<i32>>("k").unwrap(), Some(vec![1, 2, 3]));

        cache.delete("k").unwrap();
        assert!(!cache.exists("k").unwrap());
        assert_eq!(cache.get::<Vec<i32>>("k").unwrap(), None);
    }

    #[test]
    fn test_named_stores_are_shared() {
        let a = Cache::open("kv-test-shared").unwrap();
        let b = Cache::open("kv-test-shared").unwrap();
        a.set("shared", &"value").unwrap();
        assert_eq!(b.get::<String>("shared").unwrap().as_deref(), Some("value"));
    }

    #[test]
    fn test_named_stores_are_isolated() {
        let a = Cache::open("kv-test-left").unwrap();
        let b = Cache::open("kv-test-right").unwrap();
        a.set("only-left", &1).unwrap();
        assert!(!b.exists("only-left").unwrap());
    }

    #[test]
    fn test_keys_sorted() {
        let cache = Cache::in_memory();
        cache.set("b", &1).unwrap();
        cache.set("a", &2).unwrap();
        assert_eq!(cache.keys().unwrap(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_get_wrong_type_is_serialize_error() {
        let cache = Cache::in_memory();
        cache.set("k", &"text").unwrap();
        assert!(matches!(
            cache.get::<u64>("k"),
            Err(SessionError::SerializeError(_))
        ));
    }

    #[test]
    fn test_open_default_is_shared() {
        let a = Cache::open_default().unwrap();
        let b = Cache::open(DEFAULT_STORE).unwrap();
        a.set("kv-test-default", &true).unwrap();
        assert_eq!(b.get::<bool>("kv-test-default").unwrap(), Some(true));
        b.delete("kv-test-default").unwrap();
        assert!(!a.exists("kv-test-default").unwrap());
    }

    #[test]
    fn test_delete_missing_key() {
        let cache = Cache::in_memory();
        cache.delete("never-set").unwrap();
        assert!(cache.keys().unwrap().is_empty());
    }

    #[test]
    fn test_set_overwrites() {
        let cache = Cache::in_memory();
        cache.set("k", &1).unwrap();
        cache.set("k", &"two").unwrap();
        assert_eq!(cache.get::<String>("k").unwrap().as_deref(), Some("two"));
        assert_eq!(cache.keys().unwrap().len(), 1);
    }

    #[test]
    fn test_cache_key_macro() {
        let key = crate::cache_key!("session", "abc", 7);
        assert_eq!(key, "session:abc:7");
    }
}
