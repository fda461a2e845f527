//! Session management using Key-Value store.

use crate::{cache_key, path, Cache, SessionError, SessionStore};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A unique session identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    /// Create a new session ID from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a new cryptographically secure session ID.
    pub fn generate() -> Self {
        use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
        use rand::Rng;

        let bytes: [u8; 18] = rand::thread_rng().gen();
        Self(format!("sess_{}", URL_SAFE_NO_PAD.encode(bytes)))
    }

    /// Get the session ID as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Session record as persisted in the cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionData {
    /// The session ID.
    pub id: SessionId,
    /// Session document, addressed by dotted key paths.
    pub data: Value,
    /// Number of times the session has been saved.
    pub version: u64,
    /// When the session was created (Unix timestamp).
    pub created_at: u64,
    /// When the session was last saved (Unix timestamp).
    pub last_accessed: u64,
}

impl SessionData {
    fn empty(id: SessionId) -> Self {
        let now = current_timestamp();
        Self {
            id,
            data: Value::Object(Map::new()),
            version: 0,
            created_at: now,
            last_accessed: now,
        }
    }
}

/// A request-scoped session loaded from the cache.
///
/// Reads and writes go to the in-memory document; nothing reaches the cache
/// until [`Session::save`] is called.
///
/// # Example
///
/// ```rust,ignore
/// use kv_session::{Cache, Session, SessionId, SessionStore};
///
/// let mut session = Session::load(Cache::open_default()?, SessionId::from("abc123"))?;
/// session.put("shoppingcart.rowcount", serde_json::json!(0))?;
/// session.save()?;
/// ```
pub struct Session {
    cache: Cache,
    record: SessionData,
    dirty: bool,
}

impl Session {
    /// Load a session, starting an empty one if it is not in the cache.
    pub fn load(cache: Cache, id: SessionId) -> Result<Self, SessionError> {
        let key = session_key(&id);
        let record = match cache.get::<SessionData>(&key)? {
            Some(mut record) => {
                if !record.data.is_object() {
                    record.data = Value::Object(Map::new());
                }
                record
            }
            None => SessionData::empty(id),
        };

        tracing::trace!(session_id = %record.id, version = record.version, "session loaded");
        Ok(Self {
            cache,
            record,
            dirty: false,
        })
    }

    /// Start a brand new session with a generated ID.
    pub fn start(cache: Cache) -> Self {
        Self {
            cache,
            record: SessionData::empty(SessionId::generate()),
            dirty: false,
        }
    }

    /// The session ID.
    pub fn id(&self) -> &SessionId {
        &self.record.id
    }

    /// Number of completed saves.
    pub fn version(&self) -> u64 {
        self.record.version
    }

    /// Whether there are unsaved changes.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Borrow the whole session document.
    pub fn document(&self) -> &Value {
        &self.record.data
    }

    /// Persist unsaved changes. Does nothing when the session is clean.
    pub fn save(&mut self) -> Result<(), SessionError> {
        if !self.dirty {
            return Ok(());
        }

        let mut record = self.record.clone();
        record.version += 1;
        record.last_accessed = current_timestamp();
        self.cache.set(&session_key(&record.id), &record)?;

        tracing::debug!(session_id = %record.id, version = record.version, "session saved");
        self.record = record;
        self.dirty = false;
        Ok(())
    }

    /// Delete the session from the cache.
    pub fn destroy(self) -> Result<(), SessionError> {
        self.cache.delete(&session_key(&self.record.id))?;
        tracing::debug!(session_id = %self.record.id, "session destroyed");
        Ok(())
    }
}

impl SessionStore for Session {
    fn get(&self, key: &str) -> Result<Option<Value>, SessionError> {
        Ok(path::lookup(&self.record.data, key)?.cloned())
    }

    fn put(&mut self, key: &str, value: Value) -> Result<(), SessionError> {
        path::insert(&mut self.record.data, key, value)?;
        self.dirty = true;
        Ok(())
    }

    fn forget(&mut self, key: &str) -> Result<(), SessionError> {
        if path::remove(&mut self.record.data, key)?.is_some() {
            self.dirty = true;
        }
        Ok(())
    }
}

fn session_key(id: &SessionId) -> String {
    cache_key!("session", id)
}

fn current_timestamp() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
