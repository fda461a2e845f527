//! Dotted key-path access into a JSON session document.
//!
//! A path such as `shoppingcart.items.opt5` addresses nested object keys.
//! The empty path addresses the whole document. Only objects are traversed;
//! a path running through a scalar or array resolves to nothing.

use crate::SessionError;
use serde_json::{Map, Value};

/// Split a dotted path into its segments.
///
/// Returns an empty list for the empty path and rejects empty segments
/// (`a..b`, `.a`, `a.`).
pub fn segments(path: &str) -> Result<Vec<&str>, SessionError> {
    if path.is_empty() {
        return Ok(Vec::new());
    }

    let parts: Vec<&str> = path.split('.').collect();
    if parts.iter().any(|p| p.is_empty()) {
        return Err(SessionError::InvalidPath(path.to_string()));
    }
    Ok(parts)
}

/// Join path segments, skipping empty ones.
pub fn join(prefix: &str, rest: &str) -> String {
    match (prefix.is_empty(), rest.is_empty()) {
        (true, _) => rest.to_string(),
        (_, true) => prefix.to_string(),
        _ => format!("{}.{}", prefix, rest),
    }
}

/// Resolve `path` against `root`.
pub fn lookup<'a>(root: &'a Value, path: &str) -> Result<Option<&'a Value>, SessionError> {
    let mut current = root;
    for segment in segments(path)? {
        match current.get(segment) {
            Some(next) => current = next,
            None => return Ok(None),
        }
    }
    Ok(Some(current))
}

/// Write `value` at `path`, creating intermediate objects as needed.
///
/// Any non-object value standing in the way is replaced by an empty object.
pub fn insert(root: &mut Value, path: &str, value: Value) -> Result<(), SessionError> {
    let segments = segments(path)?;
    let Some((last, parents)) = segments.split_last() else {
        *root = value;
        return Ok(());
    };

    let mut current = root;
    for segment in parents {
        current = ensure_object(current)
            .entry(segment.to_string())
            .or_insert(Value::Null);
    }
    ensure_object(current).insert(last.to_string(), value);
    Ok(())
}

/// Remove the value at `path`, returning it if it was present.
///
/// Removing the empty path resets the document to an empty object.
pub fn remove(root: &mut Value, path: &str) -> Result<Option<Value>, SessionError> {
    let segments = segments(path)?;
    let Some((last, parents)) = segments.split_last() else {
        return Ok(Some(std::mem::replace(root, Value::Object(Map::new()))));
    };

    let mut current = root;
    for segment in parents {
        match current.get_mut(*segment) {
            Some(next) => current = next,
            None => return Ok(None),
        }
    }
    Ok(current.as_object_mut().and_then(|map| map.remove(*last)))
}

fn ensure_object(value: &mut Value) -> &mut Map<String, Value> {
    if !value.is_object() {
        *value = Value::Object(Map::new());
    }
    match value {
        Value::Object(map) => map,
        _ => unreachable!("value was just replaced with an object"),
    }
}
