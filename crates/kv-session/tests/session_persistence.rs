//! Session persistence through the in-process cache.

use kv_session::prelude::*;
use serde_json::json;

#[test]
fn test_save_and_reload() {
    let cache = Cache::open("session-persistence-reload").unwrap();
    let id = SessionId::new("reload");

    let mut session = Session::load(cache, id.clone()).unwrap();
    session.put("shoppingcart.rowcount", json!(2)).unwrap();
    session.put("shoppingcart.items", json!(null)).unwrap();
    session.save().unwrap();
    assert_eq!(session.version(), 1);
    assert!(!session.is_dirty());

    let reloaded = Session::load(Cache::open("session-persistence-reload").unwrap(), id).unwrap();
    assert_eq!(reloaded.version(), 1);
    assert_eq!(reloaded.get("shoppingcart.rowcount").unwrap(), Some(json!(2)));
    assert!(reloaded.has("shoppingcart").unwrap());
    assert!(!reloaded.has("shoppingcart.items").unwrap());
}

#[test]
fn test_version_increments_per_save() {
    let cache = Cache::in_memory();
    let mut session = Session::start(cache);

    for n in 1..=3 {
        session.put("counter", json!(n)).unwrap();
        session.save().unwrap();
        assert_eq!(session.version(), n);
    }
}

#[test]
fn test_unsaved_changes_are_not_visible() {
    let id = SessionId::new("unsaved");
    let mut session =
        Session::load(Cache::open("session-persistence-unsaved").unwrap(), id.clone()).unwrap();
    session.put("shoppingcart.rowcount", json!(1)).unwrap();

    let other = Session::load(Cache::open("session-persistence-unsaved").unwrap(), id).unwrap();
    assert!(!other.has("shoppingcart").unwrap());
}

#[test]
fn test_destroy_removes_record() {
    let id = SessionId::new("destroy");
    let cache = Cache::open("session-persistence-destroy").unwrap();

    let mut session = Session::load(cache, id.clone()).unwrap();
    session.put("shoppingcart.rowcount", json!(1)).unwrap();
    session.save().unwrap();

    let cache = Cache::open("session-persistence-destroy").unwrap();
    assert!(cache.exists("session:destroy").unwrap());

    session.destroy().unwrap();
    assert!(!cache.exists("session:destroy").unwrap());
}
