use std::sync::Arc;
use store::{
    migrate_scope, JsonFileStore, KeyValueStore, MemoryStore, ScopedStore, StoreFactory,
    StoreKind,
};

#[test]
fn memory_store_get_set_delete() {
    let store = MemoryStore::new();
    assert!(store.get("clock", "state").unwrap().is_none());

    store.set("clock", "state", b"{}").unwrap();
    assert_eq!(store.get("clock", "state").unwrap().as_deref(), Some(&b"{}"[..]));
    assert_eq!(store.keys("clock").unwrap(), vec!["state".to_string()]);

    assert!(store.delete("clock", "state").unwrap());
    assert!(!store.delete("clock", "state").unwrap());
    assert!(store.keys("clock").unwrap().is_empty());
}

#[test]
fn json_file_store_persists_across_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("store.json");

    {
        let store = JsonFileStore::open(&path).expect("open store");
        store.set("main_window", "dashboards", b"[1,2]").unwrap();
        store.set("custom_list_a", "items", &[0, 159, 255]).unwrap();
    }

    let reopened = JsonFileStore::open(&path).expect("reopen store");
    assert_eq!(
        reopened.get("main_window", "dashboards").unwrap().as_deref(),
        Some(&b"[1,2]"[..])
    );
    assert_eq!(
        reopened.get("custom_list_a", "items").unwrap(),
        Some(vec![0, 159, 255])
    );
}

#[test]
fn json_file_store_rejects_corrupt_values() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("store.json");
    std::fs::write(&path, r#"{"clock": {"state": "zz"}}"#).unwrap();

    let err = JsonFileStore::open(&path).unwrap_err();
    assert!(err.to_string().contains("clock/state"));
}

#[test]
fn migrate_scope_moves_every_key() {
    let store = MemoryStore::new();
    store.set("custom_list_foo", "items", b"[1]").unwrap();
    store.set("custom_list_foo", "columns", b"[]").unwrap();
    store.set("other", "items", b"x").unwrap();

    let moved = migrate_scope(&store, "custom_list_foo", "custom_list_bar").unwrap();
    assert_eq!(moved, 2);
    assert!(store.keys("custom_list_foo").unwrap().is_empty());
    assert_eq!(
        store.get("custom_list_bar", "items").unwrap().as_deref(),
        Some(&b"[1]"[..])
    );
    assert_eq!(store.get("other", "items").unwrap().as_deref(), Some(&b"x"[..]));
}

#[test]
fn migrate_scope_to_same_scope_is_noop() {
    let store = MemoryStore::new();
    store.set("a", "k", b"v").unwrap();
    assert_eq!(migrate_scope(&store, "a", "a").unwrap(), 0);
    assert_eq!(store.get("a", "k").unwrap().as_deref(), Some(&b"v"[..]));
}

#[test]
fn scoped_store_json_and_rebind() {
    let backing: Arc<dyn KeyValueStore> = StoreFactory::open(&StoreKind::Memory).unwrap();
    let mut scoped = ScopedStore::new(backing.clone(), "code_viewer_notes");
    scoped.set_json("language", "rust").unwrap();

    let language: Option<String> = scoped.get_json("language").unwrap();
    assert_eq!(language.as_deref(), Some("rust"));

    scoped.rebind("code_viewer_other");
    assert_eq!(scoped.scope(), "code_viewer_other");
    let missing: Option<String> = scoped.get_json("language").unwrap();
    assert!(missing.is_none());
    assert!(backing.get("code_viewer_notes", "language").unwrap().is_some());
}
