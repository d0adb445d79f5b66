use std::sync::Arc;
use tempfile::tempdir;

use medicrew_client::auth::{TokenPair, TokenStore};
use medicrew_client::storage::{FileStore, MemoryStore};

#[test]
fn test_clear_is_idempotent() {
    let store = TokenStore::new(Arc::new(MemoryStore::new()));
    store.set(&TokenPair::new("T1", "R1"));

    store.clear();
    assert!(!store.has());
    assert_eq!(store.get(), None);

    store.clear();
    assert!(!store.has());
    assert_eq!(store.get(), None);
}

#[test]
fn test_has_tracks_access_token_only() {
    let store = TokenStore::new(Arc::new(MemoryStore::new()));
    assert!(!store.has());

    store.set(&TokenPair::new("", "R1"));
    assert!(!store.has());
    assert_eq!(store.refresh_token(), Some("R1".to_string()));

    store.set_access_token("T1");
    assert!(store.has());
    assert_eq!(store.get(), Some(TokenPair::new("T1", "R1")));
}

#[test]
fn test_tokens_persist_in_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tokens.json");

    TokenStore::new(Arc::new(FileStore::new(&path))).set(&TokenPair::new("T1", "R1"));

    let reopened = TokenStore::new(Arc::new(FileStore::new(&path)));
    assert_eq!(reopened.get(), Some(TokenPair::new("T1", "R1")));
}

#[test]
fn test_unreadable_file_means_no_token() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tokens.json");
    std::fs::write(&path, "{ not json").unwrap();

    let store = TokenStore::new(Arc::new(FileStore::new(&path)));
    assert!(!store.has());
    assert_eq!(store.get(), None);
}
