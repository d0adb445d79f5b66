//! Abstract storage interface for pluggable persistence backends
//!
//! Tokens and the cached session live behind a small string key-value
//! contract so the same auth state can run over memory, a JSON file, or any
//! other durable store.

use crate::error::Result;

/// Durable string key-value storage
pub trait KeyValueStore: Send + Sync {
    /// Read a value; `Ok(None)` when the key is absent
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a key; removing an absent key is not an error
    fn remove(&self, key: &str) -> Result<()>;

    /// Backend name for logging/debugging
    fn backend_name(&self) -> &'static str;
}
