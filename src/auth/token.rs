use log::error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::constants::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
use crate::storage::KeyValueStore;

/// Access + refresh token issued by the backend authentication service
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl TokenPair {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }
}

// Tokens never end up in logs
impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

/// Durable holder for the token pair
///
/// Storage failures are logged and read as "no token"; writes never fail
/// the caller.
#[derive(Clone)]
pub struct TokenStore {
    storage: Arc<dyn KeyValueStore>,
}

impl TokenStore {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self { storage }
    }

    /// The backing store, shared with the session cache
    pub fn storage(&self) -> &Arc<dyn KeyValueStore> {
        &self.storage
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.storage.get(key) {
            Ok(value) => value.filter(|v| !v.is_empty()),
            Err(e) => {
                error!(
                    "Token storage ({}) unavailable reading {}: {}",
                    self.storage.backend_name(),
                    key,
                    e
                );
                None
            }
        }
    }

    fn write(&self, key: &str, value: &str) {
        if let Err(e) = self.storage.set(key, value) {
            error!(
                "Token storage ({}) unavailable writing {}: {}",
                self.storage.backend_name(),
                key,
                e
            );
        }
    }

    fn delete(&self, key: &str) {
        if let Err(e) = self.storage.remove(key) {
            error!(
                "Token storage ({}) unavailable removing {}: {}",
                self.storage.backend_name(),
                key,
                e
            );
        }
    }

    pub fn access_token(&self) -> Option<String> {
        self.read(ACCESS_TOKEN_KEY)
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.read(REFRESH_TOKEN_KEY)
    }

    /// Both tokens, or `None` unless an access token is present
    pub fn get(&self) -> Option<TokenPair> {
        let access_token = self.access_token()?;
        Some(TokenPair {
            access_token,
            refresh_token: self.refresh_token().unwrap_or_default(),
        })
    }

    pub fn set(&self, pair: &TokenPair) {
        self.write(ACCESS_TOKEN_KEY, &pair.access_token);
        if !pair.refresh_token.is_empty() {
            self.write(REFRESH_TOKEN_KEY, &pair.refresh_token);
        }
    }

    pub fn set_access_token(&self, token: &str) {
        self.write(ACCESS_TOKEN_KEY, token);
    }

    pub fn clear(&self) {
        self.delete(ACCESS_TOKEN_KEY);
        self.delete(REFRESH_TOKEN_KEY);
    }

    /// True iff an access token is present
    pub fn has(&self) -> bool {
        self.access_token().is_some()
    }
}
