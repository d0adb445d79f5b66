//! Navigation signals emitted by the guard chain and the request pipeline
//!
//! Neither component renders anything: they produce [`Navigation`] values
//! and hand them to a [`Navigator`] owned by the presentation layer.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::RwLock;
use url::form_urlencoded;

use crate::routes::paths;

/// Why a navigation was redirected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedirectReason {
    /// The session expired and could not be refreshed
    TokenExpired,
    LoginRequired,
    FeatureUnavailable,
    Forbidden,
    UpgradeRequired,
}

impl RedirectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RedirectReason::TokenExpired => "token_expired",
            RedirectReason::LoginRequired => "login_required",
            RedirectReason::FeatureUnavailable => "feature_unavailable",
            RedirectReason::Forbidden => "forbidden",
            RedirectReason::UpgradeRequired => "upgrade_required",
        }
    }
}

impl fmt::Display for RedirectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Redirect target plus the state payload the destination page displays
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Navigation {
    pub to: String,
    /// Location to return to after the destination is handled
    pub from: Option<String>,
    pub reason: RedirectReason,
    pub message: Option<String>,
}

impl Navigation {
    pub fn new(to: impl Into<String>, reason: RedirectReason) -> Self {
        Self {
            to: to.into(),
            from: None,
            reason,
            message: None,
        }
    }

    /// Login redirect remembering where the user was headed
    pub fn login(from: impl Into<String>, reason: RedirectReason) -> Self {
        Self::new(paths::LOGIN, reason).return_to(from)
    }

    pub fn return_to(mut self, from: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Location string; login targets carry `redirect` and `reason` query
    /// parameters for post-login return
    pub fn location(&self) -> String {
        if self.to != paths::LOGIN {
            return self.to.clone();
        }
        let mut query = form_urlencoded::Serializer::new(String::new());
        if let Some(from) = &self.from {
            query.append_pair("redirect", from);
        }
        query.append_pair("reason", self.reason.as_str());
        format!("{}?{}", self.to, query.finish())
    }
}

/// Receives navigation requests from the client core
pub trait Navigator: Send + Sync {
    /// Location the user is currently on, including the query string
    fn current_location(&self) -> String;

    fn navigate(&self, navigation: Navigation);
}

/// Navigator that tracks the current location and records every redirect
#[derive(Debug)]
pub struct HistoryNavigator {
    location: RwLock<String>,
    history: RwLock<Vec<Navigation>>,
}

impl HistoryNavigator {
    pub fn new(initial_location: impl Into<String>) -> Self {
        Self {
            location: RwLock::new(initial_location.into()),
            history: RwLock::new(Vec::new()),
        }
    }

    /// Record a user-driven location change
    pub fn set_location(&self, location: impl Into<String>) {
        let mut current = self
            .location
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *current = location.into();
    }

    pub fn history(&self) -> Vec<Navigation> {
        self.history
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn last(&self) -> Option<Navigation> {
        self.history().pop()
    }
}

impl Default for HistoryNavigator {
    fn default() -> Self {
        Self::new(paths::HOME)
    }
}

impl Navigator for HistoryNavigator {
    fn current_location(&self) -> String {
        self.location
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn navigate(&self, navigation: Navigation) {
        self.set_location(navigation.location());
        self.history
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(navigation);
    }
}
