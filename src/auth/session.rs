//! Auth state provider
//!
//! [`AuthState`] is the single injected owner of the token store and the
//! cached session. The request pipeline and the guard chain both receive it
//! at construction instead of reaching for ambient globals.
//!
//! Lifecycle: `new` (session `Loading`) → `hydrate` (read the persisted
//! session) → mutations (login, refresh, profile/account changes, logout).

use log::{debug, error, info, warn};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

use super::token::{TokenPair, TokenStore};
use super::user::{Account, CurrentAccount, License, NewAccount, ProfileUpdate, Role, User};
use crate::constants::USER_KEY;
use crate::error::{ClientError, Result};
use crate::storage::KeyValueStore;

/// Session as seen by guards and pages
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// Initial hydration has not finished; no access decision may be made
    Loading,
    Anonymous,
    Active(User),
}

impl SessionState {
    pub fn is_loading(&self) -> bool {
        matches!(self, SessionState::Loading)
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            SessionState::Active(user) => Some(user),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user().map(|user| user.is_authenticated).unwrap_or(false)
    }

    /// Current role; `visitor` without a session
    pub fn role(&self) -> Role {
        self.user().map(User::role).unwrap_or(Role::Visitor)
    }

    pub fn license(&self) -> Option<&License> {
        self.user().map(User::license)
    }

    pub fn has_role(&self, required: Role) -> bool {
        self.role().includes(required)
    }

    /// Masters and admins always count as premium; others need a `pro*` license
    pub fn is_premium_user(&self) -> bool {
        match self.role() {
            Role::Master | Role::Admin => true,
            _ => self.license().map(License::is_pro).unwrap_or(false),
        }
    }

    /// Free scenarios are open to everyone, premium ones need premium access
    pub fn can_access_scenario(&self, scenario_is_premium: bool) -> bool {
        !scenario_is_premium || self.is_premium_user()
    }

    /// Only class licenses grant class entry without a purchase
    pub fn can_join_class(&self) -> bool {
        if self.role() == Role::Visitor {
            return false;
        }
        self.license()
            .map(License::is_class_license)
            .unwrap_or(false)
    }
}

struct AuthStateInner {
    tokens: TokenStore,
    session: RwLock<SessionState>,
}

/// Shared auth context: tokens plus cached session
#[derive(Clone)]
pub struct AuthState {
    inner: Arc<AuthStateInner>,
}

impl AuthState {
    /// Create an auth state over the given storage; the session starts `Loading`
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            inner: Arc::new(AuthStateInner {
                tokens: TokenStore::new(storage),
                session: RwLock::new(SessionState::Loading),
            }),
        }
    }

    /// Create and immediately hydrate from storage
    pub fn hydrated(storage: Arc<dyn KeyValueStore>) -> Self {
        let state = Self::new(storage);
        state.hydrate();
        state
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.inner.tokens
    }

    fn read_session(&self) -> RwLockReadGuard<'_, SessionState> {
        self.inner
            .session
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_session(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.inner
            .session
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Load the persisted session; a corrupt record clears tokens and session
    pub fn hydrate(&self) {
        let storage = self.inner.tokens.storage();
        let restored = match storage.get(USER_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<User>(&raw) {
                Ok(mut user) => {
                    user.normalize_accounts();
                    debug!("Restored session for user {}", user.id);
                    SessionState::Active(user)
                }
                Err(e) => {
                    warn!("Discarding unreadable saved session: {}", e);
                    self.discard_persisted_session();
                    self.inner.tokens.clear();
                    SessionState::Anonymous
                }
            },
            Ok(None) => SessionState::Anonymous,
            Err(e) => {
                error!("Session storage unavailable during hydration: {}", e);
                SessionState::Anonymous
            }
        };
        *self.write_session() = restored;
    }

    /// Point-in-time copy of the session for guard evaluation
    pub fn snapshot(&self) -> SessionState {
        self.read_session().clone()
    }

    pub fn current_user(&self) -> Option<User> {
        self.read_session().user().cloned()
    }

    pub fn is_authenticated(&self) -> bool {
        self.read_session().is_authenticated()
    }

    pub fn current_role(&self) -> Role {
        self.read_session().role()
    }

    pub fn current_license(&self) -> Option<License> {
        self.read_session().license().cloned()
    }

    pub fn has_role(&self, required: Role) -> bool {
        self.read_session().has_role(required)
    }

    pub fn is_premium_user(&self) -> bool {
        self.read_session().is_premium_user()
    }

    pub fn can_access_scenario(&self, scenario_is_premium: bool) -> bool {
        self.read_session().can_access_scenario(scenario_is_premium)
    }

    pub fn can_join_class(&self) -> bool {
        self.read_session().can_join_class()
    }

    fn persist(&self, user: &User) {
        let storage = self.inner.tokens.storage();
        let result = serde_json::to_string(user)
            .map_err(ClientError::from)
            .and_then(|raw| storage.set(USER_KEY, &raw));
        if let Err(e) = result {
            error!("Failed to persist session for user {}: {}", user.id, e);
        }
    }

    fn discard_persisted_session(&self) {
        if let Err(e) = self.inner.tokens.storage().remove(USER_KEY) {
            error!("Failed to remove saved session: {}", e);
        }
    }

    /// Start a session; tokens are stored when supplied
    pub fn login(&self, user: User, tokens: Option<&TokenPair>) {
        let mut user = user;
        user.normalize_accounts();
        if let Some(tokens) = tokens {
            self.inner.tokens.set(tokens);
        }
        self.persist(&user);
        info!("User {} logged in as {}", user.id, user.role());
        *self.write_session() = SessionState::Active(user);
    }

    /// Drop session and tokens
    pub fn logout(&self) {
        *self.write_session() = SessionState::Anonymous;
        self.discard_persisted_session();
        self.inner.tokens.clear();
        info!("Session cleared");
    }

    /// Apply `change` to the active user, persist and return the new value
    fn modify_user<F>(&self, change: F) -> Result<User>
    where
        F: FnOnce(&mut User) -> Result<()>,
    {
        let mut session = self.write_session();
        let user = match &mut *session {
            SessionState::Active(user) => user,
            _ => return Err(ClientError::Session("No active session".to_string())),
        };

        let mut updated = user.clone();
        change(&mut updated)?;
        self.persist(&updated);
        *user = updated.clone();
        Ok(updated)
    }

    /// Update profile fields; role and license apply to the current account
    /// and its entry in `accounts`
    pub fn update_profile(&self, update: ProfileUpdate) -> Result<User> {
        self.modify_user(|user| {
            if let Some(name) = update.name {
                user.name = name;
            }
            if let Some(email) = update.email {
                user.email = email;
            }
            if let Some(image) = update.profile_image_url {
                user.profile_image_url = image;
            }

            if update.role.is_some() || update.license.is_some() {
                let current_id = user.current_account.account_id.clone();
                if let Some(role) = update.role {
                    user.current_account.role = role;
                }
                if let Some(license) = &update.license {
                    user.current_account.license = license.clone();
                }
                for account in user
                    .accounts
                    .iter_mut()
                    .filter(|account| account.account_id == current_id)
                {
                    if let Some(role) = update.role {
                        account.role = role;
                    }
                    if let Some(license) = &update.license {
                        account.license = license.clone();
                    }
                }
            }
            Ok(())
        })
    }

    /// Make another of the user's accounts the current one
    pub fn switch_account(&self, account_id: &str) -> Result<User> {
        self.modify_user(|user| {
            let target = user.find_account(account_id).ok_or_else(|| {
                ClientError::Session(format!("Account not found: {}", account_id))
            })?;
            user.current_account = CurrentAccount::from(target);
            for account in &mut user.accounts {
                account.is_active = account.account_id == account_id;
            }
            Ok(())
        })
    }

    /// Attach a new inactive account to the user
    pub fn add_account(&self, new_account: NewAccount) -> Result<Account> {
        let account = Account {
            account_id: new_account
                .account_id
                .unwrap_or_else(|| format!("acc_{}", Uuid::new_v4().simple())),
            organization_id: new_account.organization_id,
            organization_name: new_account
                .organization_name
                .unwrap_or_else(|| "Unknown".to_string()),
            role: new_account.role.unwrap_or(Role::Guest),
            license: new_account.license.unwrap_or_else(License::free),
            license_type: new_account.license_type,
            is_active: false,
        };

        let added = account.clone();
        self.modify_user(move |user| {
            if user.find_account(&account.account_id).is_some() {
                return Err(ClientError::Session(format!(
                    "Account already exists: {}",
                    account.account_id
                )));
            }
            user.accounts.push(account);
            Ok(())
        })?;
        Ok(added)
    }
}
