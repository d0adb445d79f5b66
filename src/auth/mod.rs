//! Session, token and role handling

pub mod refresh;
pub mod session;
pub mod token;
pub mod user;

// Re-export main components
pub use refresh::{HttpTokenRefresher, RefreshCoordinator, RefreshedTokens, TokenRefresher};
pub use session::{AuthState, SessionState};
pub use token::{TokenPair, TokenStore};
pub use user::{
    Account, CurrentAccount, License, LicenseType, NewAccount, ProfileUpdate, Role, User,
};
