//! Medicrew client core - authenticated API access and route guarding
//!
//! This library provides the token store, the request pipeline with
//! single-flight token refresh, and the guard chain that gates portal
//! navigation by feature flag, session, role and license.

pub mod auth;
pub mod config;
pub mod constants;
pub mod error;
pub mod features;
pub mod guards;
pub mod http;
pub mod navigation;
pub mod routes;
pub mod services;
pub mod storage;

// Re-export main components
pub use auth::{AuthState, Role, SessionState, TokenPair, TokenStore, User};
pub use config::{ClientConfig, Environment};
pub use error::{ClientError, ErrorKind, Result};
pub use features::{Feature, FeatureFlags};
pub use guards::{GuardChain, GuardDecision};
pub use http::{ApiClient, RequestOptions};
pub use navigation::{HistoryNavigator, Navigation, Navigator, RedirectReason};
pub use routes::{RouteDeclaration, RouteTable};
