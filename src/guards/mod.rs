//! Navigation guard chain
//!
//! Guards are pure predicates over a session snapshot and a route
//! declaration. [`GuardChain`] runs them in order and stops at the first
//! redirect. Nothing here mutates session state or performs I/O.

pub mod rules;

use log::debug;

use crate::auth::{AuthState, SessionState};
use crate::features::FeatureFlags;
use crate::navigation::Navigation;
use crate::routes::{RouteDeclaration, RouteTable};

pub use rules::{AuthenticationGuard, FeatureGuard, PremiumGuard, RoleGuard};

/// Result of a single guard
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    Continue,
    Redirect(Navigation),
}

/// Result of the whole chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// The session is still hydrating; render a neutral loading state
    Pending,
    Allow,
    Redirect(Navigation),
}

impl GuardDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GuardDecision::Allow)
    }

    pub fn redirect(&self) -> Option<&Navigation> {
        match self {
            GuardDecision::Redirect(navigation) => Some(navigation),
            _ => None,
        }
    }
}

/// A navigation predicate
pub trait Guard: Send + Sync {
    /// `location` is the requested location, used as the return target
    fn evaluate(
        &self,
        session: &SessionState,
        route: &RouteDeclaration,
        location: &str,
    ) -> GuardOutcome;

    /// Guard name for logging
    fn name(&self) -> &'static str;
}

/// Ordered guard dispatcher
pub struct GuardChain {
    guards: Vec<Box<dyn Guard>>,
}

impl GuardChain {
    /// The portal chain: feature flag, authentication, role, premium
    pub fn new(flags: FeatureFlags) -> Self {
        Self::empty()
            .with_guard(Box::new(FeatureGuard::new(flags)))
            .with_guard(Box::new(AuthenticationGuard))
            .with_guard(Box::new(RoleGuard))
            .with_guard(Box::new(PremiumGuard))
    }

    pub fn empty() -> Self {
        Self { guards: Vec::new() }
    }

    pub fn with_guard(mut self, guard: Box<dyn Guard>) -> Self {
        self.guards.push(guard);
        self
    }

    pub fn guard_names(&self) -> Vec<&'static str> {
        self.guards.iter().map(|guard| guard.name()).collect()
    }

    /// Decide a navigation against a session snapshot
    pub fn check(
        &self,
        session: &SessionState,
        route: &RouteDeclaration,
        location: &str,
    ) -> GuardDecision {
        if session.is_loading() {
            return GuardDecision::Pending;
        }

        for guard in &self.guards {
            if let GuardOutcome::Redirect(navigation) = guard.evaluate(session, route, location) {
                debug!(
                    "{} guard redirected {} to {}",
                    guard.name(),
                    location,
                    navigation.to
                );
                return GuardDecision::Redirect(navigation);
            }
        }
        GuardDecision::Allow
    }

    /// Resolve `location` in `routes` and decide it for the current session
    pub fn authorize(
        &self,
        auth: &AuthState,
        routes: &RouteTable,
        location: &str,
    ) -> GuardDecision {
        let route = routes.resolve(location);
        self.check(&auth.snapshot(), &route, location)
    }
}
