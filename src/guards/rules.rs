use super::{Guard, GuardOutcome};
use crate::auth::SessionState;
use crate::constants::{FEATURE_UNAVAILABLE_MESSAGE, PRO_LICENSE_REQUIRED_MESSAGE};
use crate::features::FeatureFlags;
use crate::navigation::{Navigation, RedirectReason};
use crate::routes::{paths, RouteDeclaration};

/// Sends flagged routes home while their feature is off
pub struct FeatureGuard {
    flags: FeatureFlags,
}

impl FeatureGuard {
    pub fn new(flags: FeatureFlags) -> Self {
        Self { flags }
    }
}

impl Guard for FeatureGuard {
    fn evaluate(&self, _: &SessionState, route: &RouteDeclaration, location: &str) -> GuardOutcome {
        match route.required_feature {
            Some(feature) if !self.flags.is_enabled(feature) => GuardOutcome::Redirect(
                Navigation::new(paths::HOME, RedirectReason::FeatureUnavailable)
                    .return_to(location)
                    .message(FEATURE_UNAVAILABLE_MESSAGE),
            ),
            _ => GuardOutcome::Continue,
        }
    }

    fn name(&self) -> &'static str {
        "feature"
    }
}

/// Requires a session on protected routes
pub struct AuthenticationGuard;

impl Guard for AuthenticationGuard {
    fn evaluate(
        &self,
        session: &SessionState,
        route: &RouteDeclaration,
        location: &str,
    ) -> GuardOutcome {
        if route.is_public() || session.is_authenticated() {
            GuardOutcome::Continue
        } else {
            GuardOutcome::Redirect(Navigation::login(location, RedirectReason::LoginRequired))
        }
    }

    fn name(&self) -> &'static str {
        "authentication"
    }
}

/// Enforces the route's minimum role
pub struct RoleGuard;

impl Guard for RoleGuard {
    fn evaluate(
        &self,
        session: &SessionState,
        route: &RouteDeclaration,
        location: &str,
    ) -> GuardOutcome {
        match route.required_role {
            Some(required) if !session.has_role(required) => GuardOutcome::Redirect(
                Navigation::new(route.redirect_to.clone(), RedirectReason::Forbidden)
                    .return_to(location)
                    .message(format!("This page requires {} role or higher.", required)),
            ),
            _ => GuardOutcome::Continue,
        }
    }

    fn name(&self) -> &'static str {
        "role"
    }
}

/// Sends non-premium users to the upgrade page on premium routes
pub struct PremiumGuard;

impl Guard for PremiumGuard {
    fn evaluate(
        &self,
        session: &SessionState,
        route: &RouteDeclaration,
        location: &str,
    ) -> GuardOutcome {
        if route.require_premium && !session.is_premium_user() {
            GuardOutcome::Redirect(
                Navigation::new(paths::UPGRADE, RedirectReason::UpgradeRequired)
                    .return_to(location)
                    .message(PRO_LICENSE_REQUIRED_MESSAGE),
            )
        } else {
            GuardOutcome::Continue
        }
    }

    fn name(&self) -> &'static str {
        "premium"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Account, License, Role, User};
    use crate::features::Feature;

    fn session(role: Role, license: &str) -> SessionState {
        SessionState::Active(User::new(
            "u1",
            "Jiwoo",
            Account {
                account_id: "acc_1".to_string(),
                organization_id: None,
                organization_name: "Seoul Nursing".to_string(),
                role,
                license: License::new(license),
                license_type: None,
                is_active: true,
            },
        ))
    }

    #[test]
    fn test_feature_guard_ignores_session() {
        let guard =
            FeatureGuard::new(FeatureFlags::all_enabled().with(Feature::StudioEditor, false));
        let route = RouteDeclaration::public("/studio/edit").feature(Feature::StudioEditor);

        match guard.evaluate(&SessionState::Anonymous, &route, "/studio/edit") {
            GuardOutcome::Redirect(nav) => {
                assert_eq!(nav.to, paths::HOME);
                assert_eq!(nav.message.as_deref(), Some(FEATURE_UNAVAILABLE_MESSAGE));
            }
            GuardOutcome::Continue => panic!("expected redirect"),
        }
    }

    #[test]
    fn test_role_guard_uses_declared_redirect() {
        let route = RouteDeclaration::protected("/admin/*", Role::Admin).redirect_to("/404");
        let session = session(Role::Master, "pro_univ_master");
        match RoleGuard.evaluate(&session, &route, "/admin/users") {
            GuardOutcome::Redirect(nav) => {
                assert_eq!(nav.to, "/404");
                assert_eq!(
                    nav.message.as_deref(),
                    Some("This page requires admin role or higher.")
                );
            }
            GuardOutcome::Continue => panic!("expected redirect"),
        }
    }

    #[test]
    fn test_premium_guard_masters_always_pass() {
        let route = RouteDeclaration::protected("/studio/edit", Role::Master).premium();
        assert_eq!(
            PremiumGuard.evaluate(&session(Role::Master, "free"), &route, "/studio/edit"),
            GuardOutcome::Continue
        );
    }

    #[test]
    fn test_authentication_guard_skips_public_routes() {
        let route = RouteDeclaration::public("/open-class-list");
        assert_eq!(
            AuthenticationGuard.evaluate(&SessionState::Anonymous, &route, "/open-class-list"),
            GuardOutcome::Continue
        );
    }
}
