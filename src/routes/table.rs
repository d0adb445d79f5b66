use log::debug;

use super::paths;
use crate::auth::Role;
use crate::features::Feature;

/// Access requirements attached to a route
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDeclaration {
    /// `/`-separated pattern; `:name` matches one segment, a trailing `*`
    /// matches the rest of the path
    pub pattern: String,
    /// `None` for public routes, which skip the auth and role guards
    pub required_role: Option<Role>,
    pub require_premium: bool,
    pub required_feature: Option<Feature>,
    /// Target of a failed role check
    pub redirect_to: String,
}

impl RouteDeclaration {
    pub fn public(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            required_role: None,
            require_premium: false,
            required_feature: None,
            redirect_to: paths::FORBIDDEN.to_string(),
        }
    }

    pub fn protected(pattern: impl Into<String>, role: Role) -> Self {
        Self {
            required_role: Some(role),
            ..Self::public(pattern)
        }
    }

    pub fn premium(mut self) -> Self {
        self.require_premium = true;
        self
    }

    pub fn feature(mut self, feature: Feature) -> Self {
        self.required_feature = Some(feature);
        self
    }

    pub fn redirect_to(mut self, path: impl Into<String>) -> Self {
        self.redirect_to = path.into();
        self
    }

    pub fn is_public(&self) -> bool {
        self.required_role.is_none()
    }

    /// Whether `path` (without query string) matches this pattern
    pub fn matches(&self, path: &str) -> bool {
        let mut pattern = segments(&self.pattern);
        let mut target = segments(path);

        loop {
            match (pattern.next(), target.next()) {
                (Some("*"), _) => return true,
                (None, None) => return true,
                (Some(expected), Some(actual)) => {
                    if !expected.starts_with(':') && expected != actual {
                        return false;
                    }
                }
                _ => return false,
            }
        }
    }
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|segment| !segment.is_empty())
}

/// Ordered route declarations; the first match wins
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<RouteDeclaration>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_route(mut self, route: RouteDeclaration) -> Self {
        self.routes.push(route);
        self
    }

    pub fn routes(&self) -> &[RouteDeclaration] {
        &self.routes
    }

    /// Declaration for a concrete location; unknown paths are public
    pub fn resolve(&self, location: &str) -> RouteDeclaration {
        let path = location
            .split(|c| c == '?' || c == '#')
            .next()
            .unwrap_or(location);

        match self.routes.iter().find(|route| route.matches(path)) {
            Some(route) => route.clone(),
            None => {
                debug!("No route declaration for {}, treating as public", path);
                RouteDeclaration::public(path)
            }
        }
    }

    /// Portal routes and their access requirements
    pub fn portal() -> Self {
        Self::new()
            .with_route(
                RouteDeclaration::protected(format!("{}/*", paths::ADMIN_BASE), Role::Admin)
                    .feature(Feature::AdminPanel),
            )
            .with_route(RouteDeclaration::protected(
                format!("{}/*", paths::MASTER_BASE),
                Role::Master,
            ))
            .with_route(RouteDeclaration::protected(
                format!("{}/*", paths::STUDENT_BASE),
                Role::Student,
            ))
            .with_route(
                RouteDeclaration::protected(format!("{}/*", paths::STUDIO_EDIT), Role::Master)
                    .premium()
                    .feature(Feature::StudioEditor),
            )
            .with_route(
                RouteDeclaration::public(paths::DEV_EMAIL_PREVIEW)
                    .feature(Feature::EnableEmailPreview),
            )
            .with_route(RouteDeclaration::protected(
                format!("{}/*", paths::SETTINGS),
                Role::Guest,
            ))
            .with_route(RouteDeclaration::protected("/class/:classId/*", Role::Student))
    }
}
