//! Path constants for redirect targets and gated areas

pub const HOME: &str = "/";
pub const LOGIN: &str = "/login";
pub const SETTINGS: &str = "/settings";
pub const ADD_ACCOUNT: &str = "/settings/add-account";

pub const FORBIDDEN: &str = "/403";
pub const NOT_FOUND: &str = "/404";
pub const UPGRADE: &str = "/upgrade";

pub const STUDENT_BASE: &str = "/student";
pub const STUDENT_DASHBOARD: &str = "/student/dashboard";
pub const MASTER_BASE: &str = "/master";
pub const MASTER_DASHBOARD: &str = "/master/dashboard";
pub const ADMIN_BASE: &str = "/admin";
pub const ADMIN_DASHBOARD: &str = "/admin/dashboard";

pub const STUDIO_EDIT: &str = "/studio/edit";
pub const DEV_EMAIL_PREVIEW: &str = "/dev/email-preview";

/// Substitute `:name` segments of a pattern, in order
pub fn fill(pattern: &str, values: &[&str]) -> String {
    let mut values = values.iter();
    pattern
        .split('/')
        .map(|segment| match segment.strip_prefix(':') {
            Some(_) => values.next().copied().unwrap_or(segment),
            None => segment,
        })
        .collect::<Vec<_>>()
        .join("/")
}
