//! Feature flags for staged rollout of portal functionality
//!
//! Flags default per runtime environment and can be overridden with
//! `MEDICREW_FEATURE_<NAME>` environment variables (`true` or `1` enables).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fmt;

use crate::config::Environment;

/// Named feature flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Feature {
    CoursePlayerUi,
    StudioEditor,
    DashboardAnalytics,
    AdvancedFilters,
    UseMockData,
    PremiumFeatures,
    AdminPanel,
    EnableDevTools,
    EnableEmailPreview,
}

impl Feature {
    pub const ALL: [Feature; 9] = [
        Feature::CoursePlayerUi,
        Feature::StudioEditor,
        Feature::DashboardAnalytics,
        Feature::AdvancedFilters,
        Feature::UseMockData,
        Feature::PremiumFeatures,
        Feature::AdminPanel,
        Feature::EnableDevTools,
        Feature::EnableEmailPreview,
    ];

    /// Environment variable suffix for this flag
    pub fn env_name(&self) -> &'static str {
        match self {
            Feature::CoursePlayerUi => "COURSE_PLAYER_UI",
            Feature::StudioEditor => "STUDIO_EDITOR",
            Feature::DashboardAnalytics => "DASHBOARD_ANALYTICS",
            Feature::AdvancedFilters => "ADVANCED_FILTERS",
            Feature::UseMockData => "USE_MOCK_DATA",
            Feature::PremiumFeatures => "PREMIUM_FEATURES",
            Feature::AdminPanel => "ADMIN_PANEL",
            Feature::EnableDevTools => "ENABLE_DEV_TOOLS",
            Feature::EnableEmailPreview => "ENABLE_EMAIL_PREVIEW",
        }
    }

    fn default_for(&self, environment: Environment) -> bool {
        let production = environment == Environment::Production;
        let development = environment == Environment::Development;
        match self {
            Feature::CoursePlayerUi | Feature::AdvancedFilters => !production,
            Feature::StudioEditor
            | Feature::DashboardAnalytics
            | Feature::PremiumFeatures
            | Feature::AdminPanel => true,
            Feature::UseMockData | Feature::EnableDevTools | Feature::EnableEmailPreview => {
                development
            }
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FEATURE_{}", self.env_name())
    }
}

/// Resolved flag values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureFlags {
    flags: HashMap<Feature, bool>,
}

impl FeatureFlags {
    /// Defaults for the given environment, without consulting env vars
    pub fn defaults(environment: Environment) -> Self {
        let flags = Feature::ALL
            .iter()
            .map(|feature| (*feature, feature.default_for(environment)))
            .collect();
        Self { flags }
    }

    /// Load flags from `MEDICREW_FEATURE_*` variables over environment defaults
    pub fn from_env(environment: Environment) -> Self {
        let mut flags = Self::defaults(environment);
        for feature in Feature::ALL {
            if let Ok(value) = env::var(format!("MEDICREW_FEATURE_{}", feature.env_name())) {
                let enabled = value.to_lowercase() == "true" || value == "1";
                flags.set(feature, enabled);
            }
        }
        flags
    }

    pub fn all_enabled() -> Self {
        Self {
            flags: Feature::ALL.iter().map(|feature| (*feature, true)).collect(),
        }
    }

    pub fn is_enabled(&self, feature: Feature) -> bool {
        self.flags.get(&feature).copied().unwrap_or(false)
    }

    /// True only if every listed flag is on
    pub fn are_enabled(&self, features: &[Feature]) -> bool {
        features.iter().all(|feature| self.is_enabled(*feature))
    }

    pub fn set(&mut self, feature: Feature, enabled: bool) {
        self.flags.insert(feature, enabled);
    }

    pub fn with(mut self, feature: Feature, enabled: bool) -> Self {
        self.set(feature, enabled);
        self
    }
}
