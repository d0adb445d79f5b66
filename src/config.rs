//! Client configuration module
//! Handles runtime parameters for the API client, storage and guards

use crate::constants::{
    DEFAULT_API_BASE_URL, DEFAULT_REFRESH_PATH, DEFAULT_REQUEST_TIMEOUT_MS, DEFAULT_STORAGE_FILE,
};
use crate::error::{ClientError, Result};
use crate::features::FeatureFlags;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

/// Runtime environment of the portal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl FromStr for Environment {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "test" => Ok(Environment::Test),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(ClientError::Config(format!(
                "Unknown environment '{}', expected development, test or production",
                other
            ))),
        }
    }
}

/// Client configuration parameters
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL every endpoint path is appended to
    pub api_base_url: String,
    /// Default per-request timeout
    pub request_timeout: Duration,
    /// Path of the token refresh endpoint, relative to the base URL
    pub refresh_path: String,
    /// File backing the persistent token/session store
    pub storage_path: PathBuf,
    pub environment: Environment,
    pub feature_flags: FeatureFlags,
}

impl ClientConfig {
    /// Create a test configuration pointing at the given backend
    pub fn for_testing(api_base_url: &str) -> Self {
        Self {
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            refresh_path: DEFAULT_REFRESH_PATH.to_string(),
            storage_path: env::temp_dir().join(DEFAULT_STORAGE_FILE),
            environment: Environment::Test,
            feature_flags: FeatureFlags::all_enabled(),
        }
    }

    /// Validate that the base URL is an absolute http(s) URL
    fn validate_base_url(base_url: &str) -> Result<()> {
        let parsed = Url::parse(base_url).map_err(|e| {
            ClientError::Config(format!("Invalid API base URL '{}': {}", base_url, e))
        })?;

        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(ClientError::Config(format!(
                "API base URL must use http or https, got '{}'",
                parsed.scheme()
            )));
        }

        Ok(())
    }

    /// Load configuration from environment variables if available
    pub fn from_env() -> Result<Self> {
        let environment = match env::var("MEDICREW_ENV") {
            Ok(value) => value.parse()?,
            Err(_) => Environment::Development,
        };

        let api_base_url = env::var("MEDICREW_API_BASE_URL")
            .unwrap_or(DEFAULT_API_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        Self::validate_base_url(&api_base_url)?;

        let timeout_ms = match env::var("MEDICREW_REQUEST_TIMEOUT_MS") {
            Ok(value) => value.parse::<u64>().map_err(|_| {
                ClientError::Config(format!(
                    "MEDICREW_REQUEST_TIMEOUT_MS must be a number of milliseconds, got '{}'",
                    value
                ))
            })?,
            Err(_) => DEFAULT_REQUEST_TIMEOUT_MS,
        };

        if timeout_ms == 0 {
            return Err(ClientError::Config(
                "MEDICREW_REQUEST_TIMEOUT_MS must be greater than zero".to_string(),
            ));
        }

        let refresh_path =
            env::var("MEDICREW_REFRESH_PATH").unwrap_or(DEFAULT_REFRESH_PATH.to_string());
        if !refresh_path.starts_with('/') {
            return Err(ClientError::Config(format!(
                "MEDICREW_REFRESH_PATH must start with '/', got '{}'",
                refresh_path
            )));
        }

        let storage_path = env::var("MEDICREW_STORAGE_DIR")
            .map(|dir| PathBuf::from(dir).join(DEFAULT_STORAGE_FILE))
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_STORAGE_FILE));

        Ok(Self {
            api_base_url,
            request_timeout: Duration::from_millis(timeout_ms),
            refresh_path,
            storage_path,
            environment,
            feature_flags: FeatureFlags::from_env(environment),
        })
    }
}
