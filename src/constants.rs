// Backend defaults
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3001/api";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_REFRESH_PATH: &str = "/auth/access-token";
pub const DEFAULT_STORAGE_FILE: &str = "medicrew_storage.json";

// Persistent storage keys
pub const ACCESS_TOKEN_KEY: &str = "medicrew_access_token";
pub const REFRESH_TOKEN_KEY: &str = "medicrew_refresh_token";
pub const USER_KEY: &str = "medicrew_user";

// Guard redirect messages
pub const FEATURE_UNAVAILABLE_MESSAGE: &str = "This feature is not available.";
pub const PRO_LICENSE_REQUIRED_MESSAGE: &str = "This feature requires a Pro license.";
pub const SESSION_EXPIRED_MESSAGE: &str = "The token has expired or there is no session.";
