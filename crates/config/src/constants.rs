//! Built-in defaults and environment variable names

pub const DEFAULT_API_URL: &str = "https://api.codemagic.io";
pub const DEFAULT_DASHBOARD_URL: &str = "https://codemagic.io";
pub const DEFAULT_APP_NAME: &str = "getfitskg";

/// Non-production workflow: no code signing required
pub const DEFAULT_WORKFLOW: &str = "ios-development";
pub const DEFAULT_BRANCH: &str = "main";

pub const DEFAULT_OUTPUT_DIR: &str = "./builds";

pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_BACKOFF_MULTIPLIER: f64 = 2.0;
pub const DEFAULT_MAX_BACKOFF_SECS: u64 = 300;

pub const AUTH_HEADER: &str = "x-auth-token";

pub const ENV_API_URL: &str = "CMBUILD_API_URL";
pub const ENV_APP_NAME: &str = "CMBUILD_APP_NAME";
pub const ENV_OUTPUT_DIR: &str = "CMBUILD_OUTPUT_DIR";
pub const ENV_POLL_INTERVAL: &str = "CMBUILD_POLL_INTERVAL";
pub const ENV_MAX_POLLS: &str = "CMBUILD_MAX_POLLS";
