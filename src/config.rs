//! Runtime configuration

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:5000";
pub const DEFAULT_GAME_VERSION: &str = "1.16";
pub const DEFAULT_DATABASE: &str = "craft_planner.db";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Settings shared by the service client and the preference store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_url: String,
    pub game_version: String,
    pub database: PathBuf,
    pub request_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            game_version: DEFAULT_GAME_VERSION.to_string(),
            database: PathBuf::from(DEFAULT_DATABASE),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}
