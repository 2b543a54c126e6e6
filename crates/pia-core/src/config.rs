//! Console configuration: backend base URLs and request timeout.
//!
//! Precedence (highest first): `PIA__*` environment variables, the config file
//! (`PIA_CONFIG` path, else `config/console.{toml,...}`), built-in defaults.
//!
//! | Key | Env | Default |
//! |-----|-----|---------|
//! | app_name | PIA__APP_NAME | PiaAGI Console |
//! | api_base_url | PIA__API_BASE_URL | http://localhost:5001 (prompts, curricula, simulation) |
//! | cml_base_url | PIA__CML_BASE_URL | http://localhost:5000 (CML module services) |
//! | request_timeout_secs | PIA__REQUEST_TIMEOUT_SECS | 30 |

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5001";
pub const DEFAULT_CML_BASE_URL: &str = "http://localhost:5000";
pub const DEFAULT_CONFIG_PATH: &str = "config/console";

fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleConfig {
    /// Title shown by the front-ends.
    pub app_name: String,
    /// Base URL of the prompt engineering + simulation backend.
    pub api_base_url: String,
    /// Base URL of the cognitive module library backend.
    pub cml_base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            app_name: "PiaAGI Console".to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            cml_base_url: DEFAULT_CML_BASE_URL.to_string(),
            request_timeout_secs: default_timeout_secs(),
        }
    }
}

impl ConsoleConfig {
    /// Load config from file and environment. Path: env `PIA_CONFIG` > `config/console`.
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path =
            std::env::var("PIA_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(&config_path)
    }

    /// Load from an explicit file path (extension optional). A missing file is not an error.
    pub fn load_from(path: &str) -> Result<Self, config::ConfigError> {
        let defaults = Self::default();
        config::Config::builder()
            .set_default("app_name", defaults.app_name)?
            .set_default("api_base_url", defaults.api_base_url)?
            .set_default("cml_base_url", defaults.cml_base_url)?
            .set_default("request_timeout_secs", defaults.request_timeout_secs)?
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("PIA").separator("__"))
            .build()?
            .try_deserialize()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}
