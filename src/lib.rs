//! Review responder
//!
//! Loads exported customer reviews, drafts owner replies with a completion
//! service, lets a human approve them in a terminal UI, and posts approved
//! replies through an automated browser session via chromiumoxide.

pub mod automation;
mod browser;
pub mod browser_setup;
pub mod drafter;
mod manager;
pub mod store;
pub mod ui;
pub mod utils;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::utils::ConfigError;
use crate::utils::constants::{
    DEFAULT_COMPLETION_BASE_URL, DEFAULT_COMPLETION_MODEL, DEFAULT_CONFIG_FILE,
    DEFAULT_SPREADSHEET_EXTENSION,
};

pub use automation::{AutomationConfig, PlatformSelectors};
pub use browser::{BrowserError, BrowserResult};
pub use drafter::DrafterConfig;
pub use manager::BrowserManager;

pub const ENV_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_MODEL_NAME: &str = "OPENAI_MODEL_NAME";
pub const ENV_BASE_URL: &str = "OPENAI_BASE_URL";
pub const ENV_REVIEWS_DIR: &str = "REVIEWS_DIR";
pub const ENV_USER_DATA_DIR: &str = "CHROME_USER_DATA_DIR";
pub const ENV_PROFILE_DIRECTORY: &str = "CHROME_PROFILE_DIRECTORY";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub completion: CompletionConfig,

    #[serde(default)]
    pub drafter: DrafterConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub browser: BrowserConfig,

    #[serde(default)]
    pub automation: AutomationConfig,
}

/// Completion service connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    /// Usually supplied through OPENAI_API_KEY rather than the file
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Where the review exports live
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory searched for the newest export; defaults to the working directory
    #[serde(default)]
    pub reviews_dir: Option<PathBuf>,

    #[serde(default = "default_extension")]
    pub extension: String,
}

/// Browser launch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Run browser in headless mode
    #[serde(default)]
    pub headless: bool,

    /// Disable web security features (Same-Origin Policy, etc.)
    /// WARNING: Only enable for trusted content
    #[serde(default = "default_disable_security")]
    pub disable_security: bool,

    /// Chrome user data directory holding the signed-in business profile.
    /// A throwaway temp profile is used when unset.
    #[serde(default)]
    pub user_data_dir: Option<PathBuf>,

    /// Profile inside `user_data_dir` (e.g. "Default", "Profile 1")
    #[serde(default)]
    pub profile_directory: Option<String>,

    /// Window dimensions
    #[serde(default)]
    pub window: WindowConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    #[serde(default = "default_window_width")]
    pub width: u32,

    #[serde(default = "default_window_height")]
    pub height: u32,
}

fn default_model() -> String {
    DEFAULT_COMPLETION_MODEL.to_string()
}
fn default_base_url() -> String {
    DEFAULT_COMPLETION_BASE_URL.to_string()
}
fn default_request_timeout_secs() -> u64 {
    60
}
fn default_extension() -> String {
    DEFAULT_SPREADSHEET_EXTENSION.to_string()
}

fn default_disable_security() -> bool {
    false
}

fn default_window_width() -> u32 {
    1920
}

fn default_window_height() -> u32 {
    1080
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            reviews_dir: None,
            extension: default_extension(),
        }
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: false,
            disable_security: default_disable_security(),
            user_data_dir: None,
            profile_directory: None,
            window: WindowConfig::default(),
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: default_window_width(),
            height: default_window_height(),
        }
    }
}

impl Config {
    /// Overlay values from the environment
    ///
    /// `lookup` is `std::env::var(..).ok()` in the binary; tests pass a map.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty(ENV_API_KEY) {
            self.completion.api_key = Some(key);
        }
        if let Some(model) = non_empty(ENV_MODEL_NAME) {
            self.completion.model = model;
        }
        if let Some(url) = non_empty(ENV_BASE_URL) {
            self.completion.base_url = url;
        }
        if let Some(dir) = non_empty(ENV_REVIEWS_DIR) {
            self.store.reviews_dir = Some(PathBuf::from(dir));
        }
        if let Some(dir) = non_empty(ENV_USER_DATA_DIR) {
            self.browser.user_data_dir = Some(PathBuf::from(dir));
        }
        if let Some(profile) = non_empty(ENV_PROFILE_DIRECTORY) {
            self.browser.profile_directory = Some(profile);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.drafter.validate()?;
        self.automation.validate()?;
        if self.completion.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout {
                name: "completion.request_timeout_secs",
                reason: "must be greater than 0s".to_string(),
            });
        }
        // Chrome locks a user-data dir; a shared real profile cannot host parallel runs
        if self.browser.user_data_dir.is_some() && self.automation.max_concurrent_sessions > 1 {
            return Err(ConfigError::InvalidValue {
                name: "automation.max_concurrent_sessions",
                reason: "must be 1 when browser.user_data_dir is set".to_string(),
            });
        }
        Ok(())
    }

    /// Directory searched for review exports
    pub fn reviews_dir(&self) -> PathBuf {
        self.store
            .reviews_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

/// Load config from a YAML file
///
/// With no explicit path, `review-responder.yaml` in the working directory is
/// used if present; otherwise defaults apply.
pub fn load_yaml_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let (config_path, required) = match path {
        Some(p) => (p.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
    };

    if !required && !config_path.exists() {
        return Ok(Config::default());
    }

    let contents = fs::read_to_string(&config_path).map_err(|source| ConfigError::Read {
        path: config_path.clone(),
        source,
    })?;
    serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: config_path,
        source,
    })
}
