//! Configuration handling.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Identity provider endpoints and the public key sent with every call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Base URL of the identity provider (no trailing slash).
    #[serde(default = "default_identity_base_url")]
    pub base_url: String,

    /// Public anonymous API key attached as the `apikey` header.
    #[serde(default)]
    pub anon_key: String,
}

fn default_identity_base_url() -> String {
    "https://identity.flowcourier.dev".to_string()
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            base_url: default_identity_base_url(),
            anon_key: String::new(),
        }
    }
}

/// Target application addressing and authentication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Header carrying the API credential on target calls.
    #[serde(default = "default_api_key_header")]
    pub api_key_header: String,

    /// Managed-cloud host suffixes recognized by target detection.
    #[serde(default = "default_cloud_suffixes")]
    pub cloud_suffixes: Vec<String>,

    /// Route navigated to by the redirect strategy.
    #[serde(default = "default_new_workflow_path")]
    pub new_workflow_path: String,
}

fn default_api_key_header() -> String {
    "X-FLOWDESK-API-KEY".to_string()
}

fn default_cloud_suffixes() -> Vec<String> {
    vec![".flowdesk.cloud".to_string()]
}

fn default_new_workflow_path() -> String {
    "/workflow/new".to_string()
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            api_key_header: default_api_key_header(),
            cloud_suffixes: default_cloud_suffixes(),
            new_workflow_path: default_new_workflow_path(),
        }
    }
}

/// Per-strategy delivery timing.
///
/// The platform fetch default is never relied on; every network strategy
/// carries its own explicit timeout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryConfig {
    /// Timeout for the direct API call, in milliseconds.
    #[serde(default = "default_api_timeout_ms")]
    pub api_timeout_ms: u64,

    /// Timeout for the post-save connectivity probe, in milliseconds.
    #[serde(default = "default_connectivity_timeout_ms")]
    pub connectivity_timeout_ms: u64,

    /// Settling delay between activating the import control and writing
    /// into the paste surface, in milliseconds.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
}

fn default_api_timeout_ms() -> u64 {
    15_000
}

fn default_connectivity_timeout_ms() -> u64 {
    5_000
}

fn default_settle_delay_ms() -> u64 {
    400
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            api_timeout_ms: default_api_timeout_ms(),
            connectivity_timeout_ms: default_connectivity_timeout_ms(),
            settle_delay_ms: default_settle_delay_ms(),
        }
    }
}

impl DeliveryConfig {
    /// Timeout for the direct API call.
    pub fn api_timeout(&self) -> Duration {
        Duration::from_millis(self.api_timeout_ms)
    }

    /// Timeout for the connectivity probe.
    pub fn connectivity_timeout(&self) -> Duration {
        Duration::from_millis(self.connectivity_timeout_ms)
    }

    /// Settling delay used by the in-page injection strategy.
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

/// Top-level configuration for one extension context.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CourierConfig {
    #[serde(default)]
    pub identity: IdentityConfig,

    #[serde(default)]
    pub target: TargetConfig,

    #[serde(default)]
    pub delivery: DeliveryConfig,
}

/// Load configuration from the default location, or defaults when absent.
pub fn load_config() -> Result<CourierConfig> {
    let config_path = project_dirs()
        .map(|d| d.config_dir().join("flowcourier.toml"))
        .unwrap_or_else(|| PathBuf::from("flowcourier.toml"));

    if !config_path.exists() {
        return Ok(CourierConfig::default());
    }

    let contents = std::fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read config from {:?}", config_path))?;
    toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config from {:?}", config_path))
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("dev", "flowcourier", "flowcourier")
}
