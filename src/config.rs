use std::fs;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::payout::DelayConfig;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    pub enable_tracing: bool,
    #[serde(default)]
    pub payout: PayoutConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_dir: "logs".to_string(),
            log_file: "multipay.log".to_string(),
            use_json: false,
            rotation: "daily".to_string(),
            enable_tracing: true,
            payout: PayoutConfig::default(),
        }
    }
}

/// Batch payout settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PayoutConfig {
    /// Pause after each submission before surfacing its result, in ms.
    pub settlement_delay_ms: u64,
    /// Pause after operator confirmation before the next submission, in
    /// ms. Should exceed the settlement delay.
    pub inter_job_delay_ms: u64,
    /// Minor-unit decimals of the transferred asset.
    pub asset_decimals: u32,
    /// Cap on the recipient roster.
    pub max_recipients: usize,
}

impl Default for PayoutConfig {
    fn default() -> Self {
        Self {
            settlement_delay_ms: 10_000,
            inter_job_delay_ms: 15_000,
            asset_decimals: 18,
            max_recipients: 20,
        }
    }
}

impl PayoutConfig {
    /// Delay pair consumed by the coordinator.
    pub fn delays(&self) -> DelayConfig {
        DelayConfig {
            settlement: Duration::from_millis(self.settlement_delay_ms),
            inter_job: Duration::from_millis(self.inter_job_delay_ms),
        }
    }
}

impl AppConfig {
    /// Load `config/<env>.yaml`, falling back to defaults when the file
    /// is absent. A malformed file is still a hard error.
    pub fn load(env: &str) -> Self {
        let config_path = format!("config/{}.yaml", env);
        match fs::read_to_string(&config_path) {
            Ok(content) => serde_yaml::from_str(&content)
                .unwrap_or_else(|e| panic!("Failed to parse {}: {}", config_path, e)),
            Err(_) => {
                eprintln!("Config file {} not found, using defaults", config_path);
                Self::default()
            }
        }
    }
}
