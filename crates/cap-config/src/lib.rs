//! # cap-config
//!
//! Layered configuration loading for Capstone using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`CAPSTONE_*` prefix, `__` as separator)
//! 2. Project-level `.capstone/config.toml`
//! 3. User-level `~/.config/capstone/config.toml`
//! 4. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `CAPSTONE_STORE__PATH` -> `store.path`,
//! `CAPSTONE_WORKFLOW__MAX_GROUP_SIZE` -> `workflow.max_group_size`, etc.
//! The `__` (double underscore) separates nested config sections.
//!
//! # Usage
//!
//! ```no_run
//! use cap_config::CapConfig;
//!
//! let config = CapConfig::load_with_dotenv().expect("config");
//! println!("store: {}", config.store.path);
//! ```

mod error;
mod general;
mod journal;
mod retry;
mod store;
mod workflow;

pub use error::ConfigError;
pub use general::GeneralConfig;
pub use journal::JournalConfig;
pub use retry::RetryConfig;
pub use store::StoreConfig;
pub use workflow::WorkflowConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CapConfig {
    #[serde(default)]
    pub workflow: WorkflowConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub journal: JournalConfig,
    #[serde(default)]
    pub general: GeneralConfig,
}

impl CapConfig {
    /// Load configuration from all sources (TOML files + environment variables)
    /// and validate it.
    ///
    /// Does NOT call `dotenvy` -- use [`Self::load_with_dotenv`] for `.env` support.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if extraction fails or a value is out of range.
    pub fn load() -> Result<Self, ConfigError> {
        let config: Self = Self::figment().extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with `.env` file support.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if extraction fails or a value is out of range.
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load()
    }

    /// Build the figment provider chain.
    ///
    /// Public so tests can inspect the figment directly or add providers on top.
    #[must_use]
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Layer 1: User-global config
        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        // Layer 2: Project-local config
        let local_path = PathBuf::from(".capstone/config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        // Layer 3: Environment variables (highest priority)
        figment.merge(Env::prefixed("CAPSTONE_").split("__"))
    }

    /// Reject limits and timeouts that would make every operation fail.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks: [(&str, u64); 7] = [
            ("workflow.max_group_size", u64::from(self.workflow.max_group_size)),
            (
                "workflow.max_lifetime_accepts",
                u64::from(self.workflow.max_lifetime_accepts),
            ),
            (
                "workflow.max_pending_supervision_requests",
                u64::from(self.workflow.max_pending_supervision_requests),
            ),
            (
                "workflow.event_channel_capacity",
                self.workflow.event_channel_capacity as u64,
            ),
            ("store.timeout_ms", self.store.timeout_ms),
            ("store.lock_timeout_ms", self.store.lock_timeout_ms),
            ("retry.max_attempts", u64::from(self.retry.max_attempts)),
        ];
        for (field, value) in checks {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    reason: "must be greater than zero".to_string(),
                });
            }
        }
        if self.store.path.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "store.path".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Path to the user-global config file.
    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("capstone").join("config.toml"))
    }
}
