//! Application configuration module
//!
//! Configuration is read from an optional settings file and then from
//! environment variables with the `TENDER_RECON` prefix, using `__` between
//! nested keys. Every value has a default, so an empty environment yields a
//! working configuration.
//!
//! # Example
//!
//! ```no_run
//! use tender_reconciliation::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Copying with {} workers", config.transfer.concurrency);
//! ```

mod error;
mod matching;
mod telemetry;
mod transfer;

pub use error::{ConfigError, ValidationError};
pub use matching::MatchingConfig;
pub use telemetry::TelemetryConfig;
pub use transfer::TransferConfig;

use serde::Deserialize;
use std::path::Path;

use crate::application::TransferSettings;

const ENV_PREFIX: &str = "TENDER_RECON";

/// Root application configuration
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct AppConfig {
    /// Scoring weights and thresholds
    #[serde(default)]
    pub matching: MatchingConfig,

    /// Worker pool and retry settings
    #[serde(default)]
    pub transfer: TransferConfig,

    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// Loads `.env` if present, then reads `TENDER_RECON__*` variables:
    ///
    /// - `TENDER_RECON__MATCHING__MATCH_THRESHOLD=0.6` -> `matching.match_threshold`
    /// - `TENDER_RECON__TRANSFER__CONCURRENCY=8` -> `transfer.concurrency`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a value cannot be parsed into its type.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_file(None)
    }

    /// Like [`AppConfig::load`], with a settings file underneath the
    /// environment. The format follows the file extension.
    pub fn load_with_file(path: Option<&Path>) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let config = builder
            .add_source(config::Environment::default().prefix(ENV_PREFIX).separator("__"))
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for the first section that is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.matching.validate()?;
        self.transfer.validate()?;
        self.telemetry.validate()?;
        Ok(())
    }

    /// Settings for the transfer handler.
    ///
    /// The auto-confirm threshold is shared with the matching pass.
    pub fn transfer_settings(&self) -> TransferSettings {
        TransferSettings {
            auto_confirm_threshold: self.matching.auto_confirm_threshold,
            concurrency: self.transfer.concurrency,
            retry: self.transfer.retry_policy(),
        }
    }
}
