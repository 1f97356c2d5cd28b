//! Configuration loading
//!
//! Handles loading configuration from embedded defaults, files, and environment.

use super::config::AppConfig;
use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use std::path::Path;

/// Embedded default configuration (compiled into binary)
pub const DEFAULT_CONFIG: &str = include_str!("../../config/default.toml");

/// Load configuration from files and environment
pub fn load_config(explicit: Option<&Path>) -> Result<AppConfig> {
    let mut builder = Config::builder()
        // 1. Embedded defaults (always available)
        .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
        // 2. Local overrides (optional)
        .add_source(File::with_name("config/local").required(false));

    // 3. File given on the command line (must exist)
    if let Some(path) = explicit {
        builder = builder.add_source(File::from(path).required(true));
    }

    let config = builder
        // 4. Environment variables (highest priority)
        // prefix_separator("_") makes SHEETBRIDGE_DRIVE__ACCESS_TOKEN work.
        .add_source(
            Environment::with_prefix("SHEETBRIDGE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    config
        .try_deserialize()
        .context("Failed to deserialize configuration")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_defaults_deserialize() {
        let config: AppConfig = Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.governance, sheetbridge_core::GovernanceConfig::default());
        assert_eq!(config.conversion, sheetbridge_core::ConversionConfig::default());
        assert_eq!(config.drive.timeout_secs, 120);
        assert!(config.drive.access_token.is_empty());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let config: AppConfig = Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .add_source(File::from_str(
                "[governance.retry]\nmax_attempts = 2\n[conversion]\nkeep_intermediates = true\n",
                FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.governance.retry.max_attempts, 2);
        assert_eq!(config.governance.retry.base_delay_ms, 1_000);
        assert!(config.conversion.keep_intermediates);
    }
}
