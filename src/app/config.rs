//! Application configuration types

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use sheetbridge_core::{ConversionConfig, GovernanceConfig};
use sheetbridge_drive::DriveConfig;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub drive: DriveSettings,
    #[serde(default)]
    pub governance: GovernanceConfig,
    #[serde(default)]
    pub conversion: ConversionConfig,
}

/// Remote service settings
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveSettings {
    pub access_token: String,
    pub timeout_secs: u64,
    pub base_url: Option<String>,
}

impl Default for DriveSettings {
    fn default() -> Self {
        Self {
            access_token: String::new(),
            timeout_secs: 120,
            base_url: None,
        }
    }
}

// SECURITY: keep the token out of debug output
impl std::fmt::Debug for DriveSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriveSettings")
            .field(
                "access_token",
                &sheetbridge_drive::util::mask_token(&self.access_token),
            )
            .field("timeout_secs", &self.timeout_secs)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl DriveSettings {
    /// Endpoint configuration for the Google service
    pub fn service_config(&self) -> DriveConfig {
        let config = DriveConfig::new().with_timeout(Duration::from_secs(self.timeout_secs));
        match &self.base_url {
            Some(base) => config.with_base_url(base.clone()),
            None => config,
        }
    }
}

impl AppConfig {
    /// Checks that only matter once remote calls are about to be made
    pub fn validate_for_conversion(&self) -> Result<()> {
        if self.drive.access_token.trim().is_empty() {
            bail!(
                "No access token configured. Set SHEETBRIDGE_DRIVE__ACCESS_TOKEN \
                 or drive.access_token in config/local.toml"
            );
        }
        self.governance.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_masks_token() {
        let settings = DriveSettings {
            access_token: "ya29.a0AfH6SMBexampletoken".to_string(),
            ..DriveSettings::default()
        };
        let debug = format!("{settings:?}");
        assert!(!debug.contains("exampletoken"));
    }

    #[test]
    fn test_missing_token_is_rejected() {
        let config = AppConfig::default();
        assert!(config.validate_for_conversion().is_err());

        let mut config = AppConfig::default();
        config.drive.access_token = "token".to_string();
        assert!(config.validate_for_conversion().is_ok());
    }
}
