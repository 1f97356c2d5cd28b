//! Application wiring
//!
//! Loads configuration and assembles the service, caller and orchestrator.

mod config;
mod loader;

pub use config::AppConfig;
pub use loader::load_config;

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use sheetbridge_core::{
    Clock, ConversionOrchestrator, EventBus, ResilientCaller, SystemClock,
};
use sheetbridge_drive::{ConversionService, GoogleDriveService, StaticToken};

/// Build the Google-backed orchestrator described by `config`
pub fn build_orchestrator(
    config: &AppConfig,
    events: EventBus,
    cancel: CancellationToken,
) -> Result<ConversionOrchestrator> {
    config.validate_for_conversion()?;

    let tokens = Arc::new(StaticToken::new(config.drive.access_token.clone()));
    let service: Arc<dyn ConversionService> = Arc::new(
        GoogleDriveService::new(config.drive.service_config(), tokens)
            .context("Failed to create Google Drive client")?,
    );
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let caller = ResilientCaller::new(&config.governance, clock, events).with_cancellation(cancel);

    Ok(ConversionOrchestrator::new(
        service,
        Arc::new(caller),
        config.conversion.clone(),
    ))
}
