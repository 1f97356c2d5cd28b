//! Google - Drive v3 / Sheets v4 conversion service
//!
//! This module implements [`ConversionService`](crate::ConversionService)
//! on top of the Google REST APIs using reqwest.

/// HTTP status and error body classification
pub mod classify;
/// Service implementation
pub mod provider;
/// API types and configuration
pub mod types;

#[cfg(test)]
mod tests;

pub use classify::classify_response;
pub use provider::GoogleDriveService;
pub use types::{DriveConfig, DRIVE_API_BASE, DRIVE_UPLOAD_BASE, SHEETS_API_BASE};
