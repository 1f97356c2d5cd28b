//! Sheetbridge Drive - Remote Conversion Service boundary
//!
//! This crate provides the remote side of a conversion:
//! - Service: the `ConversionService` trait consumed by the orchestrator
//! - Google: Drive v3 / Sheets v4 HTTP implementation
//! - Credentials: access token providers
//! - Mock: scripted in-memory service for tests
//!
//! Every remote failure is classified into an [`ErrorKind`] so that callers
//! can decide between retrying and giving up without inspecting transport
//! details.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod credentials;
pub mod error;
pub mod google;
pub mod mock;
pub mod service;
pub mod types;
pub mod util;

pub use credentials::{StaticToken, TokenProvider};
pub use error::{Error, ErrorKind, Result};
pub use google::{classify_response, DriveConfig, GoogleDriveService};
pub use mock::{MockCall, MockConversionService, Operation};
pub use service::ConversionService;
pub use types::{
    FileMetadata, UploadMetadata, GOOGLE_SHEET_MIME, XLSX_MIME, XLS_MIME,
};
