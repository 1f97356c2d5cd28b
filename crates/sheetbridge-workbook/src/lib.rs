//! Sheetbridge Workbook - local remediation of spreadsheet content
//!
//! The enhanced conversion tier downloads a workbook, removes the columns a
//! server-side converter chokes on (embedded pictures, binary blobs) and
//! re-encodes what is left. This crate holds that logic:
//! - Model: sheets as header + rows of typed cells
//! - Columns: non-convertible column detection
//! - Xlsx: decode (calamine) and encode (rust_xlsxwriter)
//! - Sanitizer: the bytes-in / bytes-out seam used by the orchestrator

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod columns;
pub mod error;
pub mod model;
pub mod sanitizer;
pub mod xlsx;

pub use columns::ColumnRules;
pub use error::{Error, Result};
pub use model::{Cell, Sheet, Workbook};
pub use sanitizer::{ContentSanitizer, SanitizeReport, Sanitized, SheetReport, XlsxSanitizer};
pub use xlsx::{decode_xlsx, encode_xlsx, Decoded};
