//! Error types for sheetbridge-workbook

use thiserror::Error;

/// Workbook error type
#[derive(Debug, Error)]
pub enum Error {
    /// Content could not be read as a workbook
    #[error("decode error: {0}")]
    Decode(String),

    /// Workbook could not be written
    #[error("encode error: {0}")]
    Encode(String),

    /// No sheet survived decoding
    #[error("workbook has no readable sheets")]
    NoSheets,

    /// Content exceeds spreadsheet grid limits
    #[error("sheet '{sheet}' exceeds grid limits ({rows} rows x {columns} columns)")]
    GridLimit {
        /// Sheet name
        sheet: String,
        /// Row count including header
        rows: usize,
        /// Column count
        columns: usize,
    },
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

impl From<calamine::Error> for Error {
    fn from(e: calamine::Error) -> Self {
        Error::Decode(e.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for Error {
    fn from(e: rust_xlsxwriter::XlsxError) -> Self {
        Error::Encode(e.to_string())
    }
}
