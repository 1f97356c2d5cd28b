//! Content sanitizer
//!
//! Bytes in, bytes out. The orchestrator only sees this trait, so tests can
//! swap in a stub that does not touch the xlsx codec.

use serde::Serialize;
use tracing::{debug, info};

use crate::columns::ColumnRules;
use crate::error::Result;
use crate::xlsx::{decode_xlsx, encode_xlsx};

/// What was removed from one sheet
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SheetReport {
    /// Sheet name
    pub name: String,
    /// Data rows kept
    pub rows: usize,
    /// Columns left after stripping
    pub columns_kept: usize,
    /// Headers of removed columns
    pub removed_columns: Vec<String>,
}

/// Summary of a sanitize pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SanitizeReport {
    /// Per-sheet results for sheets that were kept
    pub sheets: Vec<SheetReport>,
    /// Sheets that could not be decoded and were left out
    pub skipped_sheets: Vec<String>,
}

impl SanitizeReport {
    /// Total number of removed columns across sheets
    #[must_use]
    pub fn removed_columns(&self) -> usize {
        self.sheets.iter().map(|s| s.removed_columns.len()).sum()
    }
}

/// Sanitized content with its report
#[derive(Debug, Clone)]
pub struct Sanitized {
    /// Re-encoded workbook
    pub content: Vec<u8>,
    /// What changed
    pub report: SanitizeReport,
}

/// Strips content that prevents a remote conversion.
///
/// Implementations are synchronous and may be CPU heavy; async callers
/// should run them on a blocking thread.
pub trait ContentSanitizer: Send + Sync {
    /// Produce cleaned content from the original bytes
    fn sanitize(&self, content: &[u8]) -> Result<Sanitized>;
}

/// Xlsx sanitizer driven by [`ColumnRules`]
#[derive(Debug, Clone, Default)]
pub struct XlsxSanitizer {
    rules: ColumnRules,
}

impl XlsxSanitizer {
    /// Create a sanitizer with the given rules
    #[must_use]
    pub fn new(rules: ColumnRules) -> Self {
        Self { rules }
    }

    /// The rules in use
    #[must_use]
    pub fn rules(&self) -> &ColumnRules {
        &self.rules
    }
}

impl ContentSanitizer for XlsxSanitizer {
    fn sanitize(&self, content: &[u8]) -> Result<Sanitized> {
        let decoded = decode_xlsx(content)?;
        let mut workbook = decoded.workbook;
        let mut report = SanitizeReport {
            sheets: Vec::with_capacity(workbook.sheets.len()),
            skipped_sheets: decoded.skipped,
        };

        for sheet in &mut workbook.sheets {
            let removed = self.rules.strip(sheet);
            if !removed.is_empty() {
                debug!(sheet = %sheet.name, removed = ?removed, "Stripped columns");
            }
            report.sheets.push(SheetReport {
                name: sheet.name.clone(),
                rows: sheet.rows.len(),
                columns_kept: sheet.width(),
                removed_columns: removed,
            });
        }

        let content = encode_xlsx(&workbook)?;
        info!(
            sheets = report.sheets.len(),
            skipped = report.skipped_sheets.len(),
            removed_columns = report.removed_columns(),
            bytes = content.len(),
            "Sanitized workbook"
        );
        Ok(Sanitized { content, report })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::model::{Cell, Sheet, Workbook};

    fn source_workbook() -> Vec<u8> {
        let mut sheet = Sheet::new(
            "Stock",
            vec!["Sku".into(), "Photo".into(), "Count".into()],
        );
        sheet.push_row(vec![
            Cell::Text("A-1".into()),
            Cell::Text("inline image".into()),
            Cell::Int(3),
        ]);
        encode_xlsx(&Workbook {
            sheets: vec![sheet],
        })
        .unwrap()
    }

    #[test]
    fn test_sanitize_strips_picture_column() {
        let sanitized = XlsxSanitizer::default()
            .sanitize(&source_workbook())
            .unwrap();

        assert_eq!(sanitized.report.removed_columns(), 1);
        let sheet = &sanitized.report.sheets[0];
        assert_eq!(sheet.name, "Stock");
        assert_eq!(sheet.rows, 1);
        assert_eq!(sheet.columns_kept, 2);
        assert_eq!(sheet.removed_columns, vec!["Photo".to_string()]);

        let cleaned = decode_xlsx(&sanitized.content).unwrap().workbook;
        assert_eq!(cleaned.sheets[0].headers, vec!["Sku", "Count"]);
    }

    #[test]
    fn test_sanitize_rejects_non_workbook() {
        let err = XlsxSanitizer::default().sanitize(b"plain text").unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }
}
