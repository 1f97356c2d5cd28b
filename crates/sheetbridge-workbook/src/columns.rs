//! Non-convertible column detection
//!
//! A column is dropped when its header names picture content, or when a
//! sample of its values looks like binary data that leaked into text cells.

use crate::model::{Cell, Sheet};

/// Rules for classifying columns as non-convertible
#[derive(Debug, Clone)]
pub struct ColumnRules {
    /// Headers (lowercase) that always mark picture columns
    pub picture_headers: Vec<String>,
    /// Header prefix (lowercase) that marks picture columns
    pub picture_prefix: String,
    /// Number of non-empty values inspected per column
    pub sample_size: usize,
    /// Text longer than this (in characters) is probed for binary content
    pub long_text_chars: usize,
    /// Leading characters probed for non-ASCII content
    pub probe_chars: usize,
}

impl Default for ColumnRules {
    fn default() -> Self {
        Self {
            picture_headers: ["photos", "photo", "image", "images", "picture", "pictures"]
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            picture_prefix: "photo".to_string(),
            sample_size: 5,
            long_text_chars: 1000,
            probe_chars: 100,
        }
    }
}

impl ColumnRules {
    /// Create the default rules
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the sample size
    #[must_use]
    pub fn with_sample_size(mut self, sample_size: usize) -> Self {
        self.sample_size = sample_size;
        self
    }

    /// Whether the header names a picture column
    #[must_use]
    pub fn is_picture_header(&self, header: &str) -> bool {
        let lower = header.trim().to_lowercase();
        self.picture_headers.iter().any(|h| *h == lower)
            || (!self.picture_prefix.is_empty() && lower.starts_with(&self.picture_prefix))
    }

    /// Whether a single value looks like binary content
    #[must_use]
    pub fn is_binary_like(&self, cell: &Cell) -> bool {
        match cell {
            Cell::Text(text) => {
                text.chars().count() > self.long_text_chars
                    && text.chars().take(self.probe_chars).any(|c| !c.is_ascii())
            }
            _ => false,
        }
    }

    /// Indices of the columns in `sheet` that should be removed
    #[must_use]
    pub fn non_convertible_columns(&self, sheet: &Sheet) -> Vec<usize> {
        (0..sheet.width())
            .filter(|&index| {
                let header = sheet.headers.get(index).map(String::as_str).unwrap_or("");
                self.is_picture_header(header)
                    || sheet
                        .column(index)
                        .filter(|c| !c.is_empty())
                        .take(self.sample_size)
                        .any(|c| self.is_binary_like(c))
            })
            .collect()
    }

    /// Remove non-convertible columns, returning the removed headers
    pub fn strip(&self, sheet: &mut Sheet) -> Vec<String> {
        let indices = self.non_convertible_columns(sheet);
        let removed: Vec<String> = indices
            .iter()
            .map(|&i| sheet.headers.get(i).cloned().unwrap_or_default())
            .collect();
        sheet.remove_columns(&indices);
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binary_text() -> String {
        let mut s = String::from("\u{fffd}\u{1}PNG");
        s.push_str(&"x".repeat(1200));
        s
    }

    #[test]
    fn test_picture_headers() {
        let rules = ColumnRules::default();
        assert!(rules.is_picture_header("Photo"));
        assert!(rules.is_picture_header(" IMAGES "));
        assert!(rules.is_picture_header("photograph_url"));
        assert!(!rules.is_picture_header("Name"));
        assert!(!rules.is_picture_header("imagery notes"));
    }

    #[test]
    fn test_binary_like_requires_length_and_non_ascii() {
        let rules = ColumnRules::default();
        assert!(rules.is_binary_like(&Cell::Text(binary_text())));
        assert!(!rules.is_binary_like(&Cell::Text("x".repeat(1200))));
        assert!(!rules.is_binary_like(&Cell::Text("é".to_string())));
        assert!(!rules.is_binary_like(&Cell::Number(1.0)));
    }

    #[test]
    fn test_strip_removes_picture_and_binary_columns() {
        let mut sheet = Sheet::new(
            "Inventory",
            vec!["Item".into(), "Photos".into(), "Notes".into(), "Qty".into()],
        );
        sheet.push_row(vec![
            Cell::Text("bolt".into()),
            Cell::Empty,
            Cell::Empty,
            Cell::Int(4),
        ]);
        sheet.push_row(vec![
            Cell::Text("nut".into()),
            Cell::Text("img".into()),
            Cell::Text(binary_text()),
            Cell::Int(9),
        ]);

        let removed = ColumnRules::default().strip(&mut sheet);
        assert_eq!(removed, vec!["Photos".to_string(), "Notes".to_string()]);
        assert_eq!(sheet.headers, vec!["Item".to_string(), "Qty".to_string()]);
        assert_eq!(sheet.rows[1], vec![Cell::Text("nut".into()), Cell::Int(9)]);
    }

    #[test]
    fn test_sample_only_inspects_leading_values() {
        let mut sheet = Sheet::new("S", vec!["Notes".into()]);
        for _ in 0..5 {
            sheet.push_row(vec![Cell::Text("fine".into())]);
        }
        sheet.push_row(vec![Cell::Text(binary_text())]);

        let rules = ColumnRules::default();
        assert!(rules.non_convertible_columns(&sheet).is_empty());
        assert_eq!(
            rules.with_sample_size(6).non_convertible_columns(&sheet),
            vec![0]
        );
    }
}
