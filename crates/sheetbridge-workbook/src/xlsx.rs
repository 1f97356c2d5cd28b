//! Xlsx decode (calamine) and encode (rust_xlsxwriter)

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use rust_xlsxwriter::Format;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::model::{Cell, Sheet, Workbook};

/// Excel row limit
const MAX_ROWS: usize = 1_048_576;

/// Excel column limit
const MAX_COLUMNS: usize = 16_384;

/// Longest string Excel stores in a cell
const MAX_CELL_CHARS: usize = 32_767;

/// Number format applied to date/time cells
const DATETIME_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

/// Result of decoding a workbook
#[derive(Debug, Clone, Default)]
pub struct Decoded {
    /// Sheets that decoded successfully
    pub workbook: Workbook,
    /// Names of sheets that could not be read
    pub skipped: Vec<String>,
}

fn to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Int(*i),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => Cell::DateTime(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(e) => Cell::Error(e.to_string()),
    }
}

/// Decode xlsx/xls bytes. The first used row of each sheet becomes its
/// header. Unreadable sheets are skipped; a workbook without any readable
/// sheet is an error.
pub fn decode_xlsx(content: &[u8]) -> Result<Decoded> {
    let mut source = open_workbook_auto_from_rs(Cursor::new(content.to_vec()))?;
    let mut decoded = Decoded::default();

    for name in source.sheet_names() {
        let range = match source.worksheet_range(&name) {
            Ok(range) => range,
            Err(e) => {
                warn!(sheet = %name, error = %e, "Skipping unreadable sheet");
                decoded.skipped.push(name);
                continue;
            }
        };

        let mut rows = range.rows();
        let headers = rows
            .next()
            .map(|row| row.iter().map(|d| to_cell(d).display()).collect())
            .unwrap_or_default();
        let mut sheet = Sheet::new(name, headers);
        for row in rows {
            sheet.push_row(row.iter().map(to_cell).collect());
        }
        debug!(
            sheet = %sheet.name,
            rows = sheet.rows.len(),
            columns = sheet.width(),
            "Decoded sheet"
        );
        decoded.workbook.sheets.push(sheet);
    }

    if decoded.workbook.sheets.is_empty() {
        return Err(Error::NoSheets);
    }
    Ok(decoded)
}

fn clamp_text(text: &str) -> &str {
    match text.char_indices().nth(MAX_CELL_CHARS) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// Encode a workbook as xlsx bytes
pub fn encode_xlsx(workbook: &Workbook) -> Result<Vec<u8>> {
    if workbook.sheets.is_empty() {
        return Err(Error::NoSheets);
    }

    let mut output = rust_xlsxwriter::Workbook::new();
    let datetime = Format::new().set_num_format(DATETIME_FORMAT);

    for sheet in &workbook.sheets {
        let rows = sheet.rows.len() + 1;
        let columns = sheet.width();
        if rows > MAX_ROWS || columns > MAX_COLUMNS {
            return Err(Error::GridLimit {
                sheet: sheet.name.clone(),
                rows,
                columns,
            });
        }

        let worksheet = output.add_worksheet();
        worksheet.set_name(&sheet.name)?;

        for (col, header) in sheet.headers.iter().enumerate() {
            worksheet.write_string(0, col as u16, clamp_text(header))?;
        }
        for (r, row) in sheet.rows.iter().enumerate() {
            let r = (r + 1) as u32;
            for (col, cell) in row.iter().enumerate() {
                let col = col as u16;
                match cell {
                    Cell::Empty => {}
                    Cell::Text(s) | Cell::Error(s) => {
                        worksheet.write_string(r, col, clamp_text(s))?;
                    }
                    Cell::Number(n) => {
                        worksheet.write_number(r, col, *n)?;
                    }
                    Cell::Int(i) => {
                        worksheet.write_number(r, col, *i as f64)?;
                    }
                    Cell::Bool(b) => {
                        worksheet.write_boolean(r, col, *b)?;
                    }
                    Cell::DateTime(serial) => {
                        worksheet.write_number_with_format(r, col, *serial, &datetime)?;
                    }
                }
            }
        }
    }

    Ok(output.save_to_buffer()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_then_decode_preserves_layout() {
        let mut sheet = Sheet::new("Orders", vec!["Id".into(), "Paid".into(), "Note".into()]);
        sheet.push_row(vec![
            Cell::Int(7),
            Cell::Bool(true),
            Cell::Text("first".into()),
        ]);
        sheet.push_row(vec![Cell::Number(8.5), Cell::Bool(false), Cell::Empty]);
        let second = Sheet::new("Empty Tab", vec!["Only".into()]);
        let workbook = Workbook {
            sheets: vec![sheet, second],
        };

        let bytes = encode_xlsx(&workbook).unwrap();
        let decoded = decode_xlsx(&bytes).unwrap();

        assert!(decoded.skipped.is_empty());
        let names: Vec<&str> = decoded
            .workbook
            .sheets
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(names, vec!["Orders", "Empty Tab"]);

        let orders = &decoded.workbook.sheets[0];
        assert_eq!(orders.headers, vec!["Id", "Paid", "Note"]);
        assert_eq!(orders.rows.len(), 2);
        assert_eq!(orders.rows[0][1], Cell::Bool(true));
        assert_eq!(orders.rows[0][2], Cell::Text("first".into()));
        assert_eq!(orders.rows[1][0], Cell::Number(8.5));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let err = decode_xlsx(b"definitely not a workbook").unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[test]
    fn test_encode_rejects_empty_workbook() {
        assert!(matches!(
            encode_xlsx(&Workbook::default()),
            Err(Error::NoSheets)
        ));
    }

    #[test]
    fn test_clamp_text() {
        let long = "a".repeat(MAX_CELL_CHARS + 10);
        assert_eq!(clamp_text(&long).len(), MAX_CELL_CHARS);
        assert_eq!(clamp_text("short"), "short");
    }
}
