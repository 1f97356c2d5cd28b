//! Workbook model
//!
//! Each sheet is a header row plus data rows. Rows may be shorter than the
//! header; missing trailing cells are empty.

/// A single cell value
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// No value
    Empty,
    /// Text
    Text(String),
    /// Floating point number
    Number(f64),
    /// Integer
    Int(i64),
    /// Boolean
    Bool(bool),
    /// Excel serial date/time
    DateTime(f64),
    /// Formula error, kept as its display text
    Error(String),
}

impl Cell {
    /// Whether the cell holds no value
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Display text of the cell (used for headers)
    #[must_use]
    pub fn display(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) | Cell::Error(s) => s.clone(),
            Cell::Number(n) | Cell::DateTime(n) => n.to_string(),
            Cell::Int(i) => i.to_string(),
            Cell::Bool(b) => b.to_string(),
        }
    }
}

/// One worksheet
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sheet {
    /// Sheet (tab) name
    pub name: String,
    /// Column headers
    pub headers: Vec<String>,
    /// Data rows
    pub rows: Vec<Vec<Cell>>,
}

impl Sheet {
    /// Create an empty sheet with headers
    #[must_use]
    pub fn new(name: impl Into<String>, headers: Vec<String>) -> Self {
        Self {
            name: name.into(),
            headers,
            rows: Vec::new(),
        }
    }

    /// Append a data row
    pub fn push_row(&mut self, row: Vec<Cell>) {
        self.rows.push(row);
    }

    /// Number of columns (widest of header and rows)
    #[must_use]
    pub fn width(&self) -> usize {
        self.rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.headers.len()))
            .max()
            .unwrap_or(0)
    }

    /// Iterate the cells of column `index`
    pub fn column(&self, index: usize) -> impl Iterator<Item = &Cell> {
        self.rows.iter().filter_map(move |row| row.get(index))
    }

    /// Remove the given columns (indices into the current layout)
    pub fn remove_columns(&mut self, indices: &[usize]) {
        if indices.is_empty() {
            return;
        }
        let keep = |i: &usize| !indices.contains(i);
        self.headers = std::mem::take(&mut self.headers)
            .into_iter()
            .enumerate()
            .filter(|(i, _)| keep(i))
            .map(|(_, h)| h)
            .collect();
        for row in &mut self.rows {
            *row = std::mem::take(row)
                .into_iter()
                .enumerate()
                .filter(|(i, _)| keep(i))
                .map(|(_, c)| c)
                .collect();
        }
    }
}

/// A workbook: ordered sheets
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Workbook {
    /// Sheets in tab order
    pub sheets: Vec<Sheet>,
}
