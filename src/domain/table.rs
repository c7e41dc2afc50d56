//! Generic sheet model shared by the axis table and entity data sheets.

/// One worksheet cell, independent of the workbook format.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Number(f64),
    Text(String),
    Bool(bool),
    /// Excel serial date (days since 1899-12-30, fraction = time of day).
    DateTime(f64),
    Error(String),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Text rendering used for header labels and entity names.
    pub fn as_text(&self) -> String {
        match self {
            Cell::Empty | Cell::Error(_) => String::new(),
            Cell::Number(n) | Cell::DateTime(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    n.to_string()
                }
            }
            Cell::Text(s) => s.clone(),
            Cell::Bool(b) => b.to_string(),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

/// A header row plus the data rows beneath it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Builds a table from a raw grid whose row 0 is the first worksheet row.
    ///
    /// The header is the first non-empty row at or after `skip_rows`; every
    /// later row is data. A grid with no such row yields an empty table.
    pub fn from_grid(grid: Vec<Vec<Cell>>, skip_rows: usize) -> Self {
        let mut rows = grid.into_iter().skip(skip_rows);
        let headers = loop {
            match rows.next() {
                Some(row) if row.iter().all(Cell::is_empty) => continue,
                Some(row) => break row.iter().map(Cell::as_text).collect::<Vec<_>>(),
                None => return Self::default(),
            }
        };
        Self {
            headers,
            rows: rows.collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Index of the first column whose header satisfies `pred`.
    pub fn find_column<F>(&self, pred: F) -> Option<usize>
    where
        F: Fn(&str) -> bool,
    {
        self.headers.iter().position(|h| pred(h))
    }

    /// Cell at (`row`, `col`); short rows read as empty.
    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        static EMPTY: Cell = Cell::Empty;
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}
