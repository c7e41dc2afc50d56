//! Spreadsheet workbook adapter backed by `calamine` (xlsx, xlsm, xls, ods).

use crate::domain::error::PerfchartError;
use crate::domain::table::Cell;
use crate::ports::workbook_port::WorkbookPort;
use calamine::{Data, Range, Reader, Sheets, open_workbook_auto};
use std::cell::RefCell;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

pub struct XlsxAdapter {
    path: PathBuf,
    sheets: RefCell<Sheets<BufReader<File>>>,
}

impl XlsxAdapter {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, PerfchartError> {
        let path = path.as_ref().to_path_buf();
        let sheets = open_workbook_auto(&path).map_err(|e| PerfchartError::Workbook {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            path,
            sheets: RefCell::new(sheets),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl WorkbookPort for XlsxAdapter {
    fn source_name(&self) -> String {
        self.path.display().to_string()
    }

    fn sheet_names(&self) -> Vec<String> {
        self.sheets.borrow().sheet_names()
    }

    fn read_grid(&self, sheet: &str) -> Result<Vec<Vec<Cell>>, PerfchartError> {
        let range = self
            .sheets
            .borrow_mut()
            .worksheet_range(sheet)
            .map_err(|e| PerfchartError::SheetRead {
                sheet: sheet.to_string(),
                reason: e.to_string(),
            })?;
        Ok(range_to_grid(&range))
    }
}

/// Re-anchors a used range at A1 so grid indices match worksheet rows.
fn range_to_grid(range: &Range<Data>) -> Vec<Vec<Cell>> {
    let Some((start_row, start_col)) = range.start() else {
        return Vec::new();
    };

    let mut grid: Vec<Vec<Cell>> = vec![Vec::new(); start_row as usize];
    for row in range.rows() {
        let mut cells = vec![Cell::Empty; start_col as usize];
        cells.extend(row.iter().map(to_cell));
        grid.push(cells);
    }
    grid
}

fn to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::String(s) => Cell::Text(s.clone()),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => Cell::DateTime(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(e) => Cell::Error(e.to_string()),
    }
}
