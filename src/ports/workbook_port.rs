//! Workbook access port trait.

use crate::domain::error::PerfchartError;
use crate::domain::table::Cell;

/// Read access to a multi-sheet workbook.
pub trait WorkbookPort {
    /// Human-readable identifier (usually the file path) for messages.
    fn source_name(&self) -> String;

    /// Sheet names in file order.
    fn sheet_names(&self) -> Vec<String>;

    /// Raw cell grid of a sheet. Row 0 and column 0 are the first worksheet
    /// row and column, even when the used range starts further in.
    fn read_grid(&self, sheet: &str) -> Result<Vec<Vec<Cell>>, PerfchartError>;
}
