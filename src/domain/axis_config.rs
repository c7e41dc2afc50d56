//! Axis-configuration table: row model and workbook-wide discovery.
//!
//! The table can sit on any sheet. It is recognised purely by its columns:
//! once normalized, they must cover [`AXIS_CONFIG_KEYS`]. The first sheet in
//! file order that qualifies is used and later sheets are never consulted.

use crate::domain::column::{self, AXIS_CONFIG_KEYS, clean_number};
use crate::domain::error::PerfchartError;
use crate::domain::table::Table;
use crate::ports::workbook_port::WorkbookPort;
use tracing::{debug, info};

/// Optional range and tick spacing for one axis.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AxisBounds {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub step: Option<f64>,
}

impl AxisBounds {
    pub fn new(min: Option<f64>, max: Option<f64>, step: Option<f64>) -> Self {
        Self { min, max, step }
    }

    pub fn is_complete(&self) -> bool {
        self.min.is_some() && self.max.is_some() && self.step.is_some()
    }
}

/// Per-entity axis parameters, one row of the configuration sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisConfigRow {
    pub entity_name: String,
    pub left: AxisBounds,
    pub right: AxisBounds,
}

/// The qualifying sheet and its parsed rows.
#[derive(Debug, Clone, PartialEq)]
pub struct LocatedAxisConfig {
    pub sheet_name: String,
    pub rows: Vec<AxisConfigRow>,
}

/// Returns true when the normalized headers cover every required key.
pub fn is_axis_config_table(table: &Table) -> bool {
    let normalized: Vec<String> = table.headers.iter().map(|h| column::normalize(h)).collect();
    AXIS_CONFIG_KEYS
        .iter()
        .all(|key| normalized.iter().any(|h| h == key))
}

/// Parses the rows of a table already known to qualify.
///
/// Returns `None` when a required column is absent.
pub fn parse_axis_config(table: &Table) -> Option<Vec<AxisConfigRow>> {
    let normalized: Vec<String> = table.headers.iter().map(|h| column::normalize(h)).collect();
    let col = |key: &str| normalized.iter().position(|h| h == key);

    let name_col = col(column::ENTITY_NAME)?;
    let left = [
        col(column::LEFT_MIN)?,
        col(column::LEFT_MAX)?,
        col(column::LEFT_STEP)?,
    ];
    let right = [
        col(column::RIGHT_MIN)?,
        col(column::RIGHT_MAX)?,
        col(column::RIGHT_STEP)?,
    ];

    let bounds = |row: usize, cols: [usize; 3]| {
        AxisBounds::new(
            clean_number(table.cell(row, cols[0])),
            clean_number(table.cell(row, cols[1])),
            clean_number(table.cell(row, cols[2])),
        )
    };

    let rows = (0..table.row_count())
        .filter_map(|row| {
            let entity_name = table.cell(row, name_col).as_text().trim().to_string();
            if entity_name.is_empty() {
                return None;
            }
            Some(AxisConfigRow {
                entity_name,
                left: bounds(row, left),
                right: bounds(row, right),
            })
        })
        .collect();
    Some(rows)
}

/// Scans the workbook in sheet order and returns the first axis table.
pub fn locate_axis_config(
    workbook: &dyn WorkbookPort,
) -> Result<LocatedAxisConfig, PerfchartError> {
    for sheet in workbook.sheet_names() {
        let grid = match workbook.read_grid(&sheet) {
            Ok(grid) => grid,
            Err(e) => {
                debug!(sheet = %sheet, error = %e, "skipping unreadable sheet");
                continue;
            }
        };
        let table = Table::from_grid(grid, 0);
        if table.is_empty() || !is_axis_config_table(&table) {
            continue;
        }
        if let Some(rows) = parse_axis_config(&table) {
            info!(
                workbook = %workbook.source_name(),
                sheet = %sheet,
                rows = rows.len(),
                "found axis configuration table"
            );
            return Ok(LocatedAxisConfig {
                sheet_name: sheet,
                rows,
            });
        }
    }

    Err(PerfchartError::AxisConfigNotFound {
        workbook: workbook.source_name(),
        required: AXIS_CONFIG_KEYS.iter().map(|k| k.to_string()).collect(),
    })
}
