#![allow(dead_code)]

use perfchart::domain::chart::ChartSpec;
use perfchart::domain::error::PerfchartError;
use perfchart::domain::series::DATA_HEADER_OFFSET;
use perfchart::domain::table::Cell;
use perfchart::ports::chart_port::ChartPort;
use perfchart::ports::workbook_port::WorkbookPort;
use rust_xlsxwriter::Workbook;
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;

pub type Grid = Vec<Vec<Cell>>;

pub const AXIS_HEADER: [&str; 7] = [
    "组合名称",
    "left_min",
    "left_max",
    "left_step",
    "right_min",
    "right_max",
    "right_step",
];

pub const DATA_HEADER: [&str; 6] = [
    "日期",
    "组合累计收益(%)",
    "基准累计收益(%)",
    "超额收益",
    "总资产（万元）",
    "总份额（万份）",
];

/// In-memory workbook; sheets keep insertion order.
pub struct MockWorkbook {
    pub name: String,
    pub sheets: Vec<(String, Grid)>,
    pub errors: HashMap<String, String>,
}

impl MockWorkbook {
    pub fn new() -> Self {
        Self {
            name: "mock.xlsx".to_string(),
            sheets: Vec::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_sheet(mut self, name: &str, grid: Grid) -> Self {
        self.sheets.push((name.to_string(), grid));
        self
    }

    pub fn with_error(mut self, name: &str, reason: &str) -> Self {
        self.sheets.push((name.to_string(), Vec::new()));
        self.errors.insert(name.to_string(), reason.to_string());
        self
    }
}

impl WorkbookPort for MockWorkbook {
    fn source_name(&self) -> String {
        self.name.clone()
    }

    fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|(name, _)| name.clone()).collect()
    }

    fn read_grid(&self, sheet: &str) -> Result<Grid, PerfchartError> {
        if let Some(reason) = self.errors.get(sheet) {
            return Err(PerfchartError::SheetRead {
                sheet: sheet.to_string(),
                reason: reason.clone(),
            });
        }
        self.sheets
            .iter()
            .find(|(name, _)| name == sheet)
            .map(|(_, grid)| grid.clone())
            .ok_or_else(|| PerfchartError::SheetRead {
                sheet: sheet.to_string(),
                reason: "no such sheet".to_string(),
            })
    }
}

/// Records every chart it is asked to render.
pub struct MockChartPort {
    pub rendered: RefCell<Vec<ChartSpec>>,
    pub fail_for: Option<String>,
}

impl MockChartPort {
    pub fn new() -> Self {
        Self {
            rendered: RefCell::new(Vec::new()),
            fail_for: None,
        }
    }

    pub fn failing_for(entity: &str) -> Self {
        Self {
            fail_for: Some(entity.to_string()),
            ..Self::new()
        }
    }
}

impl ChartPort for MockChartPort {
    fn render_png(&self, chart: &ChartSpec) -> Result<Vec<u8>, PerfchartError> {
        if self.fail_for.as_deref() == Some(chart.title.as_str()) {
            return Err(PerfchartError::Render {
                entity: chart.title.clone(),
                reason: "backend exploded".to_string(),
            });
        }
        self.rendered.borrow_mut().push(chart.clone());
        Ok(b"\x89PNG\r\n\x1a\nmock".to_vec())
    }
}

pub fn text_row(values: &[&str]) -> Vec<Cell> {
    values.iter().map(|v| Cell::from(*v)).collect()
}

pub fn opt_cell(value: Option<f64>) -> Cell {
    value.map_or(Cell::Empty, Cell::Number)
}

/// Axis row: name, then left min/max/step and right min/max/step.
pub fn axis_row(name: &str, left: [Option<f64>; 3], right: [Option<f64>; 3]) -> Vec<Cell> {
    let mut row = vec![Cell::from(name)];
    row.extend(left.iter().chain(right.iter()).map(|v| opt_cell(*v)));
    row
}

pub fn axis_grid(rows: Vec<Vec<Cell>>) -> Grid {
    let mut grid = vec![text_row(&AXIS_HEADER)];
    grid.extend(rows);
    grid
}

/// One data row: date text, three returns, assets, shares.
pub fn data_row(date: &str, values: [f64; 5]) -> Vec<Cell> {
    let mut row = vec![Cell::from(date)];
    row.extend(values.iter().map(|v| Cell::Number(*v)));
    row
}

/// Data sheet with a metadata block above the header at row 40.
pub fn data_grid(header: &[&str], rows: Vec<Vec<Cell>>) -> Grid {
    let mut grid: Grid = vec![Vec::new(); DATA_HEADER_OFFSET];
    grid[0] = text_row(&["组合概况"]);
    grid[1] = text_row(&["成立日期", "2023/12/29"]);
    grid.push(text_row(header));
    grid.extend(rows);
    grid
}

pub fn three_day_rows() -> Vec<Vec<Cell>> {
    vec![
        data_row("2024/01/02", [0.00, 0.00, 0.00, 1200.0, 1000.0]),
        data_row("2024/01/03", [0.02, 0.01, 0.01, 1350.0, 1100.0]),
        data_row("2024/01/04", [0.05, 0.03, 0.02, 1500.0, 1200.0]),
    ]
}

/// Writes grids to a real xlsx file.
pub fn write_xlsx(path: &Path, sheets: &[(&str, &Grid)]) {
    let mut workbook = Workbook::new();
    for (name, grid) in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(*name).unwrap();
        for (r, row) in grid.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                let (r, c) = (r as u32, c as u16);
                match cell {
                    Cell::Empty => {}
                    Cell::Number(v) | Cell::DateTime(v) => {
                        worksheet.write_number(r, c, *v).unwrap();
                    }
                    Cell::Text(s) | Cell::Error(s) => {
                        worksheet.write_string(r, c, s).unwrap();
                    }
                    Cell::Bool(b) => {
                        worksheet.write_boolean(r, c, *b).unwrap();
                    }
                }
            }
        }
    }
    workbook.save(path).unwrap();
}
