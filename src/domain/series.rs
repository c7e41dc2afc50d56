//! Entity time series: column discovery and cleaning.

use crate::domain::column::clean_number;
use crate::domain::error::PerfchartError;
use crate::domain::table::{Cell, Table};
use chrono::{Duration, NaiveDate, NaiveDateTime};

/// Rows above the header on every entity data sheet.
pub const DATA_HEADER_OFFSET: usize = 40;

pub const DATE_COLUMN: &str = "日期";

/// How a value column is recognised from its header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRule {
    Prefix(&'static str),
    Contains(&'static str),
}

impl ColumnRule {
    pub fn matches(&self, header: &str) -> bool {
        let header = header.trim();
        match self {
            ColumnRule::Prefix(p) => header.starts_with(p),
            ColumnRule::Contains(s) => header.contains(s),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ColumnRule::Prefix(s) | ColumnRule::Contains(s) => s,
        }
    }
}

pub const COMBO_RETURN: ColumnRule = ColumnRule::Prefix("组合累计收益");
pub const BENCHMARK_RETURN: ColumnRule = ColumnRule::Prefix("基准累计收益");
pub const EXCESS_RETURN: ColumnRule = ColumnRule::Prefix("超额收益");
pub const TOTAL_ASSETS: ColumnRule = ColumnRule::Contains("总资产");
pub const TOTAL_SHARES: ColumnRule = ColumnRule::Contains("总份额");

const VALUE_COLUMNS: [ColumnRule; 5] = [
    COMBO_RETURN,
    BENCHMARK_RETURN,
    EXCESS_RETURN,
    TOTAL_ASSETS,
    TOTAL_SHARES,
];

/// One dated observation. Returns are fractions, not percentages.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub combo_return: Option<f64>,
    pub benchmark_return: Option<f64>,
    pub excess_return: Option<f64>,
    pub total_assets: Option<f64>,
    pub total_shares: Option<f64>,
}

/// Cleaned, date-ordered series for one entity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeSeriesRecord {
    pub points: Vec<SeriesPoint>,
}

impl TimeSeriesRecord {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Finite (min, max) over the three return series.
    pub fn return_extent(&self) -> Option<(f64, f64)> {
        extent(self.points.iter().flat_map(|p| {
            [p.combo_return, p.benchmark_return, p.excess_return]
        }))
    }

    /// Largest finite asset or share value.
    pub fn volume_max(&self) -> Option<f64> {
        extent(
            self.points
                .iter()
                .flat_map(|p| [p.total_assets, p.total_shares]),
        )
        .map(|(_, max)| max)
    }
}

fn extent<I>(values: I) -> Option<(f64, f64)>
where
    I: IntoIterator<Item = Option<f64>>,
{
    values
        .into_iter()
        .flatten()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Column indices resolved once per sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesColumns {
    pub date: usize,
    pub combo_return: usize,
    pub benchmark_return: usize,
    pub excess_return: usize,
    pub total_assets: usize,
    pub total_shares: usize,
}

impl SeriesColumns {
    /// Locates the date column and the five value columns.
    ///
    /// Fails with every missing column named, not just the first.
    pub fn resolve(table: &Table, sheet: &str) -> Result<Self, PerfchartError> {
        let date = table.find_column(|h| h.trim() == DATE_COLUMN);
        let values: Vec<Option<usize>> = VALUE_COLUMNS
            .iter()
            .map(|rule| table.find_column(|h| rule.matches(h)))
            .collect();

        let mut missing = Vec::new();
        if date.is_none() {
            missing.push(DATE_COLUMN.to_string());
        }
        for (rule, idx) in VALUE_COLUMNS.iter().zip(&values) {
            if idx.is_none() {
                missing.push(rule.label().to_string());
            }
        }
        if !missing.is_empty() {
            return Err(PerfchartError::MissingColumns {
                sheet: sheet.to_string(),
                missing,
            });
        }

        let get = |i: usize| values[i].unwrap_or_default();
        Ok(Self {
            date: date.unwrap_or_default(),
            combo_return: get(0),
            benchmark_return: get(1),
            excess_return: get(2),
            total_assets: get(3),
            total_shares: get(4),
        })
    }
}

/// Resolves columns, drops rows without a usable date and sorts by date.
pub fn clean_series(table: &Table, sheet: &str) -> Result<TimeSeriesRecord, PerfchartError> {
    let cols = SeriesColumns::resolve(table, sheet)?;

    let mut points: Vec<SeriesPoint> = (0..table.row_count())
        .filter_map(|row| {
            let date = parse_date(table.cell(row, cols.date))?;
            Some(SeriesPoint {
                date,
                combo_return: clean_number(table.cell(row, cols.combo_return)),
                benchmark_return: clean_number(table.cell(row, cols.benchmark_return)),
                excess_return: clean_number(table.cell(row, cols.excess_return)),
                total_assets: clean_number(table.cell(row, cols.total_assets)),
                total_shares: clean_number(table.cell(row, cols.total_shares)),
            })
        })
        .collect();

    if points.is_empty() {
        return Err(PerfchartError::NoValidRows {
            sheet: sheet.to_string(),
        });
    }

    points.sort_by_key(|p| p.date);
    Ok(TimeSeriesRecord { points })
}

// Last serial Excel can represent (9999-12-31).
const MAX_EXCEL_SERIAL: f64 = 2_958_465.0;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d", "%Y年%m月%d日", "%Y%m%d"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M",
];

/// Interprets a cell as a calendar date.
///
/// Date cells and plain numbers in the Excel serial range are serial dates;
/// an eight-digit number such as 20240131 is read as `YYYYMMDD`.
pub fn parse_date(cell: &Cell) -> Option<NaiveDate> {
    match cell {
        Cell::DateTime(serial) => excel_serial_to_date(*serial),
        Cell::Number(n) => {
            if *n >= 1.0 && *n <= MAX_EXCEL_SERIAL {
                excel_serial_to_date(*n)
            } else if n.fract() == 0.0 {
                NaiveDate::parse_from_str(&format!("{}", *n as i64), "%Y%m%d").ok()
            } else {
                None
            }
        }
        Cell::Text(s) => parse_date_text(s.trim()),
        Cell::Empty | Cell::Bool(_) | Cell::Error(_) => None,
    }
}

fn parse_date_text(s: &str) -> Option<NaiveDate> {
    if s.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.date())
        })
}

/// Converts an Excel 1900-system serial to a date (time of day dropped).
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 0.0 || serial > MAX_EXCEL_SERIAL + 1.0 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::days(serial.floor() as i64))
}
