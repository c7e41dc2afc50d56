//! Renderer-agnostic chart description.
//!
//! [`ChartSpec::build`] does every decision a chart needs (axis ranges,
//! ticks, labels, legend order) so that a renderer only draws.

use crate::domain::axis::{
    AxisSpec, ResolvedAxis, format_percent, format_volume, resolve_primary, resolve_secondary,
};
use crate::domain::axis_config::AxisConfigRow;
use crate::domain::series::TimeSeriesRecord;
use crate::domain::settings::{ChartSettings, format_date};
use crate::domain::ticks::choose_uniform_ticks;

/// Caption for the secondary axis unit (ten thousand yuan).
pub const VOLUME_UNIT: &str = "万元";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

pub const COMBO_COLOR: Rgb = Rgb(0x1f, 0x77, 0xb4);
pub const BENCHMARK_COLOR: Rgb = Rgb(0xff, 0x7f, 0x0e);
pub const EXCESS_COLOR: Rgb = Rgb(0xd6, 0x27, 0x28);
pub const ASSETS_COLOR: Rgb = Rgb(0xd3, 0xd3, 0xd3);
pub const SHARES_COLOR: Rgb = Rgb(0xff, 0xd7, 0x00);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesKind {
    Line,
    Bar,
}

/// One drawable series; `values[i]` sits at x slot `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub label: String,
    pub kind: SeriesKind,
    pub color: Rgb,
    pub opacity: f64,
    /// Line width in points; unused for bars.
    pub line_width: f64,
    pub values: Vec<Option<f64>>,
}

/// A resolved axis together with its tick labels.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisLayout {
    pub range: ResolvedAxis,
    pub labels: Vec<String>,
}

impl AxisLayout {
    fn new(range: ResolvedAxis, format: fn(f64) -> String) -> Self {
        let labels = range.ticks.iter().map(|v| format(*v)).collect();
        Self { range, labels }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub title: String,
    pub size: (u32, u32),
    pub dpi: u32,
    pub bottom_space: f64,
    pub bar_width: f64,
    pub n_points: usize,
    /// Visible x range; integer slots are centred inside it.
    pub x_range: (f64, f64),
    pub x_ticks: Vec<usize>,
    pub x_labels: Vec<String>,
    pub primary: AxisLayout,
    pub secondary: AxisLayout,
    pub secondary_unit: String,
    pub primary_series: Vec<ChartSeries>,
    /// Drawn first, beneath the primary layer, in this order.
    pub secondary_series: Vec<ChartSeries>,
}

impl ChartSpec {
    pub fn build(
        title: &str,
        series: &TimeSeriesRecord,
        axes: &AxisConfigRow,
        settings: &ChartSettings,
    ) -> Self {
        let n = series.len();
        let x_ticks = choose_uniform_ticks(n, settings.target_labels);
        let x_labels = x_ticks
            .iter()
            .map(|&i| {
                let date = series.points[i].date;
                format_date(date, &settings.date_format).unwrap_or_else(|| date.to_string())
            })
            .collect();

        let primary = resolve_primary(AxisSpec::from_bounds(&axes.left), series);
        let secondary =
            resolve_secondary(&axes.right, settings.secondary_defaults(), series);

        let column = |f: fn(&crate::domain::series::SeriesPoint) -> Option<f64>| {
            series.points.iter().map(f).collect::<Vec<_>>()
        };

        let line = |label: &str, color: Rgb, values: Vec<Option<f64>>| ChartSeries {
            label: label.to_string(),
            kind: SeriesKind::Line,
            color,
            opacity: 1.0,
            line_width: 1.6,
            values,
        };

        let primary_series = vec![
            line("组合累计收益", COMBO_COLOR, column(|p| p.combo_return)),
            line("基准累计收益", BENCHMARK_COLOR, column(|p| p.benchmark_return)),
            line("超额收益", EXCESS_COLOR, column(|p| p.excess_return)),
        ];

        let secondary_series = vec![
            ChartSeries {
                label: "总资产（万元）".to_string(),
                kind: SeriesKind::Bar,
                color: ASSETS_COLOR,
                opacity: 1.0,
                line_width: 0.0,
                values: column(|p| p.total_assets),
            },
            ChartSeries {
                opacity: 0.8,
                line_width: 1.2,
                ..line("总份额（万份）", SHARES_COLOR, column(|p| p.total_shares))
            },
        ];

        Self {
            title: title.to_string(),
            size: settings.pixel_size(),
            dpi: settings.dpi,
            bottom_space: settings.bottom_space,
            bar_width: settings.bar_width,
            n_points: n,
            x_range: (-0.5, n as f64 - 0.5),
            x_ticks,
            x_labels,
            primary: AxisLayout::new(primary, format_percent),
            secondary: AxisLayout::new(secondary, format_volume),
            secondary_unit: VOLUME_UNIT.to_string(),
            primary_series,
            secondary_series,
        }
    }

    /// Legend entries: primary series first, then secondary.
    pub fn legend(&self) -> impl Iterator<Item = &ChartSeries> {
        self.primary_series.iter().chain(&self.secondary_series)
    }
}
