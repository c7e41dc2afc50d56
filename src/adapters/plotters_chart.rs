//! PNG chart renderer backed by `plotters`.
//!
//! The chart is drawn into an in-memory RGB buffer and only encoded once
//! every layer has been drawn, so a failed render never produces bytes.

use crate::adapters::fonts::{CHART_FONT_FAMILY, ensure_chart_font};
use crate::domain::chart::{ChartSeries, ChartSpec, Rgb, SeriesKind};
use crate::domain::error::PerfchartError;
use crate::domain::settings::ChartSettings;
use crate::ports::chart_port::ChartPort;
use image::{ImageFormat, RgbImage};
use plotters::coord::ranged1d::{DefaultFormatting, KeyPointHint};
use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;
use std::error::Error;
use std::io::Cursor;
use std::ops::Range;

type DrawResult = Result<(), Box<dyn Error>>;
type Point = (f64, f64);

const TITLE_PT: f64 = 14.0;
const TICK_PT: f64 = 9.0;
const LEGEND_PT: f64 = 9.0;
const GRID_COLOR: RGBColor = RGBColor(0xe6, 0xe6, 0xe6);

pub struct PlottersChartAdapter {
    text: bool,
}

impl PlottersChartAdapter {
    /// Registers the chart font (once per process) and decides whether text
    /// can be drawn at all.
    pub fn new(settings: &ChartSettings) -> Self {
        Self {
            text: ensure_chart_font(settings.font_path.as_deref()).is_some(),
        }
    }

    /// A renderer that draws shapes only.
    pub fn without_text() -> Self {
        Self { text: false }
    }
}

impl ChartPort for PlottersChartAdapter {
    fn render_png(&self, chart: &ChartSpec) -> Result<Vec<u8>, PerfchartError> {
        let render_err = |reason: String| PerfchartError::Render {
            entity: chart.title.clone(),
            reason,
        };

        let (width, height) = chart.size;
        let mut buf = vec![0u8; width as usize * height as usize * 3];
        draw_chart(chart, &mut buf, self.text).map_err(|e| render_err(e.to_string()))?;

        let img = RgbImage::from_raw(width, height, buf)
            .ok_or_else(|| render_err("pixel buffer does not match chart size".into()))?;
        let mut png = Vec::new();
        img.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| render_err(e.to_string()))?;
        Ok(png)
    }
}

/// An `f64` axis whose key points are exactly the precomputed ticks.
///
/// Light mesh lines are suppressed; only the ticks get grid lines, tick
/// marks and labels.
#[derive(Clone)]
struct TickedAxis {
    inner: RangedCoordf64,
    ticks: Vec<f64>,
}

impl TickedAxis {
    fn new(min: f64, max: f64, ticks: Vec<f64>) -> Self {
        Self {
            inner: (min..max).into(),
            ticks,
        }
    }
}

impl Ranged for TickedAxis {
    type FormatOption = DefaultFormatting;
    type ValueType = f64;

    fn map(&self, value: &f64, limit: (i32, i32)) -> i32 {
        self.inner.map(value, limit)
    }

    fn key_points<Hint: KeyPointHint>(&self, hint: Hint) -> Vec<f64> {
        if hint.weight().allow_light_points() {
            Vec::new()
        } else {
            self.ticks.clone()
        }
    }

    fn range(&self) -> Range<f64> {
        self.inner.range()
    }
}

/// The label stored for the tick at `value`, empty for anything else.
fn tick_label(ticks: impl IntoIterator<Item = f64>, labels: &[String], value: f64) -> String {
    ticks
        .into_iter()
        .zip(labels)
        .find(|(tick, _)| *tick == value)
        .map(|(_, label)| label.clone())
        .unwrap_or_default()
}

fn draw_chart(chart: &ChartSpec, buf: &mut [u8], text: bool) -> DrawResult {
    let root = BitMapBackend::with_buffer(buf, chart.size).into_drawing_area();
    root.fill(&WHITE)?;

    let (w, h) = (chart.size.0 as f64, chart.size.1 as f64);
    let px = |pt: f64| pt * chart.dpi as f64 / 72.0;
    let font = |pt: f64| (CHART_FONT_FAMILY, px(pt)).into_font().color(&BLACK);

    let primary = &chart.primary.range;
    let secondary = &chart.secondary.range;
    let (x0, x1) = chart.x_range;
    let x_ticks: Vec<f64> = chart.x_ticks.iter().map(|&i| i as f64).collect();

    let tick_len = px(3.0).round() as i32;
    let x_label_area = px(TICK_PT * 3.0).round() as u32;
    let y_label_area = (w * 0.07).round() as u32;
    let bottom_band = (h * chart.bottom_space).round() as u32;

    let mut builder = ChartBuilder::on(&root);
    builder
        .margin_top((h * 0.03).round() as u32)
        .margin_left((w * 0.01).round() as u32)
        .margin_right((w * 0.01).round() as u32)
        .margin_bottom(bottom_band.saturating_sub(x_label_area))
        .x_label_area_size(x_label_area)
        .y_label_area_size(y_label_area)
        .right_y_label_area_size(y_label_area);
    if text {
        builder.caption(&chart.title, font(TITLE_PT));
    }
    let mut ctx = builder
        .build_cartesian_2d(
            TickedAxis::new(x0, x1, x_ticks.clone()),
            TickedAxis::new(primary.min, primary.max, primary.ticks.clone()),
        )?
        .set_secondary_coord(
            x0..x1,
            TickedAxis::new(secondary.min, secondary.max, secondary.ticks.clone()),
        );

    let x_fmt = |v: &f64| tick_label(x_ticks.iter().copied(), &chart.x_labels, *v);
    let left_fmt = |v: &f64| tick_label(primary.ticks.iter().copied(), &chart.primary.labels, *v);
    let right_fmt =
        |v: &f64| tick_label(secondary.ticks.iter().copied(), &chart.secondary.labels, *v);

    let mut mesh = ctx.configure_mesh();
    mesh.disable_x_mesh()
        .bold_line_style(GRID_COLOR.stroke_width(1))
        .axis_style(BLACK.stroke_width(1))
        .set_all_tick_mark_size(tick_len);
    if text {
        mesh.x_label_formatter(&x_fmt)
            .y_label_formatter(&left_fmt)
            .label_style(font(TICK_PT));
    } else {
        mesh.disable_axes();
    }
    mesh.draw()?;

    if text {
        ctx.configure_secondary_axes()
            .axis_style(BLACK.stroke_width(1))
            .set_all_tick_mark_size(tick_len)
            .y_label_formatter(&right_fmt)
            .label_style(font(TICK_PT))
            .y_desc(chart.secondary_unit.as_str())
            .draw()?;
    }

    for series in &chart.secondary_series {
        match series.kind {
            SeriesKind::Bar => {
                let bars = bar_rects(series, chart.bar_width, secondary.min, secondary.max);
                ctx.draw_secondary_series(bars)?;
            }
            SeriesKind::Line => {
                ctx.draw_secondary_series(line_paths(series, secondary.min, secondary.max, px))?;
            }
        }
    }
    for series in &chart.primary_series {
        ctx.draw_series(line_paths(series, primary.min, primary.max, px))?;
    }

    if text {
        let swatch = px(18.0).round() as i32;
        for series in chart.legend() {
            let color = rgb(series.color).mix(series.opacity);
            let entry = ctx.draw_series(std::iter::empty::<PathElement<Point>>())?;
            entry.label(series.label.as_str());
            match series.kind {
                SeriesKind::Bar => {
                    let style = color.filled();
                    entry.legend(move |(x, y)| {
                        Rectangle::new([(x, y - swatch / 3), (x + swatch, y + swatch / 3)], style)
                    });
                }
                SeriesKind::Line => {
                    let style = color.stroke_width(stroke_px(series.line_width, px));
                    entry.legend(move |(x, y)| {
                        PathElement::new(vec![(x, y), (x + swatch, y)], style)
                    });
                }
            }
        }

        let (_, plot_h) = ctx.plotting_area().dim_in_pixel();
        let legend_y = plot_h as i32 + x_label_area as i32 + tick_len;
        ctx.configure_series_labels()
            .position(SeriesLabelPosition::Coordinate(0, legend_y))
            .legend_area_size(swatch)
            .margin(tick_len)
            .label_font(font(LEGEND_PT))
            .draw()?;
    }

    root.present()?;
    Ok(())
}

fn rgb(color: Rgb) -> RGBColor {
    RGBColor(color.0, color.1, color.2)
}

fn stroke_px(line_width_pt: f64, px: impl Fn(f64) -> f64) -> u32 {
    (px(line_width_pt).round() as u32).max(1)
}

/// One rectangle per present value, clamped to the visible range and
/// standing on zero (or the nearest visible bound).
fn bar_rects(series: &ChartSeries, bar_width: f64, min: f64, max: f64) -> Vec<Rectangle<Point>> {
    let style = rgb(series.color).mix(series.opacity).filled();
    let base = 0.0_f64.clamp(min, max);
    series
        .values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| {
            let top = (*v)?.clamp(min, max);
            if top == base {
                return None;
            }
            let x = i as f64;
            Some(Rectangle::new(
                [(x - bar_width / 2.0, base), (x + bar_width / 2.0, top)],
                style,
            ))
        })
        .collect()
}

fn line_paths(
    series: &ChartSeries,
    min: f64,
    max: f64,
    px: impl Fn(f64) -> f64,
) -> Vec<PathElement<Point>> {
    let style = rgb(series.color)
        .mix(series.opacity)
        .stroke_width(stroke_px(series.line_width, px));
    line_segments(&series.values)
        .filter_map(|(a, b)| clip_segment(a, b, min, max))
        .map(|(a, b)| PathElement::new(vec![a, b], style))
        .collect()
}

/// Segments between neighbouring present values; a missing value breaks
/// the line.
fn line_segments(values: &[Option<f64>]) -> impl Iterator<Item = (Point, Point)> + '_ {
    values.windows(2).enumerate().filter_map(|(i, pair)| {
        let (a, b) = (pair[0]?, pair[1]?);
        Some(((i as f64, a), (i as f64 + 1.0, b)))
    })
}

/// Clips a segment to the horizontal band `lo..=hi`.
fn clip_segment(p0: Point, p1: Point, lo: f64, hi: f64) -> Option<(Point, Point)> {
    let dy = p1.1 - p0.1;
    let (mut t0, mut t1) = (0.0_f64, 1.0_f64);
    if dy == 0.0 {
        if p0.1 < lo || p0.1 > hi {
            return None;
        }
    } else {
        let ta = (lo - p0.1) / dy;
        let tb = (hi - p0.1) / dy;
        t0 = t0.max(ta.min(tb));
        t1 = t1.min(ta.max(tb));
        if t0 > t1 {
            return None;
        }
    }
    let at = |t: f64| (p0.0 + t * (p1.0 - p0.0), p0.1 + t * dy);
    Some((at(t0), at(t1)))
}
