//! Axis range resolution.
//!
//! Each axis is resolved exactly once, before drawing starts, into a
//! [`ResolvedAxis`]. The renderer only ever sees concrete ranges and ticks.

use crate::domain::axis_config::AxisBounds;
use crate::domain::series::TimeSeriesRecord;
use crate::domain::ticks::{aligned_ticks, nice_step, value_ticks, within_tick_budget};

/// Padding added around data-derived return ranges (one percentage point).
pub const RETURN_PADDING: f64 = 0.01;

const DERIVED_TICK_TARGET: usize = 6;

/// Where an axis range comes from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AxisSpec {
    Explicit { min: f64, max: f64, step: f64 },
    DataDerived,
}

impl AxisSpec {
    /// Explicit only when all three values are usable together and the step
    /// yields a bounded number of ticks.
    pub fn from_bounds(bounds: &AxisBounds) -> Self {
        match (bounds.min, bounds.max, bounds.step) {
            (Some(min), Some(max), Some(step))
                if min < max && within_tick_budget(min, max, step) =>
            {
                AxisSpec::Explicit { min, max, step }
            }
            _ => AxisSpec::DataDerived,
        }
    }
}

/// A concrete range with its tick values.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedAxis {
    pub min: f64,
    pub max: f64,
    pub ticks: Vec<f64>,
}

/// Return axis: explicit configuration, else padded data extent.
pub fn resolve_primary(spec: AxisSpec, series: &TimeSeriesRecord) -> ResolvedAxis {
    match spec {
        AxisSpec::Explicit { min, max, step } => ResolvedAxis {
            min,
            max,
            ticks: value_ticks(min, max, step),
        },
        AxisSpec::DataDerived => {
            let (lo, hi) = series.return_extent().unwrap_or((0.0, 0.0));
            let min = lo - RETURN_PADDING;
            let max = hi + RETURN_PADDING;
            let step = nice_step(max - min, DERIVED_TICK_TARGET);
            ResolvedAxis {
                min,
                max,
                ticks: aligned_ticks(min, max, step),
            }
        }
    }
}

/// Defaults applied to whatever the secondary-axis row leaves out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SecondaryDefaults {
    pub min: f64,
    pub step: f64,
}

/// Volume axis: each of min/step/max falls back on its own.
///
/// A missing max becomes the smallest multiple of the step covering the
/// largest asset/share value (and at least one step), so ticks divide the
/// range evenly.
pub fn resolve_secondary(
    bounds: &AxisBounds,
    defaults: SecondaryDefaults,
    series: &TimeSeriesRecord,
) -> ResolvedAxis {
    let min = bounds.min.unwrap_or(defaults.min);
    let step = bounds.step.filter(|s| *s > 0.0).unwrap_or(defaults.step);
    let max = match bounds.max {
        Some(max) => max,
        None => {
            let observed = series.volume_max().unwrap_or(step).max(step);
            (observed / step).ceil() * step
        }
    };
    let max = if max > min { max } else { min + step };
    let step = if within_tick_budget(min, max, step) {
        step
    } else {
        nice_step(max - min, DERIVED_TICK_TARGET)
    };
    ResolvedAxis {
        min,
        max,
        ticks: value_ticks(min, max, step),
    }
}

/// Formats a fractional return as a whole percentage.
pub fn format_percent(value: f64) -> String {
    let pct = (value * 100.0).round();
    format!("{:.0}%", if pct == 0.0 { 0.0 } else { pct })
}

/// Formats a volume tick.
pub fn format_volume(value: f64) -> String {
    let rounded = value.round();
    if (value - rounded).abs() < 1e-9 {
        format!("{:.0}", if rounded == 0.0 { 0.0 } else { rounded })
    } else {
        format!("{value:.2}")
    }
}
