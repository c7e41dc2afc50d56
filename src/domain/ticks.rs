//! Tick selection for the category (date) axis and the value axes.

/// Label count the batch asks for on the date axis.
pub const DEFAULT_TARGET_LABELS: usize = 10;

/// Default of [`choose_uniform_ticks`] when callers have no preference.
pub const SAMPLER_DEFAULT_TARGET: usize = 12;

const MIN_TARGET_LABELS: usize = 3;

/// Upper bound on ticks per value axis.
pub const MAX_VALUE_TICKS: usize = 1000;

/// Picks roughly `target_labels` evenly spaced positions in `0..n_points`.
///
/// The result is strictly increasing, always holds 0 and `n_points - 1`, and
/// is the full range when the series is short enough to label every point.
/// `n_points == 0` gives an empty set.
pub fn choose_uniform_ticks(n_points: usize, target_labels: usize) -> Vec<usize> {
    let target = target_labels.max(MIN_TARGET_LABELS);
    if n_points <= target {
        return (0..n_points).collect();
    }

    let step = n_points.div_ceil(target);
    let mut positions: Vec<usize> = (0..n_points).step_by(step).collect();

    if positions.first() != Some(&0) {
        positions.insert(0, 0);
    }
    let last = n_points - 1;
    if positions.last() != Some(&last) {
        positions.push(last);
    }

    positions.sort_unstable();
    positions.dedup();
    positions
}

/// Whether `step` divides `min..max` into at most [`MAX_VALUE_TICKS`] ticks.
pub fn within_tick_budget(min: f64, max: f64, step: f64) -> bool {
    step > 0.0 && (max - min) / step < MAX_VALUE_TICKS as f64
}

/// Values `min, min + step, ...` up to and including `max`.
///
/// A small tolerance keeps `max` when repeated addition lands just short of
/// it. Non-positive or non-finite steps, inverted ranges and steps beyond
/// the tick budget give no ticks.
pub fn value_ticks(min: f64, max: f64, step: f64) -> Vec<f64> {
    if !(min.is_finite() && max.is_finite() && step.is_finite()) || step <= 0.0 || max < min {
        return Vec::new();
    }
    if !within_tick_budget(min, max, step) {
        return Vec::new();
    }

    let tolerance = 1e-9 * step.abs().max(1.0);
    let count = ((max - min + tolerance) / step).floor() as usize;
    (0..=count)
        .map(|k| round_to_step(min + k as f64 * step, step))
        .collect()
}

/// Rounds a raw span/target quotient to 1, 2 or 5 times a power of ten.
pub fn nice_step(span: f64, target_count: usize) -> f64 {
    if !span.is_finite() || span <= 0.0 || target_count == 0 {
        return 0.01;
    }
    let raw = span / target_count as f64;
    let magnitude = 10.0_f64.powf(raw.log10().floor());
    let normalized = raw / magnitude;
    let nice = if normalized < 1.5 {
        1.0
    } else if normalized < 3.0 {
        2.0
    } else if normalized < 7.0 {
        5.0
    } else {
        10.0
    };
    nice * magnitude
}

/// Multiples of `step` that fall inside `[min, max]`.
pub fn aligned_ticks(min: f64, max: f64, step: f64) -> Vec<f64> {
    if !(step.is_finite() && step > 0.0) {
        return Vec::new();
    }
    let first = (min / step).ceil() * step;
    value_ticks(first, max, step)
}

// Strips accumulated float error, e.g. 0.30000000000000004 -> 0.3.
fn round_to_step(value: f64, step: f64) -> f64 {
    let decimals = (-step.abs().log10().floor()).max(0.0) as i32 + 6;
    let factor = 10.0_f64.powi(decimals.min(15));
    let rounded = (value * factor).round() / factor;
    if rounded == 0.0 { 0.0 } else { rounded }
}
