//! Rendering and batch settings, read from the `[chart]` and `[batch]`
//! sections of an optional INI file.

use crate::domain::axis::SecondaryDefaults;
use crate::domain::error::PerfchartError;
use crate::domain::series::DATA_HEADER_OFFSET;
use crate::domain::ticks::DEFAULT_TARGET_LABELS;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;
use std::fmt::Write;
use std::path::PathBuf;

/// What to do with a configuration row that has no data sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnmatchedPolicy {
    #[default]
    Skip,
    Fail,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartSettings {
    /// Figure size in inches.
    pub fig_width: f64,
    pub fig_height: f64,
    pub dpi: u32,
    pub target_labels: usize,
    /// Bar width as a fraction of one x slot.
    pub bar_width: f64,
    /// Fraction of the figure height reserved below the plot for the legend.
    pub bottom_space: f64,
    pub default_right_step: f64,
    pub default_right_min: f64,
    pub date_format: String,
    pub font_path: Option<PathBuf>,
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self {
            fig_width: 12.0,
            fig_height: 8.0,
            dpi: 150,
            target_labels: DEFAULT_TARGET_LABELS,
            bar_width: 0.8,
            bottom_space: 0.18,
            default_right_step: 1000.0,
            default_right_min: 0.0,
            date_format: "%Y/%m/%d".to_string(),
            font_path: None,
        }
    }
}

impl ChartSettings {
    /// Output size in pixels.
    pub fn pixel_size(&self) -> (u32, u32) {
        (
            (self.fig_width * self.dpi as f64).round() as u32,
            (self.fig_height * self.dpi as f64).round() as u32,
        )
    }

    pub fn secondary_defaults(&self) -> SecondaryDefaults {
        SecondaryDefaults {
            min: self.default_right_min,
            step: self.default_right_step,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatchSettings {
    pub on_unmatched: UnmatchedPolicy,
    pub header_offset: usize,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            on_unmatched: UnmatchedPolicy::Skip,
            header_offset: DATA_HEADER_OFFSET,
        }
    }
}

fn invalid(section: &str, key: &str, reason: &str) -> PerfchartError {
    PerfchartError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn positive(config: &dyn ConfigPort, key: &str, default: f64) -> Result<f64, PerfchartError> {
    let value = config.get_double("chart", key, default);
    if !value.is_finite() || value <= 0.0 {
        return Err(invalid("chart", key, &format!("{key} must be positive")));
    }
    Ok(value)
}

fn fraction(config: &dyn ConfigPort, key: &str, default: f64) -> Result<f64, PerfchartError> {
    let value = config.get_double("chart", key, default);
    if !(value > 0.0 && value < 1.0) {
        return Err(invalid("chart", key, &format!("{key} must be between 0 and 1")));
    }
    Ok(value)
}

/// Formats `date` with `pattern`, or `None` when the pattern is malformed or
/// asks for fields a date does not have (time of day, offset).
pub fn format_date(date: NaiveDate, pattern: &str) -> Option<String> {
    let mut out = String::new();
    write!(out, "{}", date.format(pattern)).ok()?;
    Some(out)
}

pub fn build_chart_settings(config: &dyn ConfigPort) -> Result<ChartSettings, PerfchartError> {
    let defaults = ChartSettings::default();

    let dpi = config.get_int("chart", "dpi", defaults.dpi as i64);
    if !(1..=1200).contains(&dpi) {
        return Err(invalid("chart", "dpi", "dpi must be between 1 and 1200"));
    }

    let target_labels = config.get_int("chart", "target_labels", defaults.target_labels as i64);
    if target_labels < 1 {
        return Err(invalid("chart", "target_labels", "target_labels must be at least 1"));
    }

    let default_right_min = config.get_double("chart", "default_right_min", defaults.default_right_min);
    if !default_right_min.is_finite() {
        return Err(invalid("chart", "default_right_min", "default_right_min must be a number"));
    }

    let date_format = config
        .get_string("chart", "date_format")
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(defaults.date_format);
    if format_date(NaiveDate::MIN, &date_format).is_none() {
        return Err(invalid(
            "chart",
            "date_format",
            "not a strftime pattern that formats a plain date",
        ));
    }

    Ok(ChartSettings {
        fig_width: positive(config, "fig_width", defaults.fig_width)?,
        fig_height: positive(config, "fig_height", defaults.fig_height)?,
        dpi: dpi as u32,
        target_labels: target_labels as usize,
        bar_width: fraction(config, "bar_width", defaults.bar_width)?,
        bottom_space: fraction(config, "bottom_space", defaults.bottom_space)?,
        default_right_step: positive(config, "default_right_step", defaults.default_right_step)?,
        default_right_min,
        date_format,
        font_path: config
            .get_string("chart", "font_path")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from),
    })
}

pub fn build_batch_settings(config: &dyn ConfigPort) -> Result<BatchSettings, PerfchartError> {
    let on_unmatched = match config
        .get_string("batch", "on_unmatched")
        .map(|s| s.trim().to_lowercase())
        .as_deref()
    {
        None | Some("") | Some("skip") => UnmatchedPolicy::Skip,
        Some("fail") => UnmatchedPolicy::Fail,
        Some(other) => {
            return Err(invalid(
                "batch",
                "on_unmatched",
                &format!("expected skip or fail, got '{other}'"),
            ));
        }
    };

    let header_offset = config.get_int("batch", "header_offset", DATA_HEADER_OFFSET as i64);
    if header_offset < 0 {
        return Err(invalid("batch", "header_offset", "header_offset must be non-negative"));
    }

    Ok(BatchSettings {
        on_unmatched,
        header_offset: header_offset as usize,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()
    }

    #[test]
    fn date_patterns_format_plain_dates() {
        assert_eq!(format_date(day(), "%Y/%m/%d").as_deref(), Some("2024/03/05"));
        assert_eq!(format_date(day(), "%m月%d日").as_deref(), Some("03月05日"));
    }

    #[test]
    fn time_and_offset_fields_are_unformattable() {
        for pattern in ["%H:%M", "%S", "%p", "%z", "%Q"] {
            assert_eq!(format_date(day(), pattern), None, "pattern {pattern}");
        }
    }
}
