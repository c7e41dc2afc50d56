//! Batch orchestration: one chart per axis-configuration row.
//!
//! Every entity walks `Located -> Matched -> Loaded -> Cleaned -> Rendered`.
//! Any failure on the way becomes a [`EntityOutcome::Skipped`] with a
//! readable reason; only the strict unmatched policy can stop the batch.

use crate::domain::axis_config::{AxisConfigRow, LocatedAxisConfig};
use crate::domain::chart::ChartSpec;
use crate::domain::entity_match::match_sheet_name;
use crate::domain::error::PerfchartError;
use crate::domain::series::clean_series;
use crate::domain::settings::{BatchSettings, ChartSettings, UnmatchedPolicy};
use crate::domain::table::Table;
use crate::ports::chart_port::ChartPort;
use crate::ports::workbook_port::WorkbookPort;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const UNSAFE_FILENAME_CHARS: [char; 9] = ['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Output file name for an entity: unsafe characters become `_`.
pub fn chart_file_name(entity: &str) -> String {
    let stem: String = entity
        .chars()
        .map(|c| if UNSAFE_FILENAME_CHARS.contains(&c) { '_' } else { c })
        .collect();
    format!("{stem}.png")
}

/// Pipeline stage at which an entity stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Matched,
    Loaded,
    Cleaned,
    Rendered,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Matched => "match",
            Stage::Loaded => "load",
            Stage::Cleaned => "clean",
            Stage::Rendered => "render",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntityOutcome {
    Rendered {
        entity: String,
        sheet: String,
        path: PathBuf,
        points: usize,
    },
    /// Dry run: everything except drawing and writing succeeded.
    Planned {
        entity: String,
        sheet: String,
        path: PathBuf,
        points: usize,
    },
    Skipped {
        entity: String,
        stage: Stage,
        reason: String,
    },
}

impl EntityOutcome {
    pub fn entity(&self) -> &str {
        match self {
            EntityOutcome::Rendered { entity, .. }
            | EntityOutcome::Planned { entity, .. }
            | EntityOutcome::Skipped { entity, .. } => entity,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, EntityOutcome::Skipped { .. })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    /// Sheet the axis configuration was read from.
    pub axis_sheet: String,
    pub outcomes: Vec<EntityOutcome>,
}

impl BatchReport {
    pub fn rendered(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.is_skipped()).count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_skipped()).count()
    }
}

/// Everything one batch run needs.
pub struct BatchContext<'a> {
    pub workbook: &'a dyn WorkbookPort,
    pub renderer: &'a dyn ChartPort,
    pub axis: &'a LocatedAxisConfig,
    pub chart: &'a ChartSettings,
    pub batch: &'a BatchSettings,
    pub output_dir: &'a Path,
    pub only: Option<&'a str>,
    pub dry_run: bool,
}

/// Processes configuration rows in order.
///
/// Returns `Err` only under [`UnmatchedPolicy::Fail`] when a row has no
/// data sheet.
pub fn run_batch(ctx: &BatchContext<'_>) -> Result<BatchReport, PerfchartError> {
    let sheets = ctx.workbook.sheet_names();
    let mut report = BatchReport {
        axis_sheet: ctx.axis.sheet_name.clone(),
        outcomes: Vec::new(),
    };

    for row in &ctx.axis.rows {
        if let Some(only) = ctx.only {
            if row.entity_name != only.trim() {
                continue;
            }
        }

        let outcome = match process_entity(ctx, row, &sheets) {
            Ok(outcome) => outcome,
            Err((stage, err)) => {
                if stage == Stage::Matched && ctx.batch.on_unmatched == UnmatchedPolicy::Fail {
                    return Err(err);
                }
                warn!(entity = %row.entity_name, %stage, reason = %err, "skipping entity");
                EntityOutcome::Skipped {
                    entity: row.entity_name.clone(),
                    stage,
                    reason: err.to_string(),
                }
            }
        };
        report.outcomes.push(outcome);
    }

    info!(
        rendered = report.rendered(),
        skipped = report.skipped(),
        "batch finished"
    );
    Ok(report)
}

fn process_entity(
    ctx: &BatchContext<'_>,
    row: &AxisConfigRow,
    sheets: &[String],
) -> Result<EntityOutcome, (Stage, PerfchartError)> {
    let entity = row.entity_name.as_str();

    let sheet = match_sheet_name(entity, sheets)
        .ok_or_else(|| {
            (
                Stage::Matched,
                PerfchartError::NoMatchingSheet {
                    entity: entity.to_string(),
                },
            )
        })?
        .to_string();

    let grid = ctx
        .workbook
        .read_grid(&sheet)
        .map_err(|e| (Stage::Loaded, e))?;
    let table = Table::from_grid(grid, ctx.batch.header_offset);

    let series = clean_series(&table, &sheet).map_err(|e| (Stage::Cleaned, e))?;

    let path = ctx.output_dir.join(chart_file_name(entity));
    let points = series.len();

    if ctx.dry_run {
        return Ok(EntityOutcome::Planned {
            entity: entity.to_string(),
            sheet,
            path,
            points,
        });
    }

    let spec = ChartSpec::build(entity, &series, row, ctx.chart);
    let png = ctx
        .renderer
        .render_png(&spec)
        .map_err(|e| (Stage::Rendered, e))?;
    write_artifact(&path, &png).map_err(|e| (Stage::Rendered, e))?;

    info!(entity = %entity, sheet = %sheet, path = %path.display(), points, "chart saved");
    Ok(EntityOutcome::Rendered {
        entity: entity.to_string(),
        sheet,
        path,
        points,
    })
}

/// Writes image bytes, leaving no partial file behind on failure.
fn write_artifact(path: &Path, bytes: &[u8]) -> Result<(), PerfchartError> {
    if let Err(e) = fs::write(path, bytes) {
        let _ = fs::remove_file(path);
        return Err(PerfchartError::Io(e));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_replaces_unsafe_characters() {
        assert_eq!(chart_file_name("A/B:C"), "A_B_C.png");
        assert_eq!(chart_file_name(r#"a\b*c?d"e<f>g|h"#), "a_b_c_d_e_f_g_h.png");
        assert_eq!(chart_file_name("稳健组合"), "稳健组合.png");
    }

    #[test]
    fn stage_names() {
        assert_eq!(Stage::Matched.to_string(), "match");
        assert_eq!(Stage::Rendered.to_string(), "render");
    }

    #[test]
    fn report_counts() {
        let report = BatchReport {
            axis_sheet: "坐标轴配置".into(),
            outcomes: vec![
                EntityOutcome::Skipped {
                    entity: "A".into(),
                    stage: Stage::Matched,
                    reason: "no matching sheet for 'A'".into(),
                },
                EntityOutcome::Rendered {
                    entity: "B".into(),
                    sheet: "B组合".into(),
                    path: PathBuf::from("B.png"),
                    points: 3,
                },
            ],
        };
        assert_eq!(report.rendered(), 1);
        assert_eq!(report.skipped(), 1);
        assert_eq!(report.outcomes[0].entity(), "A");
    }
}
