//! CLI definition and dispatch.

use clap::{Args, Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::plotters_chart::PlottersChartAdapter;
use crate::adapters::xlsx_adapter::XlsxAdapter;
use crate::domain::axis_config::locate_axis_config;
use crate::domain::batch::{BatchContext, BatchReport, EntityOutcome, run_batch};
use crate::domain::entity_match::match_sheet_name;
use crate::domain::error::PerfchartError;
use crate::domain::settings::{
    BatchSettings, ChartSettings, UnmatchedPolicy, build_batch_settings, build_chart_settings,
};
use crate::domain::ticks::{SAMPLER_DEFAULT_TARGET, choose_uniform_ticks};
use crate::ports::workbook_port::WorkbookPort;

#[derive(Parser, Debug)]
#[command(
    name = "perfchart",
    about = "Batch dual-axis performance charts from spreadsheet workbooks"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render one chart per axis-configuration row
    Render(RenderArgs),
    /// Find the sheet holding the axis-configuration table
    Locate {
        #[arg(short, long)]
        workbook: PathBuf,
    },
    /// Show which data sheet an entity name resolves to
    Match {
        #[arg(short, long)]
        data: PathBuf,
        #[arg(short, long)]
        entity: String,
    },
    /// Print sampled x-axis tick positions for a series length
    Ticks {
        #[arg(long)]
        points: usize,
        #[arg(long, default_value_t = SAMPLER_DEFAULT_TARGET)]
        target: usize,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct RenderArgs {
    /// Workbook with one data sheet per entity
    #[arg(short, long)]
    pub data: PathBuf,
    /// Separate workbook holding the axis-configuration table
    #[arg(short, long)]
    pub axis_config: Option<PathBuf>,
    /// Defaults to the data workbook's directory
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
    /// INI file with [chart] and [batch] sections
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Only render this entity
    #[arg(long)]
    pub only: Option<String>,
    /// Abort when a configured entity has no data sheet
    #[arg(long)]
    pub strict: bool,
    #[arg(long)]
    pub dry_run: bool,
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Render(args) => run_render(&args),
        Command::Locate { workbook } => run_locate(&workbook),
        Command::Match { data, entity } => run_match(&data, &entity),
        Command::Ticks { points, target } => run_ticks(points, target),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, PerfchartError> {
    FileConfigAdapter::from_file(path).map_err(|e| PerfchartError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Chart and batch settings from an optional INI file; defaults otherwise.
pub fn load_settings(
    path: Option<&Path>,
) -> Result<(ChartSettings, BatchSettings), PerfchartError> {
    match path {
        Some(path) => {
            let adapter = load_config(path)?;
            Ok((build_chart_settings(&adapter)?, build_batch_settings(&adapter)?))
        }
        None => Ok((ChartSettings::default(), BatchSettings::default())),
    }
}

/// Output directory: explicit, else the data workbook's directory.
pub fn resolve_output_dir(data: &Path, explicit: Option<&Path>) -> PathBuf {
    match explicit {
        Some(dir) => dir.to_path_buf(),
        None => match data.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        },
    }
}

/// Runs the whole render pipeline without printing anything.
pub fn render_batch(args: &RenderArgs) -> Result<BatchReport, PerfchartError> {
    let (chart, mut batch) = load_settings(args.config.as_deref())?;
    if args.strict {
        batch.on_unmatched = UnmatchedPolicy::Fail;
    }

    let data = XlsxAdapter::open(&args.data)?;
    let separate = match &args.axis_config {
        Some(path) if path != &args.data => Some(XlsxAdapter::open(path)?),
        _ => None,
    };
    let axis_source: &dyn WorkbookPort = separate.as_ref().unwrap_or(&data);
    let axis = locate_axis_config(axis_source)?;

    let output_dir = resolve_output_dir(&args.data, args.output_dir.as_deref());
    if !args.dry_run {
        fs::create_dir_all(&output_dir)?;
    }

    let renderer = if args.dry_run {
        PlottersChartAdapter::without_text()
    } else {
        PlottersChartAdapter::new(&chart)
    };

    run_batch(&BatchContext {
        workbook: &data,
        renderer: &renderer,
        axis: &axis,
        chart: &chart,
        batch: &batch,
        output_dir: &output_dir,
        only: args.only.as_deref(),
        dry_run: args.dry_run,
    })
}

fn run_render(args: &RenderArgs) -> ExitCode {
    eprintln!("Reading data from {}", args.data.display());
    let report = match render_batch(args) {
        Ok(report) => report,
        Err(e) if e.is_fatal() => {
            eprintln!("error: {e}");
            return (&e).into();
        }
        Err(e) => {
            eprintln!("error: batch aborted: {e}");
            return (&e).into();
        }
    };

    eprintln!("Axis configuration: sheet '{}'", report.axis_sheet);
    for outcome in &report.outcomes {
        eprintln!("{}", describe_outcome(outcome));
    }
    if report.outcomes.is_empty() {
        if let Some(only) = &args.only {
            eprintln!("warning: no configuration row named '{only}'");
        }
    }
    let verb = if args.dry_run { "planned" } else { "rendered" };
    eprintln!(
        "Done: {} {verb}, {} skipped",
        report.rendered(),
        report.skipped()
    );
    ExitCode::SUCCESS
}

/// One status line per entity.
pub fn describe_outcome(outcome: &EntityOutcome) -> String {
    match outcome {
        EntityOutcome::Rendered {
            entity,
            sheet,
            path,
            points,
        } => format!(
            "saved {entity} ({sheet}, {points} points): {}",
            path.display()
        ),
        EntityOutcome::Planned {
            entity,
            sheet,
            path,
            points,
        } => format!(
            "would save {entity} ({sheet}, {points} points): {}",
            path.display()
        ),
        EntityOutcome::Skipped {
            entity,
            stage,
            reason,
        } => format!("skipped {entity} at {stage}: {reason}"),
    }
}

fn run_locate(workbook: &Path) -> ExitCode {
    let result = XlsxAdapter::open(workbook).and_then(|wb| locate_axis_config(&wb));
    let located = match result {
        Ok(located) => located,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    println!("sheet: {}", located.sheet_name);
    for row in &located.rows {
        println!(
            "{}\tleft {}/{}/{}\tright {}/{}/{}",
            row.entity_name,
            fmt_opt(row.left.min),
            fmt_opt(row.left.max),
            fmt_opt(row.left.step),
            fmt_opt(row.right.min),
            fmt_opt(row.right.max),
            fmt_opt(row.right.step),
        );
    }
    ExitCode::SUCCESS
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

fn run_match(data: &Path, entity: &str) -> ExitCode {
    let workbook = match XlsxAdapter::open(data) {
        Ok(wb) => wb,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let sheets = workbook.sheet_names();
    match match_sheet_name(entity, &sheets) {
        Some(sheet) => {
            println!("{sheet}");
            ExitCode::SUCCESS
        }
        None => {
            let err = PerfchartError::NoMatchingSheet {
                entity: entity.to_string(),
            };
            eprintln!("error: {err}");
            (&err).into()
        }
    }
}

fn run_ticks(points: usize, target: usize) -> ExitCode {
    let ticks: Vec<String> = choose_uniform_ticks(points, target)
        .iter()
        .map(|i| i.to_string())
        .collect();
    println!("{}", ticks.join(" "));
    ExitCode::SUCCESS
}
