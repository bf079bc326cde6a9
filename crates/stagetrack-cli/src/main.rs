//! stagetrack CLI - Planned vs. actual stage timelines
//!
//! Command-line interface for evaluating, reporting and rendering stage
//! timelines from JSON record files.

mod config;
mod output;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use stagetrack_core::{Renderer, StageCatalog, StageCode, ViewFilters, ViewState, VisualizationMode};
use stagetrack_parser::load_or_sample;
use stagetrack_pipeline::{Evaluation, Report, ReportSort, SortKey, ViewDispatcher};
use stagetrack_render::{LayoutEngine, TextRenderer};

use crate::config::DashboardConfig;

#[derive(Parser)]
#[command(name = "stagetrack")]
#[command(author, version, about = "Planned vs. actual stage timeline engine", long_about = None)]
struct Cli {
    /// Verbose output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file (defaults to ./stagetrack.toml when present)
    #[arg(short, long, global = true, env = "STAGETRACK_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Lay out the timeline
    Layout {
        #[command(flatten)]
        view: ViewArgs,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Characters used for the chart area in text output
        #[arg(long, default_value_t = 60)]
        width: usize,
    },

    /// Export rows and project rollups
    Report {
        #[command(flatten)]
        view: ViewArgs,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Row order: default, project, planned-start, planned-end or variance
        #[arg(long, value_name = "KEY", default_value = "default")]
        sort: SortKey,

        /// Sort in descending order
        #[arg(long)]
        desc: bool,

        /// Emit the wide table (one row per project, columns per stage)
        #[arg(long)]
        pivot: bool,
    },

    /// Status counts for the view
    Status {
        #[command(flatten)]
        view: ViewArgs,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Print the canonical stage table
    Stages,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Input and view selection shared by the evaluating commands
#[derive(Args, Debug)]
struct ViewArgs {
    /// Input JSON file (sample dataset if omitted or unreadable)
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Reference date used as "today" (YYYY-MM-DD)
    #[arg(long, env = "STAGETRACK_AS_OF", value_name = "DATE")]
    as_of: Option<NaiveDate>,

    /// Show a single stage across projects
    #[arg(long, value_name = "STAGE")]
    stage: Option<String>,

    /// Keep only these org units (repeatable)
    #[arg(long = "org-unit", value_name = "UNIT")]
    org_units: Vec<String>,

    /// Keep only these projects (repeatable)
    #[arg(long = "project", value_name = "PROJECT")]
    projects: Vec<String>,

    /// Drop stages that are 100% complete
    #[arg(long)]
    hide_complete: bool,

    /// Bars to draw: planned, actual or both
    #[arg(long, value_name = "MODE", default_value = "both")]
    show: VisualizationMode,

    /// Shift planned dates by this many months
    #[arg(long, value_name = "MONTHS", allow_hyphen_values = true)]
    buffer_months: Option<i32>,
}

impl ViewArgs {
    fn today(&self) -> NaiveDate {
        self.as_of
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }

    /// Combine flags with the configured buffer into a view state
    fn view_state(&self, config: &DashboardConfig, catalog: &StageCatalog) -> Result<ViewState> {
        let mut filters = ViewFilters::new().hide_complete(self.hide_complete);
        if !self.org_units.is_empty() {
            filters = filters.org_units(self.org_units.iter().cloned());
        }
        if !self.projects.is_empty() {
            filters = filters.projects(self.projects.iter().cloned());
        }

        let mut buffer = config.buffer.policy();
        if let Some(months) = self.buffer_months {
            buffer.enabled = true;
            buffer.months = months;
        }

        let mut view = ViewState::new()
            .filters(filters)
            .visualization(self.show)
            .buffer(buffer);
        if let Some(label) = &self.stage {
            view = view.stage(resolve_stage(catalog, label)?);
        }
        Ok(view)
    }
}

fn resolve_stage(catalog: &StageCatalog, label: &str) -> Result<StageCode> {
    let stage = catalog.canonicalize(Some(label));
    if stage.is_unknown() {
        bail!("unknown stage '{}' (run `stagetrack stages` for the list)", label);
    }
    Ok(stage)
}

/// Everything an evaluating command works from
struct Session {
    config: DashboardConfig,
    dispatcher: ViewDispatcher,
    view: ViewState,
    evaluation: Evaluation,
}

impl Session {
    fn open(args: &ViewArgs, config: DashboardConfig) -> Result<Self> {
        let dispatcher = ViewDispatcher::new(config.catalog(), config.calendar());
        let view = args.view_state(&config, dispatcher.catalog())?;

        let loaded = load_or_sample(args.file.as_deref());
        if loaded.is_sample() {
            info!("evaluating the built-in sample dataset");
        }
        let today = args.today();
        debug!(records = loaded.records.len(), %today, mode = ?view.mode(), "evaluating");
        let evaluation = dispatcher.evaluate(&loaded.records, &view, today);

        Ok(Self {
            config,
            dispatcher,
            view,
            evaluation,
        })
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<DashboardConfig> {
    let cwd = std::env::current_dir().context("cannot determine working directory")?;
    DashboardConfig::discover(path, &cwd).context("failed to load configuration")
}

fn cmd_layout(session: &Session, format: OutputFormat, width: usize) -> Result<String> {
    let engine = LayoutEngine::new(session.config.layout.clone());
    let timeline = engine.layout(
        &session.evaluation.entries,
        &session.view,
        session.dispatcher.catalog(),
        session.evaluation.today,
    );
    match format {
        OutputFormat::Text => TextRenderer::new()
            .chart_width(width)
            .render(&timeline)
            .context("failed to render timeline"),
        OutputFormat::Json => {
            serde_json::to_string_pretty(&timeline).context("failed to serialize timeline")
        }
    }
}

fn cmd_report(
    session: &Session,
    format: OutputFormat,
    sort: ReportSort,
    pivot: bool,
) -> Result<String> {
    let report = Report::build(
        &session.evaluation,
        session.dispatcher.calendar(),
        session.dispatcher.catalog(),
        sort,
    );
    debug!(key = sort.key.as_str(), descending = sort.descending, pivot, "building report");
    match (format, pivot) {
        (OutputFormat::Text, false) => {
            output::report_text(&report).context("failed to format report")
        }
        (OutputFormat::Text, true) => {
            output::pivot_text(&report.pivot).context("failed to format pivot table")
        }
        (OutputFormat::Json, false) => {
            serde_json::to_string_pretty(&report).context("failed to serialize report")
        }
        (OutputFormat::Json, true) => {
            serde_json::to_string_pretty(&report.pivot).context("failed to serialize pivot table")
        }
    }
}

fn cmd_status(session: &Session, format: OutputFormat) -> Result<String> {
    let summary = session.evaluation.summary();
    match format {
        OutputFormat::Text => output::status_text(&summary).context("failed to format status"),
        OutputFormat::Json => {
            serde_json::to_string_pretty(&summary).context("failed to serialize status summary")
        }
    }
}

fn emit(text: &str) {
    if text.ends_with('\n') {
        print!("{}", text);
    } else {
        println!("{}", text);
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Some(Commands::Layout {
            view,
            format,
            width,
        }) => {
            let session = Session::open(&view, config)?;
            emit(&cmd_layout(&session, format, width)?);
        }
        Some(Commands::Report {
            view,
            format,
            sort,
            desc,
            pivot,
        }) => {
            let session = Session::open(&view, config)?;
            let sort = ReportSort::new(sort).descending(desc);
            emit(&cmd_report(&session, format, sort, pivot)?);
        }
        Some(Commands::Status { view, format }) => {
            let session = Session::open(&view, config)?;
            emit(&cmd_status(&session, format)?);
        }
        Some(Commands::Stages) => {
            let text = output::stages_text(&config.catalog(), &config.buffer.policy())
                .context("failed to format stage table")?;
            emit(&text);
        }
        None => {
            println!("stagetrack - Planned vs. actual stage timeline engine");
            println!("Run with --help for usage information");
        }
    }

    Ok(())
}
