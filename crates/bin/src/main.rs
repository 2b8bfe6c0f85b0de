//! Brinson CLI binary.
//!
//! Provides command-line interface for Brinson-Fachler performance attribution.

mod paths;

use brinson::data::{Dataset, SheetSource};
use brinson::output::{
    ExportError, ExportFormat, Exporter, ReportError, asset_rows, assets_dataframe,
};
use brinson::{
    AttributionOutcome, AttributionSession, BrinsonConfig, BrinsonError, SelectionRequest,
};
use chrono::NaiveDate;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Width of the largest bar in terminal charts.
const CHART_WIDTH: usize = 30;

#[derive(Parser)]
#[command(name = "brinson")]
#[command(about = "Brinson-Fachler performance attribution", long_about = None)]
#[command(version)]
struct Cli {
    /// Directory holding the workbook sheets (one CSV file per sheet)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Configuration file [default: <config dir>/brinson/config.toml]
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute attribution of a fund against the benchmark
    Run {
        /// Period start date (YYYY-MM-DD)
        #[arg(long)]
        start: Option<NaiveDate>,

        /// Period end date (YYYY-MM-DD)
        #[arg(long)]
        end: Option<NaiveDate>,

        /// Classification attribute to group by
        #[arg(long)]
        attribute: Option<String>,

        /// Fund to analyse
        #[arg(long)]
        fund: Option<String>,

        /// Output format [default: from the --output extension, else text]
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,

        /// Write output to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,

        /// Append a bar chart of the effects
        #[arg(long)]
        chart: bool,

        /// Append per-asset weights and returns
        #[arg(long)]
        assets: bool,
    },

    /// List dates with prices
    Dates,

    /// List classification attributes
    Attributes,

    /// List configured funds and how they resolve in the fund sheet
    Funds,

    /// Show rows dropped while loading
    Validate {
        /// Also check every configured fund's block
        #[arg(long)]
        funds: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Markdown,
    Json,
    Csv,
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Brinson(#[from] BrinsonError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error(transparent)]
    Report(#[from] ReportError),

    #[error("Failed to build asset frame: {0}")]
    Frame(String),

    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    fn guidance(&self, config: &BrinsonConfig) -> Option<String> {
        match self {
            Self::Brinson(e) => e.guidance(&config.sheets),
            _ => None,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match paths::load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };
    let config = match cli.data_dir {
        Some(dir) => config.with_data_dir(dir),
        None => config,
    };

    if let Err(e) = run(cli.command, config.clone()) {
        eprintln!("Error: {e}");
        if let Some(hint) = e.guidance(&config) {
            eprintln!("{hint}");
        }
        process::exit(1);
    }
}

fn init_tracing(verbosity: u8) {
    let default = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(command: Commands, config: BrinsonConfig) -> Result<(), CliError> {
    let session = AttributionSession::new(config);
    let source = session.workbook();
    let dataset = load_with_spinner(&session, &source)?;

    match command {
        Commands::Run {
            start,
            end,
            attribute,
            fund,
            format,
            output,
            chart,
            assets,
        } => {
            let request = SelectionRequest {
                start,
                end,
                dimension: attribute,
                fund,
            };
            let selection = session.controls(&dataset).select(&request)?;
            let outcome = session.run_selection(&dataset, &selection)?;
            let format = resolve_format(format, output.as_deref());
            match output {
                Some(path) => {
                    for written in write_run(&outcome, &source, &path, format, chart, assets)? {
                        println!("Wrote {}", written.display());
                    }
                }
                None => print!("{}", render_run(&outcome, &source, format, chart, assets)?),
            }
        }
        Commands::Dates => {
            let controls = session.controls(&dataset);
            let start = controls.default_start().ok();
            let end = controls.default_end().ok();
            for date in controls.dates() {
                let marker = if Some(date) == start {
                    "  (default start)"
                } else if Some(date) == end {
                    "  (default end)"
                } else {
                    ""
                };
                println!("{date}{marker}");
            }
        }
        Commands::Attributes => {
            let controls = session.controls(&dataset);
            let default = controls.default_dimension();
            for dimension in controls.dimensions() {
                let marker = if Some(dimension.as_str()) == default {
                    "  (default)"
                } else {
                    ""
                };
                println!("{dimension}{marker}");
            }
        }
        Commands::Funds => list_funds(&session, &dataset),
        Commands::Validate { funds } => validate(&session, &dataset, funds)?,
    }

    Ok(())
}

fn load_with_spinner(
    session: &AttributionSession,
    source: &dyn SheetSource,
) -> Result<Arc<Dataset>, BrinsonError> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(format!("Loading {}...", source.describe()));

    let loaded = session.load(source);
    match &loaded {
        Ok(dataset) => pb.finish_with_message(format!(
            "Loaded {} price dates, {} classified assets",
            dataset.prices().dates().len(),
            dataset.attributes().len()
        )),
        Err(_) => pb.finish_with_message("Failed!"),
    }
    loaded
}

/// Explicit `--format` wins; otherwise the output file's extension decides.
fn resolve_format(format: Option<OutputFormat>, output: Option<&Path>) -> OutputFormat {
    format
        .or_else(|| {
            let path = output?;
            if path.extension().is_some_and(|ext| ext == "md") {
                return Some(OutputFormat::Markdown);
            }
            ExportFormat::from_path(path).map(|export| match export {
                ExportFormat::Csv => OutputFormat::Csv,
                ExportFormat::Json | ExportFormat::PrettyJson => OutputFormat::Json,
            })
        })
        .unwrap_or(OutputFormat::Text)
}

/// Sibling file for the per-asset rows, e.g. `out/q2.csv` -> `out/q2_assets.csv`.
fn assets_path(path: &Path, format: ExportFormat) -> PathBuf {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("attribution");
    path.with_file_name(format!("{stem}_assets.{}", format.extension()))
}

/// Write a run to `path`, returning every file written.
///
/// CSV goes through the table exporter, with asset rows in a sibling file so
/// each file stays a single CSV table. Other formats write the rendered text.
fn write_run(
    outcome: &AttributionOutcome,
    source: &dyn SheetSource,
    path: &Path,
    format: OutputFormat,
    chart: bool,
    assets: bool,
) -> Result<Vec<PathBuf>, CliError> {
    let mut written = vec![path.to_path_buf()];
    if format == OutputFormat::Csv {
        outcome.table.export_to_file(path, ExportFormat::Csv)?;
        if assets {
            let sibling = assets_path(path, ExportFormat::Csv);
            asset_rows(&outcome.run).export_to_file(&sibling, ExportFormat::Csv)?;
            written.push(sibling);
        }
    } else {
        std::fs::write(path, render_run(outcome, source, format, chart, assets)?)?;
    }
    Ok(written)
}

fn render_run(
    outcome: &AttributionOutcome,
    source: &dyn SheetSource,
    format: OutputFormat,
    chart: bool,
    assets: bool,
) -> Result<String, CliError> {
    let table = &outcome.table;

    let mut rendered = match format {
        OutputFormat::Text => table.to_ascii_table(),
        OutputFormat::Markdown => table.to_markdown(),
        OutputFormat::Json => outcome.report(source.describe())?.to_json()?,
        OutputFormat::Csv => table.export_to_string(ExportFormat::Csv)?,
    };

    if chart && matches!(format, OutputFormat::Text | OutputFormat::Markdown) {
        let bars = outcome.chart().render_ascii(CHART_WIDTH);
        if format == OutputFormat::Markdown {
            rendered.push_str(&format!("\n```text{bars}```\n"));
        } else {
            rendered.push_str(&bars);
        }
    }

    if assets {
        let rows = asset_rows(&outcome.run);
        match format {
            OutputFormat::Csv => {
                rendered.push('\n');
                rendered.push_str(&rows.export_to_string(ExportFormat::Csv)?);
            }
            OutputFormat::Json => {
                rendered.push('\n');
                rendered.push_str(&rows.export_to_string(ExportFormat::PrettyJson)?);
            }
            OutputFormat::Text | OutputFormat::Markdown => {
                let frame = assets_dataframe(&rows).map_err(|e| CliError::Frame(e.to_string()))?;
                rendered.push_str(&format!("\nAssets\n{frame}\n"));
            }
        }
    }

    if !outcome.validation.is_empty() && format == OutputFormat::Text {
        rendered.push_str(&format!(
            "\n{} row(s) dropped while loading; run `brinson validate` for details\n",
            outcome.validation.len()
        ));
    }

    Ok(rendered)
}

fn list_funds(session: &AttributionSession, dataset: &Dataset) {
    let funds = dataset.funds();
    println!("Fund sheet: {}", funds.sheet_name());
    println!("Banner: {}", funds.banner_names().join(", "));
    for spec in &session.config().funds {
        match funds.locate(spec) {
            Ok(block) if block.positional => println!(
                "{}  columns {}/{} (positional fallback)",
                spec.name, block.asset_col, block.holdings_col
            ),
            Ok(block) => println!(
                "{}  columns {}/{}",
                spec.name, block.asset_col, block.holdings_col
            ),
            Err(e) => println!("{}  unavailable: {e}", spec.name),
        }
    }
}

fn validate(
    session: &AttributionSession,
    dataset: &Dataset,
    include_funds: bool,
) -> Result<(), CliError> {
    println!("Source fingerprint: {}", dataset.fingerprint().short());
    println!("{}", dataset.report());

    if include_funds {
        for spec in &session.config().funds {
            let (holdings, report) = dataset.fund_holdings(spec).map_err(BrinsonError::from)?;
            println!("{}: {} holdings", spec.name, holdings.len());
            if !report.is_empty() {
                println!("{report}");
            }
        }
    }

    Ok(())
}
