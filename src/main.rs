/// Duplicate Analyzer - duplicate detection for nested educational content data
///
/// The main entry point for the analyzer. It parses command-line arguments,
/// runs one analysis pass over the data file and renders the report.

use anyhow::Result;
use clap::{ArgAction, Parser};
use colored::Colorize;
use log::{error, info, warn, LevelFilter};
use std::fs::File;
use std::path::PathBuf;
use std::process;
use std::time::Instant;

use duplicate_analyzer::config;
use duplicate_analyzer::core::analyzer::{AnalysisOptions, AnalysisReport, DuplicateAnalyzer};
use duplicate_analyzer::core::extractor::Strategy;
use duplicate_analyzer::utils::file_utils::{self, SourceKind};
use duplicate_analyzer::utils::output_formatter::{self, FormatOptions};

/// Command line argument structure
#[derive(Parser, Debug)]
#[command(
    name = "duplicate_analyzer",
    version,
    about = "Report duplicate subjects, topics and titles in a nested content data file",
    long_about = "Extracts the subject > topic > title hierarchy from a generated data file
(e.g. `export const VideosData: VideosData[] = [...]`) and reports, per level:
- total, unique and duplicate counts
- every duplicated name with its occurrence count
- the parent contexts each duplicate occurs under"
)]
struct Args {
    /// Path to the data file to analyze
    #[arg(value_name = "FILE")]
    file_path: PathBuf,

    /// Extraction strategy (flat is lossy and best-effort)
    #[arg(long = "strategy", value_enum)]
    strategy: Option<Strategy>,

    /// Path to a JSON configuration file (strategy and markers)
    #[arg(long = "config")]
    config: Option<PathBuf>,

    /// Regex locating the outermost container
    #[arg(long = "container-marker", conflicts_with = "no_container")]
    container_marker: Option<String>,

    /// Treat the first `[` in the file as the container
    #[arg(long = "no-container", action = ArgAction::SetTrue)]
    no_container: bool,

    /// Number of duplicated titles shown in detail (default: 20)
    #[arg(long = "top", default_value = "20")]
    top: usize,

    /// Output in markdown format (wrapped in triple backticks)
    #[arg(long = "md", action = ArgAction::SetTrue)]
    md: bool,

    /// Export the report to a JSON file
    #[arg(long = "json")]
    json: Option<PathBuf>,

    /// Export the report to an HTML file
    #[arg(long = "html")]
    html: Option<PathBuf>,

    /// Export duplicate entries to a CSV file
    #[arg(long = "csv")]
    csv: Option<PathBuf>,

    /// Suppress terminal output
    #[arg(long = "quiet", action = ArgAction::SetTrue)]
    quiet: bool,

    /// Show only summary information
    #[arg(long = "summary-only", action = ArgAction::SetTrue)]
    summary_only: bool,

    /// Set logging level (default: WARN)
    #[arg(long = "log-level", default_value = "warn")]
    log_level: LevelFilter,

    /// Log file path (default: stderr)
    #[arg(long = "log-file")]
    log_file: Option<PathBuf>,
}

/// Main entry point function
fn main() -> Result<()> {
    let start_time = Instant::now();

    let args = Args::parse();

    setup_logging(&args);

    let options = load_options(&args);

    let analyzer = match DuplicateAnalyzer::new(&options) {
        Ok(analyzer) => analyzer,
        Err(e) => {
            eprintln!("{} {}", "Error:".red(), e);
            process::exit(1);
        }
    };

    let source = file_utils::read_source(&args.file_path)?;
    if source.kind == SourceKind::Json && analyzer.strategy() != Strategy::Typed {
        info!("{} is JSON; --strategy typed reads it as a tree", source.path.display());
    }

    let report = match analyzer.analyze(&source.content) {
        Ok(report) => report,
        Err(e) if e.is_structure_not_found() => {
            error!("{}", e);
            eprintln!("{} {}", "Could not extract data structure:".red(), e);
            process::exit(1);
        }
        Err(e) => return Err(e.into()),
    };

    export_report(&report, &args)?;

    if !args.quiet {
        let format_options = FormatOptions {
            markdown: args.md,
            summary_only: args.summary_only,
            top: args.top,
        };
        println!("{}", output_formatter::format_report(&report, &format_options));
        println!(
            "{} {:.2} seconds",
            "Time elapsed:".green(),
            start_time.elapsed().as_secs_f64()
        );
    }

    Ok(())
}

/// Set up logging with console or file output
fn setup_logging(args: &Args) {
    let mut builder = env_logger::Builder::new();

    builder.filter_level(args.log_level);

    builder.format(|buf, record| {
        use chrono::Local;
        use std::io::Write;
        writeln!(
            buf,
            "{} - {} - {} - {}",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            record.level(),
            record.target(),
            record.args()
        )
    });

    if let Some(log_file) = &args.log_file {
        match File::create(log_file) {
            Ok(file) => {
                builder.target(env_logger::Target::Pipe(Box::new(file)));
            }
            Err(e) => eprintln!("Could not open log file {}: {}", log_file.display(), e),
        }
    }

    builder.init();
}

/// Build analysis options from the configuration file and command line flags
fn load_options(args: &Args) -> AnalysisOptions {
    let mut options = match &args.config {
        Some(path) if !path.exists() => {
            error!("Configuration file not found: {}", path.display());
            config::default_config()
        }
        Some(path) => match config::read_config(path) {
            Ok(options) => {
                info!("Loaded configuration from {}", path.display());
                options
            }
            Err(e) => {
                error!("{:#}", e);
                config::default_config()
            }
        },
        None => config::default_config(),
    };

    if let Some(strategy) = args.strategy {
        options.strategy = strategy;
    }
    if let Some(marker) = &args.container_marker {
        options.markers.container = Some(marker.clone());
    }
    if args.no_container {
        options.markers.container = None;
    }
    if options.strategy == Strategy::Flat {
        warn!("Flat strategy: parent contexts are inferred by proximity and may be wrong");
    }

    options
}

/// Export the report based on command line arguments
fn export_report(report: &AnalysisReport, args: &Args) -> Result<()> {
    if let Some(json_path) = &args.json {
        output_formatter::export_report_json(report, json_path)?;
        info!("Wrote JSON report to {}", json_path.display());
    }

    if let Some(html_path) = &args.html {
        output_formatter::create_html_report(report, html_path)?;
        info!("Wrote HTML report to {}", html_path.display());
    }

    if let Some(csv_path) = &args.csv {
        output_formatter::create_csv_report(report, csv_path)?;
        info!("Wrote CSV report to {}", csv_path.display());
    }

    Ok(())
}
