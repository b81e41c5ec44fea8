//! trawl - discover input files and hand each one to a handler.
//!
//! Usage:
//!   trawl [DIR]                                     List files in DIR
//!   trawl -r -e eml,msg [DIR]                       Recurse, filter by extension
//!   trawl --structured --input-structure day \
//!         --start 2024-01-01 --end 2024-01-31 [DIR] Walk date partitions
//!   trawl --config trawl.toml                       Read settings from TOML
//!   trawl --help                                    Show help

use std::path::PathBuf;

use clap::{ArgAction, Parser};
use color_eyre::eyre::{Context, Result};
use tracing_subscriber::EnvFilter;

use trawl_scan::{
    CancellationToken, Dispatcher, Feature, FilenameOption, HandlerError, InputConfig, InputFile,
    InputStructure, TracingLogger, WindowBounds, parse_end_instant, parse_instant,
};

#[derive(Parser)]
#[command(
    name = "trawl",
    version,
    about = "Discover input files by glob or date partition",
    long_about = "trawl walks an input directory and prints every file that matches.\n\n\
                  Without --structured files are matched by extension. With \
                  --structured the directory is read as YYYY/MM/DD partitions \
                  and only files inside the --start/--end window are listed."
)]
struct Cli {
    /// Input directory (overrides the config file)
    input_dir: Option<PathBuf>,

    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Descend into subdirectories (unstructured only)
    #[arg(short, long)]
    recursive: bool,

    /// Comma-separated extensions to include, e.g. "eml,msg"
    #[arg(short, long, value_delimiter = ',')]
    extensions: Vec<String>,

    /// Stop after this many files
    #[arg(short = 'n', long)]
    limit: Option<usize>,

    /// Files handled at once [default: 1]
    #[arg(short = 'j', long)]
    concurrency: Option<usize>,

    /// IANA timezone the window and partitions are read in
    #[arg(long)]
    timezone: Option<String>,

    /// Directory layout: none, year, month or day
    #[arg(long)]
    input_structure: Option<InputStructure>,

    /// Comma-separated filename components: date, time, subject
    #[arg(long, value_delimiter = ',')]
    filename_options: Vec<FilenameOption>,

    /// Treat the input directory as date-partitioned
    #[arg(short, long)]
    structured: bool,

    /// Window start, RFC 3339 or YYYY-MM-DD
    #[arg(long)]
    start: Option<String>,

    /// Window end, RFC 3339 or YYYY-MM-DD (a bare date covers the whole day)
    #[arg(long)]
    end: Option<String>,

    /// Print one JSON object per file
    #[arg(long)]
    json: bool,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = build_config(&cli)?;
    let bounds = build_bounds(&cli, &config)?;

    let mut features = vec![Feature::Input];
    if cli.structured {
        features.push(Feature::StructuredInput);
    }

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!(target: "trawl", "Interrupted, waiting for running handlers");
                cancel.cancel();
            }
        }
    });

    let json = cli.json;
    let handler = move |file: InputFile| async move {
        print_file(&file, json);
        Ok::<(), HandlerError>(())
    };

    Dispatcher::new()
        .process_with_cancel(
            &config,
            &features,
            &TracingLogger::new(),
            &handler,
            bounds,
            cancel,
        )
        .await
        .context("Input processing failed")?;

    Ok(())
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "trawl=info",
        1 => "trawl=debug",
        _ => "trawl=trace",
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .init();
}

/// Config file values, overridden by anything given on the command line.
fn build_config(cli: &Cli) -> Result<InputConfig> {
    let mut config = match &cli.config {
        Some(path) => InputConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => InputConfig::default(),
    };

    if let Some(dir) = &cli.input_dir {
        config.input_directory = Some(dir.clone());
    }
    if config.input_directory.is_none() {
        config.input_directory = Some(PathBuf::from("."));
    }
    if cli.recursive {
        config.recursive = true;
    }
    if !cli.extensions.is_empty() {
        config.extensions = cli.extensions.clone();
    }
    if cli.limit.is_some() {
        config.limit = cli.limit;
    }
    if cli.concurrency.is_some() {
        config.concurrency = cli.concurrency;
    }
    if let Some(timezone) = &cli.timezone {
        config.timezone = timezone.clone();
    }
    if let Some(structure) = cli.input_structure {
        config.input_structure = structure;
    }
    if !cli.filename_options.is_empty() {
        config.input_filename_options = cli.filename_options.clone();
    }

    Ok(config)
}

fn build_bounds(cli: &Cli, config: &InputConfig) -> Result<WindowBounds> {
    if cli.start.is_none() && cli.end.is_none() {
        return Ok(WindowBounds::default());
    }

    let tz = config.timezone().context("Invalid timezone")?;
    let start = cli
        .start
        .as_deref()
        .map(|s| parse_instant(s, tz))
        .transpose()
        .context("Invalid --start")?;
    let end = cli
        .end
        .as_deref()
        .map(|s| parse_end_instant(s, tz))
        .transpose()
        .context("Invalid --end")?;

    Ok(WindowBounds { start, end })
}

fn print_file(file: &InputFile, json: bool) {
    let date = file.date.map(|d| d.to_rfc3339());
    if json {
        println!(
            "{}",
            serde_json::json!({
                "path": file.path,
                "date": date,
            })
        );
    } else {
        match date {
            Some(date) => println!("{date}\t{}", file.path),
            None => println!("{}", file.path),
        }
    }
}
