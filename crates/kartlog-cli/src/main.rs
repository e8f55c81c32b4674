//! kartlog: extract lap times from karting result emails.

use std::sync::Arc;

use anyhow::Context;
use kartlog_cli::args::{print_help, Command, ParseArgs};
use kartlog_cli::{ParseReport, NO_LAP_DATA_MESSAGE};
use kartlog_core::{Error, KartlogConfig};
use kartlog_ingest::{read_upload, ExtractionPipeline, TrackCatalog};
use kartlog_session::{DuplicateSessionChecker, InMemorySessionIndex, SessionIndex};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Exit status when no laps were found and manual entry is needed.
const EXIT_NO_LAP_DATA: i32 = 2;

fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries the JSON output.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match Command::from_args(&args) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    match command {
        Command::Help => {
            print_help();
            Ok(())
        }
        Command::Tracks => {
            let catalog = load_catalog()?;
            println!("{}", serde_json::to_string_pretty(catalog.tracks())?);
            Ok(())
        }
        Command::Parse(parse_args) => {
            let code = run_parse(&parse_args)?;
            if code != 0 {
                std::process::exit(code);
            }
            Ok(())
        }
    }
}

fn load_config() -> anyhow::Result<KartlogConfig> {
    KartlogConfig::from_env().map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))
}

fn load_catalog() -> anyhow::Result<TrackCatalog> {
    let config = load_config()?;
    TrackCatalog::from_config(&config)
        .map_err(|e| anyhow::anyhow!("Failed to load track catalog: {}", e))
}

fn run_parse(args: &ParseArgs) -> anyhow::Result<i32> {
    let config = load_config()?;
    let catalog = Arc::new(
        TrackCatalog::from_config(&config)
            .map_err(|e| anyhow::anyhow!("Failed to load track catalog: {}", e))?,
    );
    info!("Track catalog: {} tracks", catalog.len());

    let raw = read_upload(&args.file)
        .with_context(|| format!("Cannot read {}", args.file.display()))?;
    let filename = args.file.file_name().and_then(|n| n.to_str());

    let pipeline = ExtractionPipeline::new(catalog.clone());
    let result = match args.track.as_deref() {
        Some(track) => pipeline.extract_for_track(&raw, filename, track),
        None => pipeline.extract(&raw, filename),
    };

    let index = args
        .existing
        .as_deref()
        .map(InMemorySessionIndex::load)
        .transpose()
        .context("Failed to load existing sessions")?;
    let checker = DuplicateSessionChecker::from_config(&config);
    let duplicates = index
        .as_ref()
        .map(|index| (&checker, index as &dyn SessionIndex));

    let report = match ParseReport::build(&result, filename, &catalog, duplicates) {
        Ok(report) => report,
        Err(Error::NoLapData) => {
            println!("{}", NO_LAP_DATA_MESSAGE);
            return Ok(EXIT_NO_LAP_DATA);
        }
        Err(e) => return Err(anyhow::anyhow!("Extracted laps are invalid: {}", e)),
    };

    for notice in &report.duplicates {
        warn!("{}", notice.message);
    }
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(0)
}
