//! Command-line argument handling.

use std::path::PathBuf;

use anyhow::{anyhow, bail};

/// Top-level commands of the `kartlog` binary.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Parse(ParseArgs),
    Tracks,
    Help,
}

/// Arguments of `kartlog parse`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseArgs {
    pub file: PathBuf,
    /// Track chosen by the user; skips identification.
    pub track: Option<String>,
    /// JSON list of sessions already imported, for duplicate warnings.
    pub existing: Option<PathBuf>,
}

impl Command {
    /// Parse arguments, excluding the program name.
    pub fn from_args(args: &[String]) -> anyhow::Result<Self> {
        match args.first().map(String::as_str) {
            None | Some("help") | Some("--help") | Some("-h") => Ok(Self::Help),
            Some("tracks") => Ok(Self::Tracks),
            Some("parse") => ParseArgs::from_args(&args[1..]).map(Self::Parse),
            Some(other) => bail!("Unknown command: {}. Use 'kartlog help' for usage.", other),
        }
    }
}

impl ParseArgs {
    fn from_args(args: &[String]) -> anyhow::Result<Self> {
        let mut file = None;
        let mut track = None;
        let mut existing = None;

        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--track" => {
                    let value = iter.next().ok_or_else(|| anyhow!("--track needs a value"))?;
                    track = Some(value.clone());
                }
                "--existing" => {
                    let value = iter
                        .next()
                        .ok_or_else(|| anyhow!("--existing needs a path"))?;
                    existing = Some(PathBuf::from(value));
                }
                flag if flag.starts_with("--") => bail!("Unknown option: {}", flag),
                path if file.is_none() => file = Some(PathBuf::from(path)),
                extra => bail!("Unexpected argument: {}", extra),
            }
        }

        let file = file.ok_or_else(|| {
            anyhow!("Usage: kartlog parse <file> [--track <name>] [--existing <sessions.json>]")
        })?;
        Ok(Self {
            file,
            track,
            existing,
        })
    }
}

pub fn print_help() {
    println!("kartlog: lap times from karting result emails");
    println!();
    println!("Usage: kartlog <command>");
    println!();
    println!("Commands:");
    println!("  parse <file> [--track <name>] [--existing <sessions.json>]");
    println!("                           Extract laps and print a JSON report");
    println!("  tracks                   Print the track catalog as JSON");
    println!("  help                     Show this help message");
    println!();
    println!("Environment:");
    println!("  KARTLOG_TRACKS                     JSON track catalog replacing the built-in one");
    println!("  KARTLOG_DEFAULT_COUNTRY            Country for tracks without one");
    println!("  KARTLOG_DUPLICATE_WINDOW_MINUTES   Window for duplicate session warnings");
    println!("  RUST_LOG                           Log filter (logs go to stderr)");
}
