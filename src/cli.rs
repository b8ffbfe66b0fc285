//! Command-line interface definitions for simdupe.
//!
//! # Example
//!
//! ```bash
//! # Group the files listed in a fingerprint manifest
//! simdupe group hashes.csv
//!
//! # Stricter threshold, CSV report on stdout
//! simdupe group hashes.csv -t 0.95 --format csv -o -
//!
//! # Only images, bucketing on the first 8 hex digits
//! simdupe group hashes.csv --no-videos --key-bits 32 --bands 1
//!
//! # How close are two fingerprints?
//! simdupe compare 8f373714acfcf4d0 8f373714acfcf4d1
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Group visually similar images and videos by perceptual fingerprint.
///
/// simdupe reads fingerprints produced by an external hasher, buckets them,
/// compares candidates by Hamming distance and reports groups of files that
/// meet a similarity threshold.
#[derive(Debug, Parser)]
#[command(name = "simdupe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Configuration file (defaults to the platform config directory)
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Report errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Group similar files listed in fingerprint manifests
    Group(GroupArgs),
    /// Compare two hex fingerprints
    Compare(CompareArgs),
    /// Show or initialize the configuration file
    Config(ConfigArgs),
}

/// Arguments for the group subcommand.
#[derive(Debug, Args)]
pub struct GroupArgs {
    /// Fingerprint manifests (CSV: path,kind,fingerprint,error)
    #[arg(value_name = "MANIFEST", required = true)]
    pub manifests: Vec<PathBuf>,

    /// Similarity threshold between 0 and 1 [config default: 0.9]
    #[arg(short, long, value_name = "THRESHOLD", value_parser = parse_threshold)]
    pub threshold: Option<f64>,

    /// Report file ('-' for stdout)
    #[arg(short, long, value_name = "FILE", default_value = "output.txt")]
    pub output: PathBuf,

    /// Report format
    #[arg(long, value_enum, default_value = "json")]
    pub format: OutputFormat,

    /// Skip images
    #[arg(long)]
    pub no_images: bool,

    /// Skip videos
    #[arg(long)]
    pub no_videos: bool,

    /// Bits per bucket key (1-64)
    #[arg(long, value_name = "N")]
    pub key_bits: Option<u32>,

    /// Number of bucket bands
    #[arg(long, value_name = "N")]
    pub bands: Option<u32>,

    /// Worker threads (0 = one per CPU)
    #[arg(long, value_name = "N")]
    pub threads: Option<usize>,
}

impl GroupArgs {
    /// Whether the report goes to stdout.
    #[must_use]
    pub fn writes_to_stdout(&self) -> bool {
        self.output.as_os_str() == "-"
    }
}

/// Arguments for the compare subcommand.
#[derive(Debug, Args)]
pub struct CompareArgs {
    /// First fingerprint (hex)
    #[arg(value_name = "HEX_A")]
    pub a: String,

    /// Second fingerprint (hex)
    #[arg(value_name = "HEX_B")]
    pub b: String,
}

/// Arguments for the config subcommand.
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Write the default configuration to the config path
    #[arg(long)]
    pub init: bool,
}

/// Report format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// JSON document keyed by media kind
    Json,
    /// One CSV row per group member
    Csv,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}

/// Parse a similarity threshold in `[0, 1]`.
///
/// # Examples
///
/// ```
/// use simdupe::cli::parse_threshold;
///
/// assert_eq!(parse_threshold("0.9").unwrap(), 0.9);
/// assert!(parse_threshold("1.5").is_err());
/// ```
///
/// # Errors
///
/// Returns an error for non-numbers and values outside `[0, 1]`.
pub fn parse_threshold(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .trim()
        .parse()
        .map_err(|_| format!("Invalid number: '{s}'"))?;
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("Threshold must be between 0 and 1, got {value}"))
    }
}
