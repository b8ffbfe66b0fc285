//! simdupe - similar image and video grouping
//!
//! Groups media files whose perceptual fingerprints are within a Hamming
//! similarity threshold. Fingerprints come from an external hasher (see
//! [`scanner::FingerprintExtractor`] and [`scanner::Manifest`]); the core in
//! [`duplicates`] buckets them, compares candidate pairs and merges matches
//! into groups with a union-find.

pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod signal;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};

use crate::cli::{Cli, Commands, CompareArgs, ConfigArgs, GroupArgs, OutputFormat};
use crate::config::Config;
use crate::duplicates::{
    hamming_distance, try_similarity, FinderConfig, GroupingSummary, SimilarityFinder,
    SimilarityGroup,
};
use crate::error::{ExitCode, InterruptedError};
use crate::output::{CsvOutput, JsonOutput};
use crate::progress::{Progress, ProgressCallback};
use crate::scanner::{extract_records, ExtractConfig, ExtractStats, Fingerprint, Manifest};

/// Run the command described by `cli`.
///
/// # Errors
///
/// Returns an error for invalid configuration, unreadable manifests, report
/// write failures, or an [`InterruptedError`] when Ctrl+C stopped extraction.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Group(ref args) => run_group(args, cli.config.as_deref(), cli.quiet),
        Commands::Compare(ref args) => run_compare(args),
        Commands::Config(ref args) => run_config(args, cli.config.as_deref()),
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => {
            if !path.exists() {
                bail!("Configuration file not found: {}", path.display());
            }
            Config::load_from_path(path)
                .with_context(|| format!("Failed to load {}", path.display()))
        }
        None => Ok(Config::load()?),
    }
}

/// Merge group flags over the loaded configuration.
fn apply_overrides(config: &mut Config, args: &GroupArgs) {
    if let Some(threshold) = args.threshold {
        config.threshold = threshold;
    }
    if args.no_images {
        config.images = false;
    }
    if args.no_videos {
        config.videos = false;
    }
    if let Some(key_bits) = args.key_bits {
        config.bucket.key_bits = key_bits;
    }
    if let Some(bands) = args.bands {
        config.bucket.bands = bands;
    }
    if let Some(threads) = args.threads {
        config.threads = threads;
    }
}

fn run_group(args: &GroupArgs, config_path: Option<&Path>, quiet: bool) -> Result<ExitCode> {
    let mut config = load_config(config_path)?;
    apply_overrides(&mut config, args);
    config.validate().context("Invalid configuration")?;
    let bucket_rule = config.bucket_rule()?;
    log::debug!("Effective configuration: {:?}", config);

    let handler = signal::install_handler()?;

    let mut manifest = Manifest::default();
    for path in &args.manifests {
        let loaded = Manifest::from_path(path)
            .with_context(|| format!("Failed to read manifest {}", path.display()))?;
        log::info!(
            "Loaded {} entries from {} ({} rows skipped)",
            loaded.len(),
            path.display(),
            loaded.skipped()
        );
        manifest.merge(loaded);
    }
    let (entries, extractor) = manifest.into_extractor();

    let progress: Arc<dyn ProgressCallback> = Arc::new(Progress::new(quiet));
    let mut extract_config = ExtractConfig::default()
        .with_images(config.images)
        .with_videos(config.videos)
        .with_shutdown_flag(handler.get_flag())
        .with_progress_callback(Arc::clone(&progress));
    if config.threads > 0 {
        extract_config = extract_config.with_threads(config.threads);
    }

    let (records, stats) = extract_records(entries, &extractor, &extract_config);
    if stats.interrupted {
        return Err(InterruptedError {
            extracted: stats.extracted,
            total: stats.input_entries - stats.disabled,
        }
        .into());
    }

    let finder = SimilarityFinder::new(
        FinderConfig::default()
            .with_threshold(config.threshold)
            .with_bucket_rule(bucket_rule)
            .with_threads(config.threads)
            .with_progress_callback(progress),
    );
    let (groups, summary) = finder.find(records).context("Grouping failed")?;

    let exit_code = ExitCode::for_outcome(summary.duplicate_groups, stats.failed);
    write_report(args, &config, &groups, &summary, &stats, exit_code)?;

    if stats.failed > 0 {
        log::warn!("{} files could not be fingerprinted", stats.failed);
    }
    Ok(exit_code)
}

fn write_report(
    args: &GroupArgs,
    config: &Config,
    groups: &[SimilarityGroup],
    summary: &GroupingSummary,
    stats: &ExtractStats,
    exit_code: ExitCode,
) -> Result<()> {
    let mut writer: Box<dyn Write> = if args.writes_to_stdout() {
        Box::new(io::stdout().lock())
    } else {
        let file = File::create(&args.output)
            .with_context(|| format!("Failed to create {}", args.output.display()))?;
        Box::new(BufWriter::new(file))
    };

    match args.format {
        OutputFormat::Json => JsonOutput::new(groups, summary, exit_code)
            .with_kinds(config.images, config.videos)
            .with_extract_stats(stats)
            .write_to(&mut writer, true)?,
        OutputFormat::Csv => CsvOutput::new(groups)
            .with_kinds(config.images, config.videos)
            .write_to(&mut writer)?,
    }
    writer.flush()?;

    if !args.writes_to_stdout() {
        log::info!("Results saved to {}", args.output.display());
    }
    Ok(())
}

fn run_compare(args: &CompareArgs) -> Result<ExitCode> {
    let a: Fingerprint = args
        .a
        .parse()
        .with_context(|| format!("Invalid fingerprint '{}'", args.a))?;
    let b: Fingerprint = args
        .b
        .parse()
        .with_context(|| format!("Invalid fingerprint '{}'", args.b))?;

    let Some(score) = try_similarity(&a, &b) else {
        bail!(
            "Fingerprints differ in width ({} vs {} bits)",
            a.width(),
            b.width()
        );
    };

    println!("Hamming distance: {}/{}", hamming_distance(&a, &b), a.width());
    println!("Similarity: {:.6} ({:.2}%)", score, score * 100.0);
    Ok(ExitCode::Success)
}

fn run_config(args: &ConfigArgs, config_path: Option<&Path>) -> Result<ExitCode> {
    if args.init {
        let path = match config_path {
            Some(path) => path.to_path_buf(),
            None => Config::require_default_path()?,
        };
        if path.exists() {
            bail!("Configuration file already exists: {}", path.display());
        }
        Config::default().save(&path)?;
        println!("Wrote default configuration to {}", path.display());
    } else {
        let config = load_config(config_path)?;
        config.validate()?;
        print!("{}", config.to_toml()?);
    }
    Ok(ExitCode::Success)
}
