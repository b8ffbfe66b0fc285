//! Fingerprint extraction boundary.
//!
//! Decoding images or pulling a frame out of a video is not this crate's job.
//! Whatever does it plugs in through [`FingerprintExtractor`]; this module
//! only drives it over a list of entries in parallel, drops failures, and
//! keeps count.
//!
//! # Example
//!
//! ```
//! use simdupe::scanner::{
//!     extract_records, ExtractConfig, ExtractionError, Fingerprint, FingerprintExtractor,
//!     MediaEntry, MediaKind,
//! };
//! use std::path::PathBuf;
//!
//! struct Constant;
//!
//! impl FingerprintExtractor for Constant {
//!     fn extract(&self, _entry: &MediaEntry) -> Result<Fingerprint, ExtractionError> {
//!         Ok(Fingerprint::from_u64(42))
//!     }
//! }
//!
//! let entries = vec![MediaEntry::new(PathBuf::from("a.png"), MediaKind::Image)];
//! let (records, stats) = extract_records(entries, &Constant, &ExtractConfig::default());
//! assert_eq!(records.len(), 1);
//! assert_eq!(stats.extracted, 1);
//! ```

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use rayon::prelude::*;

use super::{FileRecord, Fingerprint, MediaEntry, MediaKind};
use crate::progress::ProgressCallback;

/// Errors reported for a single file during extraction.
///
/// None of these abort a run; the file is simply left out of grouping.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    /// The hasher could not produce a fingerprint (unreadable, corrupt,
    /// unsupported codec...).
    #[error("Failed to fingerprint {path}: {reason}")]
    Failed {
        /// File that failed
        path: PathBuf,
        /// Reason given by the hasher
        reason: String,
    },

    /// A fingerprint was produced but could not be parsed.
    #[error("Invalid fingerprint for {path}: {source}")]
    InvalidFingerprint {
        /// File with the bad fingerprint
        path: PathBuf,
        /// Parse failure
        #[source]
        source: super::FingerprintError,
    },

    /// No fingerprint is known for this file.
    #[error("No fingerprint available for {0}")]
    Missing(PathBuf),
}

impl ExtractionError {
    /// Path of the file this error concerns.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::Failed { path, .. } | Self::InvalidFingerprint { path, .. } => path,
            Self::Missing(path) => path,
        }
    }
}

/// Capability that turns a media file into a fingerprint.
///
/// Implementations must be callable from several threads at once.
pub trait FingerprintExtractor: Send + Sync {
    /// Compute the fingerprint for one entry.
    ///
    /// # Errors
    ///
    /// Returns an [`ExtractionError`] when no fingerprint can be produced.
    fn extract(&self, entry: &MediaEntry) -> Result<Fingerprint, ExtractionError>;
}

/// Configuration for the extraction phase.
#[derive(Clone)]
pub struct ExtractConfig {
    /// Number of worker threads. Defaults to the number of CPUs.
    pub threads: usize,
    /// Whether images are fingerprinted.
    pub images: bool,
    /// Whether videos are fingerprinted.
    pub videos: bool,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for ExtractConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractConfig")
            .field("threads", &self.threads)
            .field("images", &self.images)
            .field("videos", &self.videos)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            threads: std::thread::available_parallelism().map_or(4, |n| n.get()),
            images: true,
            videos: true,
            shutdown_flag: None,
            progress_callback: None,
        }
    }
}

impl ExtractConfig {
    /// Set the worker thread count (at least 1).
    #[must_use]
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }

    /// Enable or disable image fingerprinting.
    #[must_use]
    pub fn with_images(mut self, enabled: bool) -> Self {
        self.images = enabled;
        self
    }

    /// Enable or disable video fingerprinting.
    #[must_use]
    pub fn with_videos(mut self, enabled: bool) -> Self {
        self.videos = enabled;
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Whether a kind is enabled for this run.
    #[must_use]
    pub fn is_enabled(&self, kind: MediaKind) -> bool {
        match kind {
            MediaKind::Image => self.images,
            MediaKind::Video => self.videos,
        }
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// Statistics from the extraction phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractStats {
    /// Entries handed in
    pub input_entries: usize,
    /// Entries dropped because their kind is disabled
    pub disabled: usize,
    /// Fingerprints produced
    pub extracted: usize,
    /// Entries whose extraction failed
    pub failed: usize,
    /// Entries never attempted because shutdown was requested
    pub skipped: usize,
    /// Individual failures, in input order
    pub errors: Vec<ExtractionError>,
    /// Whether shutdown was requested during the phase
    pub interrupted: bool,
}

/// Fingerprint every enabled entry in parallel.
///
/// Entries whose kind is disabled never reach the extractor. Failed entries
/// are logged and collected in [`ExtractStats::errors`]; they are absent from
/// the returned records. Records come back in input order.
///
/// # Arguments
///
/// * `entries` - Media files to fingerprint
/// * `extractor` - The fingerprinting capability
/// * `config` - Threading, kind filters, cancellation and progress
pub fn extract_records(
    entries: Vec<MediaEntry>,
    extractor: &dyn FingerprintExtractor,
    config: &ExtractConfig,
) -> (Vec<FileRecord>, ExtractStats) {
    let mut stats = ExtractStats {
        input_entries: entries.len(),
        ..Default::default()
    };

    let enabled: Vec<MediaEntry> = entries
        .into_iter()
        .filter(|entry| {
            let keep = config.is_enabled(entry.kind);
            if !keep {
                log::trace!("Skipping disabled {}: {}", entry.kind, entry.path.display());
            }
            keep
        })
        .collect();
    stats.disabled = stats.input_entries - enabled.len();

    if enabled.is_empty() {
        log::debug!("Extraction: nothing to fingerprint");
        return (Vec::new(), stats);
    }

    if let Some(ref callback) = config.progress_callback {
        callback.on_phase_start("extract", enabled.len());
    }
    log::info!("Extracting fingerprints for {} files", enabled.len());

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.threads)
        .build();
    let done = AtomicUsize::new(0);

    let run = || -> Vec<Option<Result<FileRecord, ExtractionError>>> {
        enabled
            .into_par_iter()
            .map(|entry| {
                if config.is_shutdown_requested() {
                    return None;
                }

                let result = extractor
                    .extract(&entry)
                    .map(|fp| FileRecord::new(entry.path.clone(), entry.kind, fp));

                let current = done.fetch_add(1, Ordering::Relaxed) + 1;
                if let Some(ref callback) = config.progress_callback {
                    callback.on_progress(current, entry.path.to_string_lossy().as_ref());
                }
                Some(result)
            })
            .collect()
    };

    let results = match pool {
        Ok(pool) => pool.install(run),
        Err(e) => {
            log::warn!(
                "Failed to create extraction thread pool ({}), using global pool with {} threads",
                e,
                rayon::current_num_threads()
            );
            run()
        }
    };

    let mut records = Vec::with_capacity(results.len());
    for result in results {
        match result {
            Some(Ok(record)) => {
                stats.extracted += 1;
                records.push(record);
            }
            Some(Err(e)) => {
                log::warn!("{}", e);
                stats.failed += 1;
                stats.errors.push(e);
            }
            None => stats.skipped += 1,
        }
    }

    if config.is_shutdown_requested() {
        stats.interrupted = true;
        log::info!("Extraction interrupted by shutdown signal");
    }

    if let Some(ref callback) = config.progress_callback {
        callback.on_phase_end("extract");
    }

    log::info!(
        "Extraction complete: {} fingerprinted, {} failed, {} skipped",
        stats.extracted,
        stats.failed,
        stats.skipped
    );

    (records, stats)
}
