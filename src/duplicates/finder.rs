//! Similarity finder: the entry point of the grouping core.
//!
//! # Overview
//!
//! [`SimilarityFinder::find`] runs the whole pipeline over a set of
//! fingerprinted records:
//! 1. **Validate** - threshold range and duplicate identifiers, before any work
//! 2. **Bucket** - derive candidate pairs (see [`crate::duplicates::bucket`])
//! 3. **Compare** - score candidates in parallel, keep those `>= threshold`
//! 4. **Group** - merge accepted pairs (see [`crate::duplicates::groups`])
//!
//! The call is atomic: it returns a complete partition or an error.
//!
//! # Example
//!
//! ```
//! use simdupe::duplicates::{compute_groups, BucketRule};
//! use simdupe::scanner::{FileRecord, Fingerprint, MediaKind};
//! use std::path::PathBuf;
//!
//! let records = vec![
//!     FileRecord::new(PathBuf::from("a.jpg"), MediaKind::Image, Fingerprint::from_u64(0)),
//!     FileRecord::new(PathBuf::from("b.jpg"), MediaKind::Image, Fingerprint::from_u64(1)),
//!     FileRecord::new(PathBuf::from("c.jpg"), MediaKind::Image, Fingerprint::from_u64(u64::MAX)),
//! ];
//!
//! let groups = compute_groups(records, 0.9, BucketRule::default()).unwrap();
//! assert_eq!(groups.len(), 2); // {a, b} and the singleton {c}
//! assert_eq!(groups[0].len(), 2);
//! ```

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::prelude::*;

use super::bucket::{BucketRule, Bucketer, CandidatePair};
use super::distance::similarity;
use super::groups::{GroupingEngine, SimilarityGroup};
use crate::progress::ProgressCallback;
use crate::scanner::{FileRecord, MediaKind};

/// Default similarity threshold.
pub const DEFAULT_THRESHOLD: f64 = 0.9;

/// Errors that can occur during grouping.
///
/// All of them are raised before any comparison happens.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum FinderError {
    /// Threshold is NaN or outside `[0, 1]`.
    #[error("Similarity threshold must be between 0 and 1, got {0}")]
    InvalidThreshold(f64),

    /// The same file was supplied twice for the same kind.
    #[error("Duplicate {kind} record: {path}")]
    DuplicateRecord {
        /// Repeated identifier
        path: PathBuf,
        /// Media kind of both records
        kind: MediaKind,
    },
}

/// Check that a threshold lies within `[0, 1]`.
///
/// # Errors
///
/// Returns [`FinderError::InvalidThreshold`] otherwise (NaN included).
pub fn validate_threshold(threshold: f64) -> Result<f64, FinderError> {
    if (0.0..=1.0).contains(&threshold) {
        Ok(threshold)
    } else {
        Err(FinderError::InvalidThreshold(threshold))
    }
}

/// Configuration for the similarity finder.
#[derive(Clone)]
pub struct FinderConfig {
    /// Minimum similarity for two files to be merged.
    pub threshold: f64,
    /// How bucket keys are derived.
    pub bucket_rule: BucketRule,
    /// Worker threads for comparison (0 = rayon's global pool).
    pub threads: usize,
    /// Optional progress callback.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderConfig")
            .field("threshold", &self.threshold)
            .field("bucket_rule", &self.bucket_rule)
            .field("threads", &self.threads)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            bucket_rule: BucketRule::default(),
            threads: 0,
            progress_callback: None,
        }
    }
}

impl FinderConfig {
    /// Set the similarity threshold (validated when the finder runs).
    #[must_use]
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Set the bucket rule.
    #[must_use]
    pub fn with_bucket_rule(mut self, rule: BucketRule) -> Self {
        self.bucket_rule = rule;
        self
    }

    /// Set the number of comparison threads (0 = global pool).
    #[must_use]
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }
}

/// Summary statistics from one grouping run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupingSummary {
    /// Records handed to the finder
    pub total_records: usize,
    /// Buckets built across all bands
    pub buckets: usize,
    /// Size of the largest bucket
    pub largest_bucket: usize,
    /// Distinct candidate pairs compared
    pub candidate_pairs: usize,
    /// Pairs at or above the threshold
    pub accepted_pairs: usize,
    /// Accepted pairs that joined two different groups
    pub merges: usize,
    /// Groups in the partition, singletons included
    pub groups: usize,
    /// Groups with 2+ members
    pub duplicate_groups: usize,
    /// Files that ended up in a group with 2+ members
    pub duplicate_files: usize,
    /// Wall time of the run
    pub duration: Duration,
}

impl GroupingSummary {
    /// Share of the full all-pairs comparison that bucketing avoided, in percent.
    #[must_use]
    pub fn pruning_rate(&self) -> f64 {
        let n = self.total_records as f64;
        let all_pairs = n * (n - 1.0) / 2.0;
        if all_pairs <= 0.0 {
            0.0
        } else {
            (1.0 - self.candidate_pairs as f64 / all_pairs) * 100.0
        }
    }
}

/// Finder that groups fingerprinted records by similarity.
pub struct SimilarityFinder {
    config: FinderConfig,
}

impl SimilarityFinder {
    /// Create a finder with the given configuration.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        Self { config }
    }

    /// Create a finder with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(FinderConfig::default())
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &FinderConfig {
        &self.config
    }

    /// Partition `records` into similarity groups.
    ///
    /// Records may arrive in any order; they are sorted by `(kind, path)` so
    /// results are reproducible. Groups are ordered by founding member and
    /// every record appears in exactly one group (singletons included).
    ///
    /// # Errors
    ///
    /// Returns [`FinderError`] for an out-of-range threshold or a repeated
    /// `(kind, path)`. Nothing is computed in that case.
    pub fn find(
        &self,
        mut records: Vec<FileRecord>,
    ) -> Result<(Vec<SimilarityGroup>, GroupingSummary), FinderError> {
        let start = Instant::now();
        let threshold = validate_threshold(self.config.threshold)?;

        records.sort_by(|a, b| (a.kind, &a.path).cmp(&(b.kind, &b.path)));
        if let Some(pair) = records
            .windows(2)
            .find(|w| w[0].kind == w[1].kind && w[0].path == w[1].path)
        {
            return Err(FinderError::DuplicateRecord {
                path: pair[0].path.clone(),
                kind: pair[0].kind,
            });
        }

        let mut summary = GroupingSummary {
            total_records: records.len(),
            ..Default::default()
        };

        log::info!(
            "Grouping {} records (threshold {:.3}, {})",
            records.len(),
            threshold,
            self.config.bucket_rule
        );

        let bucketer = Bucketer::build(&records, &self.config.bucket_rule);
        let candidates = bucketer.candidate_pairs();
        summary.buckets = bucketer.len();
        summary.largest_bucket = bucketer.largest_bucket();
        summary.candidate_pairs = candidates.len();
        drop(bucketer);

        let accepted = self.compare(&records, &candidates, threshold);
        summary.accepted_pairs = accepted.len();

        let mut engine = GroupingEngine::new(records.len());
        for (pair, score) in &accepted {
            engine.merge(pair.a, pair.b, *score);
        }
        summary.merges = engine.merges();

        let groups: Vec<SimilarityGroup> = engine
            .partition()
            .iter()
            .map(|group| SimilarityGroup::from_indices(group, &records))
            .collect();

        summary.groups = groups.len();
        for group in groups.iter().filter(|g| g.is_duplicate()) {
            summary.duplicate_groups += 1;
            summary.duplicate_files += group.len();
            log::debug!(
                "Similarity group: {} files, founder {}, weakest link {:.4}",
                group.len(),
                group.members[0].path.display(),
                group.similarity
            );
        }
        summary.duration = start.elapsed();

        log::info!(
            "Grouping complete: {} candidates ({:.1}% pruned) → {} accepted → {} duplicate groups",
            summary.candidate_pairs,
            summary.pruning_rate(),
            summary.accepted_pairs,
            summary.duplicate_groups
        );

        Ok((groups, summary))
    }

    /// Score candidates in parallel, keeping candidate order.
    fn compare(
        &self,
        records: &[FileRecord],
        candidates: &[CandidatePair],
        threshold: f64,
    ) -> Vec<(CandidatePair, f64)> {
        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_start("compare", candidates.len());
        }

        let done = AtomicUsize::new(0);
        let run = || -> Vec<(CandidatePair, f64)> {
            candidates
                .par_iter()
                .filter_map(|pair| {
                    let score = similarity(
                        &records[pair.a].fingerprint,
                        &records[pair.b].fingerprint,
                    );
                    if let Some(ref callback) = self.config.progress_callback {
                        let current = done.fetch_add(1, Ordering::Relaxed) + 1;
                        callback.on_progress(current, "");
                    }
                    if score >= threshold {
                        log::trace!(
                            "Accepted {} ~ {} ({:.4})",
                            records[pair.a].path.display(),
                            records[pair.b].path.display(),
                            score
                        );
                        Some((*pair, score))
                    } else {
                        None
                    }
                })
                .collect()
        };

        let accepted = if self.config.threads == 0 {
            run()
        } else {
            match rayon::ThreadPoolBuilder::new()
                .num_threads(self.config.threads)
                .build()
            {
                Ok(pool) => pool.install(run),
                Err(e) => {
                    log::warn!("Failed to create comparison thread pool ({}), using global pool", e);
                    run()
                }
            }
        };

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_end("compare");
        }

        accepted
    }
}

/// Partition `records` into similarity groups.
///
/// Convenience wrapper around [`SimilarityFinder`] with the default thread
/// pool and no progress reporting.
///
/// # Errors
///
/// Returns [`FinderError`] for an invalid threshold or repeated records.
pub fn compute_groups(
    records: Vec<FileRecord>,
    threshold: f64,
    bucket_rule: BucketRule,
) -> Result<Vec<SimilarityGroup>, FinderError> {
    let config = FinderConfig::default()
        .with_threshold(threshold)
        .with_bucket_rule(bucket_rule);
    SimilarityFinder::new(config)
        .find(records)
        .map(|(groups, _)| groups)
}
