//! JSON report of similarity groups.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "images": [
//!     {
//!       "group": 1,
//!       "files": ["/photos/a.jpg", "/photos/b.jpg"],
//!       "similarity": 98.44,
//!       "members": [
//!         {"file": "/photos/a.jpg", "similarity": 100.0},
//!         {"file": "/photos/b.jpg", "similarity": 98.44}
//!       ]
//!     }
//!   ],
//!   "videos": [],
//!   "summary": {
//!     "total_records": 3,
//!     "duplicate_groups": 1,
//!     "...": "..."
//!   },
//!   "generated_at": "2024-05-01T12:00:00Z"
//! }
//! ```
//!
//! A kind that was disabled for the run has no key at all. Similarities are
//! percentages rounded to two decimals. Singleton groups are never written.

use std::io::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::duplicates::{GroupingSummary, SimilarityGroup};
use crate::error::ExitCode;
use crate::scanner::{ExtractStats, MediaKind};

/// One member of a reported group.
#[derive(Debug, Clone, Serialize)]
pub struct JsonMember {
    /// File path
    pub file: String,
    /// Similarity of the edge that brought the file in, in percent
    pub similarity: f64,
}

/// A single similarity group in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonGroup {
    /// 1-based group number within its kind
    pub group: usize,
    /// Paths of all files in the group, founder first
    pub files: Vec<String>,
    /// Weakest link in the group, in percent
    pub similarity: f64,
    /// Per-member detail
    pub members: Vec<JsonMember>,
}

impl JsonGroup {
    fn from_group(index: usize, group: &SimilarityGroup) -> Self {
        Self {
            group: index,
            files: group
                .members
                .iter()
                .map(|m| m.path.to_string_lossy().into_owned())
                .collect(),
            similarity: percent(group.similarity),
            members: group
                .members
                .iter()
                .map(|m| JsonMember {
                    file: m.path.to_string_lossy().into_owned(),
                    similarity: percent(m.similarity),
                })
                .collect(),
        }
    }
}

/// Run statistics in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    /// Records that reached grouping
    pub total_records: usize,
    /// Buckets built
    pub buckets: usize,
    /// Candidate pairs compared
    pub candidate_pairs: usize,
    /// Share of all pairs skipped by bucketing (%)
    pub pruning_rate: f64,
    /// Pairs at or above the threshold
    pub accepted_pairs: usize,
    /// Groups with 2+ members
    pub duplicate_groups: usize,
    /// Files in groups with 2+ members
    pub duplicate_files: usize,
    /// Files whose fingerprint could not be obtained
    pub failed_files: usize,
    /// Failure messages, one per failed file
    pub errors: Vec<String>,
    /// Entries dropped because their kind was disabled
    pub disabled_files: usize,
    /// Grouping time in milliseconds
    pub grouping_duration_ms: u64,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name (e.g., "SD000")
    pub exit_code_name: String,
}

impl JsonSummary {
    /// Build from grouping statistics and an exit code.
    #[must_use]
    pub fn new(summary: &GroupingSummary, exit_code: ExitCode) -> Self {
        Self {
            total_records: summary.total_records,
            buckets: summary.buckets,
            candidate_pairs: summary.candidate_pairs,
            pruning_rate: (summary.pruning_rate() * 100.0).round() / 100.0,
            accepted_pairs: summary.accepted_pairs,
            duplicate_groups: summary.duplicate_groups,
            duplicate_files: summary.duplicate_files,
            failed_files: 0,
            errors: Vec::new(),
            disabled_files: 0,
            grouping_duration_ms: summary.duration.as_millis() as u64,
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix().to_string(),
        }
    }
}

/// Complete JSON report.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    /// Image groups (absent when images were disabled)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<JsonGroup>>,
    /// Video groups (absent when videos were disabled)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub videos: Option<Vec<JsonGroup>>,
    /// Run statistics
    pub summary: JsonSummary,
    /// When the report was produced
    pub generated_at: DateTime<Utc>,
}

impl JsonOutput {
    /// Create a report with both kinds present.
    ///
    /// # Example
    ///
    /// ```
    /// use simdupe::duplicates::GroupingSummary;
    /// use simdupe::error::ExitCode;
    /// use simdupe::output::json::JsonOutput;
    ///
    /// let output = JsonOutput::new(&[], &GroupingSummary::default(), ExitCode::NoDuplicates);
    /// assert_eq!(output.images.as_ref().map(Vec::len), Some(0));
    /// assert_eq!(output.summary.exit_code, 2);
    /// ```
    #[must_use]
    pub fn new(groups: &[SimilarityGroup], summary: &GroupingSummary, exit_code: ExitCode) -> Self {
        Self {
            images: Some(groups_of_kind(groups, MediaKind::Image)),
            videos: Some(groups_of_kind(groups, MediaKind::Video)),
            summary: JsonSummary::new(summary, exit_code),
            generated_at: Utc::now(),
        }
    }

    /// Drop the keys of disabled kinds.
    #[must_use]
    pub fn with_kinds(mut self, images: bool, videos: bool) -> Self {
        if !images {
            self.images = None;
        }
        if !videos {
            self.videos = None;
        }
        self
    }

    /// Record extraction results in the summary.
    #[must_use]
    pub fn with_extract_stats(mut self, stats: &ExtractStats) -> Self {
        self.summary.failed_files = stats.failed;
        self.summary.disabled_files = stats.disabled;
        self.summary.errors = stats.errors.iter().map(ToString::to_string).collect();
        self
    }

    /// Serialize to compact JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty-printed JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write JSON to a writer, followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W, pretty: bool) -> Result<(), JsonOutputError> {
        let json = if pretty {
            self.to_json_pretty()?
        } else {
            self.to_json()?
        };
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

fn groups_of_kind(groups: &[SimilarityGroup], kind: MediaKind) -> Vec<JsonGroup> {
    groups
        .iter()
        .filter(|g| g.kind == kind && g.is_duplicate())
        .enumerate()
        .map(|(idx, group)| JsonGroup::from_group(idx + 1, group))
        .collect()
}

/// Similarity as a percentage rounded to two decimals.
fn percent(similarity: f64) -> f64 {
    (similarity * 10_000.0).round() / 100.0
}

/// Errors that can occur during JSON output.
#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error during writing
    #[error("I/O error during JSON generation: {0}")]
    Io(#[from] std::io::Error),
}
