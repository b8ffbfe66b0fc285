//! CSV report of similarity groups.
//!
//! One row per member of every duplicate group.
//!
//! # Columns
//!
//! - `kind`: `image` or `video`
//! - `group`: 1-based group number within its kind
//! - `file`: File path
//! - `similarity`: Similarity of the edge that brought the file in (0-1)
//! - `founder`: Whether the file is the group's founding member
//!
//! # Example
//!
//! ```
//! use simdupe::duplicates::{compute_groups, BucketRule};
//! use simdupe::output::csv::CsvOutput;
//! use simdupe::scanner::{FileRecord, Fingerprint, MediaKind};
//! use std::path::PathBuf;
//!
//! let records = vec![
//!     FileRecord::new(PathBuf::from("a.jpg"), MediaKind::Image, Fingerprint::from_u64(7)),
//!     FileRecord::new(PathBuf::from("b.jpg"), MediaKind::Image, Fingerprint::from_u64(7)),
//! ];
//! let groups = compute_groups(records, 0.9, BucketRule::default()).unwrap();
//!
//! let csv = CsvOutput::new(&groups).to_string().unwrap();
//! assert!(csv.starts_with("kind,group,file,similarity,founder"));
//! ```

use std::collections::HashMap;
use std::io;

use serde::Serialize;
use thiserror::Error;

use crate::duplicates::SimilarityGroup;
use crate::scanner::MediaKind;

/// Errors that can occur during CSV output generation.
#[derive(Debug, Error)]
pub enum CsvOutputError {
    /// I/O error during writing.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error during CSV serialization.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    kind: MediaKind,
    group: usize,
    file: std::borrow::Cow<'a, str>,
    similarity: f64,
    founder: bool,
}

/// CSV output formatter.
pub struct CsvOutput<'a> {
    groups: &'a [SimilarityGroup],
    images: bool,
    videos: bool,
}

impl<'a> CsvOutput<'a> {
    /// Create a formatter that writes both kinds.
    #[must_use]
    pub fn new(groups: &'a [SimilarityGroup]) -> Self {
        Self {
            groups,
            images: true,
            videos: true,
        }
    }

    /// Restrict the rows to enabled kinds.
    #[must_use]
    pub fn with_kinds(mut self, images: bool, videos: bool) -> Self {
        self.images = images;
        self.videos = videos;
        self
    }

    fn includes(&self, kind: MediaKind) -> bool {
        match kind {
            MediaKind::Image => self.images,
            MediaKind::Video => self.videos,
        }
    }

    /// Write the CSV output to the given writer.
    ///
    /// # Errors
    ///
    /// Returns `CsvOutputError` if writing or serialization fails.
    pub fn write_to<W: io::Write>(&self, writer: W) -> Result<(), CsvOutputError> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        let mut numbers: HashMap<MediaKind, usize> = HashMap::new();
        let mut wrote_row = false;

        for group in self
            .groups
            .iter()
            .filter(|g| g.is_duplicate() && self.includes(g.kind))
        {
            let number = numbers.entry(group.kind).or_insert(0);
            *number += 1;

            for (idx, member) in group.members.iter().enumerate() {
                csv_writer.serialize(CsvRow {
                    kind: group.kind,
                    group: *number,
                    file: member.path.to_string_lossy(),
                    similarity: member.similarity,
                    founder: idx == 0,
                })?;
                wrote_row = true;
            }
        }

        // serialize() only emits headers with the first row
        if !wrote_row {
            csv_writer.write_record(["kind", "group", "file", "similarity", "founder"])?;
        }

        csv_writer.flush()?;
        Ok(())
    }

    /// Generate CSV output as a string.
    ///
    /// # Errors
    ///
    /// Returns `CsvOutputError` if serialization fails.
    pub fn to_string(&self) -> Result<String, CsvOutputError> {
        let mut buffer = Vec::new();
        self.write_to(&mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).to_string())
    }
}
