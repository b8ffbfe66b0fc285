//! Fingerprint manifests.
//!
//! A manifest is a CSV file written by an external hasher, one row per media
//! file:
//!
//! ```text
//! path,kind,fingerprint,error
//! /photos/a.jpg,image,8f373714acfcf4d0,
//! /photos/b.jpg,,8f373714acfcf4d1,
//! /videos/c.mp4,video,,could not decode frame
//! ```
//!
//! Only `path` is required. A blank `kind` is inferred from the extension,
//! a blank `fingerprint` (or a non-blank `error`) marks an extraction failure.
//! Rows whose kind cannot be determined are not media and are skipped.

use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::{ExtractionError, Fingerprint, FingerprintExtractor, MediaEntry, MediaKind};

/// Errors that can occur while loading a manifest.
#[derive(thiserror::Error, Debug)]
pub enum ManifestError {
    /// The manifest file could not be opened.
    #[error("Failed to open manifest {path}: {source}")]
    Open {
        /// Manifest path
        path: PathBuf,
        /// Underlying CSV/I/O error
        #[source]
        source: csv::Error,
    },

    /// A row could not be parsed.
    #[error("Malformed manifest row: {0}")]
    Row(#[from] csv::Error),
}

#[derive(Debug, Deserialize)]
struct ManifestRow {
    path: PathBuf,
    #[serde(default)]
    kind: Option<MediaKind>,
    #[serde(default)]
    fingerprint: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// What the external hasher reported for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Outcome {
    Hex(String),
    Failed(String),
}

/// Parsed manifest contents.
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    entries: Vec<MediaEntry>,
    outcomes: HashMap<(PathBuf, MediaKind), Outcome>,
    skipped: usize,
}

impl Manifest {
    /// Load a manifest from a CSV file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or a row is malformed.
    pub fn from_path(path: &Path) -> Result<Self, ManifestError> {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_path(path)
            .map_err(|source| ManifestError::Open {
                path: path.to_path_buf(),
                source,
            })?;
        let manifest = Self::from_csv(reader)?;
        log::debug!(
            "Loaded manifest {}: {} media entries, {} skipped rows",
            path.display(),
            manifest.len(),
            manifest.skipped
        );
        Ok(manifest)
    }

    /// Load a manifest from any reader.
    ///
    /// # Errors
    ///
    /// Returns an error if a row is malformed.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ManifestError> {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);
        Self::from_csv(reader)
    }

    fn from_csv<R: Read>(mut reader: csv::Reader<R>) -> Result<Self, ManifestError> {
        let mut manifest = Self::default();
        for row in reader.deserialize::<ManifestRow>() {
            manifest.push(row?);
        }
        Ok(manifest)
    }

    fn push(&mut self, row: ManifestRow) {
        let Some(kind) = row.kind.or_else(|| MediaKind::from_path(&row.path)) else {
            log::trace!("Skipping non-media manifest row: {}", row.path.display());
            self.skipped += 1;
            return;
        };

        let error = row.error.filter(|e| !e.is_empty());
        let fingerprint = row.fingerprint.filter(|f| !f.is_empty());
        let outcome = match (error, fingerprint) {
            (Some(reason), _) => Outcome::Failed(reason),
            (None, Some(hex)) => Outcome::Hex(hex),
            (None, None) => Outcome::Failed("no fingerprint recorded".to_string()),
        };

        let key = (row.path.clone(), kind);
        if self.outcomes.insert(key, outcome).is_some() {
            log::debug!(
                "Manifest lists {} twice, keeping the last row",
                row.path.display()
            );
        } else {
            self.entries.push(MediaEntry::new(row.path, kind));
        }
    }

    /// Append every entry of another manifest. Later rows win on conflicts.
    pub fn merge(&mut self, other: Manifest) {
        for entry in other.entries {
            let key = (entry.path.clone(), entry.kind);
            if let Some(outcome) = other.outcomes.get(&key) {
                if self.outcomes.insert(key, outcome.clone()).is_none() {
                    self.entries.push(entry);
                }
            }
        }
        self.skipped += other.skipped;
    }

    /// Media entries in manifest order.
    #[must_use]
    pub fn entries(&self) -> &[MediaEntry] {
        &self.entries
    }

    /// Number of media entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the manifest has no media entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rows skipped because they were not media files.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Turn the manifest into an extractor that answers from its rows.
    #[must_use]
    pub fn into_extractor(self) -> (Vec<MediaEntry>, ManifestExtractor) {
        (
            self.entries,
            ManifestExtractor {
                outcomes: self.outcomes,
            },
        )
    }
}

/// [`FingerprintExtractor`] backed by precomputed manifest rows.
#[derive(Debug, Clone, Default)]
pub struct ManifestExtractor {
    outcomes: HashMap<(PathBuf, MediaKind), Outcome>,
}

impl FingerprintExtractor for ManifestExtractor {
    fn extract(&self, entry: &MediaEntry) -> Result<Fingerprint, ExtractionError> {
        match self.outcomes.get(&(entry.path.clone(), entry.kind)) {
            Some(Outcome::Hex(hex)) => {
                Fingerprint::from_hex(hex).map_err(|source| ExtractionError::InvalidFingerprint {
                    path: entry.path.clone(),
                    source,
                })
            }
            Some(Outcome::Failed(reason)) => Err(ExtractionError::Failed {
                path: entry.path.clone(),
                reason: reason.clone(),
            }),
            None => Err(ExtractionError::Missing(entry.path.clone())),
        }
    }
}
