//! Scanner module: the boundary between media files and the grouping core.
//!
//! This module provides:
//! - [`Fingerprint`]: the fixed-width bit vector produced by an external hasher
//! - [`MediaKind`] / [`MediaEntry`] / [`FileRecord`]: the records the core groups
//! - [`extract`]: the fingerprint extraction seam and its parallel driver
//! - [`manifest`]: CSV manifests of precomputed fingerprints
//!
//! # Example
//!
//! ```
//! use simdupe::scanner::{FileRecord, Fingerprint, MediaKind};
//! use std::path::PathBuf;
//!
//! let record = FileRecord::new(
//!     PathBuf::from("/photos/a.jpg"),
//!     MediaKind::Image,
//!     Fingerprint::from_u64(0xdead_beef),
//! );
//! assert_eq!(record.fingerprint.width(), 64);
//! ```

pub mod extract;
pub mod fingerprint;
pub mod manifest;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

// Re-export main types
pub use extract::{
    extract_records, ExtractConfig, ExtractStats, ExtractionError, FingerprintExtractor,
};
pub use fingerprint::{Fingerprint, FingerprintError};
pub use manifest::{Manifest, ManifestError, ManifestExtractor};

/// File extensions treated as images.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "gif", "tiff"];

/// File extensions treated as videos.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "mkv", "flv"];

/// Kind of media a fingerprint was taken from.
///
/// Fingerprints of different kinds are never compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Still image, hashed directly.
    Image,
    /// Video, hashed from a representative frame.
    Video,
}

impl MediaKind {
    /// Infer the kind from a path's extension (case-insensitive).
    ///
    /// Returns `None` for anything that is not a recognised media file.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Some(Self::Image)
        } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            Some(Self::Video)
        } else {
            None
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Image => write!(f, "image"),
            Self::Video => write!(f, "video"),
        }
    }
}

/// A media file waiting for its fingerprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaEntry {
    /// Path identifying the file
    pub path: PathBuf,
    /// Media kind
    pub kind: MediaKind,
}

impl MediaEntry {
    /// Create a new entry.
    #[must_use]
    pub fn new(path: PathBuf, kind: MediaKind) -> Self {
        Self { path, kind }
    }
}

/// A fingerprinted file, ready for grouping.
///
/// Created once per file by the extraction step and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Opaque identifier, usually the file path
    pub path: PathBuf,
    /// Media kind
    pub kind: MediaKind,
    /// Content fingerprint
    pub fingerprint: Fingerprint,
}

impl FileRecord {
    /// Create a new FileRecord.
    ///
    /// # Arguments
    ///
    /// * `path` - Identifier of the file
    /// * `kind` - Media kind
    /// * `fingerprint` - Content fingerprint
    #[must_use]
    pub fn new(path: PathBuf, kind: MediaKind, fingerprint: Fingerprint) -> Self {
        Self {
            path,
            kind,
            fingerprint,
        }
    }
}
