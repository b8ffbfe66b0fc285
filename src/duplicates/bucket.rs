//! Bucketing: cutting the all-pairs comparison down to likely matches.
//!
//! # Overview
//!
//! Every fingerprint is split into `bands` consecutive slices of `key_bits`
//! bits (most significant bit first). Each slice, together with the record's
//! kind and fingerprint width, forms a [`BucketKey`]. Only records that share
//! at least one key become a [`CandidatePair`].
//!
//! ## Recall
//!
//! Bit-identical fingerprints share every key, so they are always compared.
//! With `b` bands covering the whole fingerprint, two fingerprints that differ
//! in fewer than `b` bits must agree on at least one band, so they are also
//! always compared. Pairs further apart than that may be missed; more bands
//! (with shorter keys) raise recall at the cost of more candidates.
//!
//! # Example
//!
//! ```
//! use simdupe::duplicates::{BucketRule, Bucketer};
//! use simdupe::scanner::{FileRecord, Fingerprint, MediaKind};
//! use std::path::PathBuf;
//!
//! let records = vec![
//!     FileRecord::new(PathBuf::from("a.png"), MediaKind::Image, Fingerprint::from_u64(0xff)),
//!     FileRecord::new(PathBuf::from("b.png"), MediaKind::Image, Fingerprint::from_u64(0xff)),
//!     FileRecord::new(PathBuf::from("c.mp4"), MediaKind::Video, Fingerprint::from_u64(0xff)),
//! ];
//!
//! let bucketer = Bucketer::build(&records, &BucketRule::default());
//! let pairs = bucketer.candidate_pairs();
//!
//! // The video is never paired with the images.
//! assert_eq!(pairs.len(), 1);
//! assert_eq!((pairs[0].a, pairs[0].b), (0, 1));
//! ```

use std::collections::{BTreeMap, BTreeSet, HashSet};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::scanner::{FileRecord, MediaKind};

/// Default bucket key width in bits.
pub const DEFAULT_KEY_BITS: u32 = 16;

/// Default number of bands. Four 16-bit bands cover a 64-bit pHash.
pub const DEFAULT_BANDS: u32 = 4;

/// Errors in a bucket rule.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum BucketError {
    /// Key width outside 1..=64.
    #[error("Bucket key width must be between 1 and 64 bits, got {0}")]
    InvalidKeyBits(u32),

    /// Zero bands requested.
    #[error("At least one band is required")]
    NoBands,
}

/// How bucket keys are cut out of a fingerprint.
///
/// Fixed for the duration of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketRule {
    key_bits: u32,
    bands: u32,
}

impl BucketRule {
    /// Create a rule with `bands` consecutive keys of `key_bits` bits each.
    ///
    /// # Errors
    ///
    /// Returns an error if `key_bits` is not in 1..=64 or `bands` is zero.
    pub fn new(key_bits: u32, bands: u32) -> Result<Self, BucketError> {
        if !(1..=64).contains(&key_bits) {
            return Err(BucketError::InvalidKeyBits(key_bits));
        }
        if bands == 0 {
            return Err(BucketError::NoBands);
        }
        Ok(Self { key_bits, bands })
    }

    /// Bits per key.
    #[must_use]
    pub fn key_bits(&self) -> u32 {
        self.key_bits
    }

    /// Number of bands.
    #[must_use]
    pub fn bands(&self) -> u32 {
        self.bands
    }

    /// Key width and band count actually used for a fingerprint of `width` bits.
    ///
    /// Keys never exceed the fingerprint and bands never run past its end;
    /// at least one band is always produced.
    #[must_use]
    pub fn layout(&self, width: u32) -> (u32, u32) {
        let key_bits = self.key_bits.min(width).max(1);
        let bands = self.bands.min(width / key_bits).max(1);
        (key_bits, bands)
    }
}

impl Default for BucketRule {
    fn default() -> Self {
        Self {
            key_bits: DEFAULT_KEY_BITS,
            bands: DEFAULT_BANDS,
        }
    }
}

impl std::fmt::Display for BucketRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} band(s) x {} bit(s)", self.bands, self.key_bits)
    }
}

/// Key of one bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BucketKey {
    /// Band the key was cut from
    pub band: u32,
    /// Media kind of every record in the bucket
    pub kind: MediaKind,
    /// Fingerprint width of every record in the bucket
    pub width: u32,
    /// The packed key bits
    pub value: u64,
}

/// Two record indices eligible for comparison, `a < b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CandidatePair {
    /// Lower record index
    pub a: usize,
    /// Higher record index
    pub b: usize,
}

impl CandidatePair {
    /// Create a pair, ordering the indices.
    #[must_use]
    pub fn new(x: usize, y: usize) -> Self {
        debug_assert_ne!(x, y, "a record cannot pair with itself");
        Self {
            a: x.min(y),
            b: x.max(y),
        }
    }
}

/// Records grouped by bucket key.
#[derive(Debug, Clone, Default)]
pub struct Bucketer {
    buckets: Vec<(BucketKey, Vec<usize>)>,
}

impl Bucketer {
    /// Assign every record to one bucket per band.
    ///
    /// Bands are independent shards and are built in parallel. Buckets come
    /// out ordered by band, then key, and list record indices in ascending
    /// order, so candidate generation is deterministic.
    #[must_use]
    pub fn build(records: &[FileRecord], rule: &BucketRule) -> Self {
        let widths: BTreeSet<u32> = records.iter().map(|r| r.fingerprint.width()).collect();
        for width in widths {
            let (key_bits, bands) = rule.layout(width);
            if key_bits != rule.key_bits() || bands != rule.bands() {
                log::warn!(
                    "Bucket rule {} does not fit {}-bit fingerprints, using {} band(s) x {} bit(s)",
                    rule,
                    width,
                    bands,
                    key_bits
                );
            }
        }

        let shards: Vec<BTreeMap<BucketKey, Vec<usize>>> = (0..rule.bands())
            .into_par_iter()
            .map(|band| {
                let mut shard: BTreeMap<BucketKey, Vec<usize>> = BTreeMap::new();
                for (idx, record) in records.iter().enumerate() {
                    let width = record.fingerprint.width();
                    let (key_bits, bands) = rule.layout(width);
                    if band >= bands {
                        continue;
                    }
                    let key = BucketKey {
                        band,
                        kind: record.kind,
                        width,
                        value: record.fingerprint.bits(band * key_bits, key_bits),
                    };
                    shard.entry(key).or_default().push(idx);
                }
                shard
            })
            .collect();

        let buckets: Vec<(BucketKey, Vec<usize>)> = shards.into_iter().flatten().collect();

        log::debug!(
            "Bucketed {} records into {} buckets (largest: {})",
            records.len(),
            buckets.len(),
            buckets.iter().map(|(_, m)| m.len()).max().unwrap_or(0)
        );

        Self { buckets }
    }

    /// Number of buckets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Whether there are no buckets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Size of the largest bucket.
    #[must_use]
    pub fn largest_bucket(&self) -> usize {
        self.buckets
            .iter()
            .map(|(_, members)| members.len())
            .max()
            .unwrap_or(0)
    }

    /// Iterate over buckets and their record indices.
    pub fn buckets(&self) -> impl Iterator<Item = (&BucketKey, &[usize])> {
        self.buckets.iter().map(|(k, m)| (k, m.as_slice()))
    }

    /// All 2-combinations within each bucket, each pair exactly once.
    ///
    /// Pairs are emitted in bucket order; a pair that co-occurs in a later
    /// band is dropped.
    #[must_use]
    pub fn candidate_pairs(&self) -> Vec<CandidatePair> {
        let mut seen: HashSet<CandidatePair> = HashSet::new();
        let mut pairs = Vec::new();

        for (key, members) in &self.buckets {
            if members.len() < 2 {
                continue;
            }
            log::trace!(
                "Bucket band={} {} {:#x}: {} records",
                key.band,
                key.kind,
                key.value,
                members.len()
            );
            for (i, &a) in members.iter().enumerate() {
                for &b in &members[i + 1..] {
                    let pair = CandidatePair::new(a, b);
                    if seen.insert(pair) {
                        pairs.push(pair);
                    }
                }
            }
        }

        pairs
    }
}
