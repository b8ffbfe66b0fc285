//! Similarity grouping core.
//!
//! This module provides functionality for:
//! - Bucketing fingerprints into candidate pairs ([`bucket`])
//! - Scoring pairs by normalized Hamming distance ([`distance`])
//! - Merging accepted pairs into disjoint groups ([`groups`])
//! - Running the whole pipeline ([`finder`])

pub mod bucket;
pub mod distance;
pub mod finder;
pub mod groups;

pub use bucket::{BucketError, BucketKey, BucketRule, Bucketer, CandidatePair};
pub use distance::{hamming_distance, similarity, try_similarity};
pub use finder::{
    compute_groups, validate_threshold, FinderConfig, FinderError, GroupingSummary,
    SimilarityFinder, DEFAULT_THRESHOLD,
};
pub use groups::{duplicate_groups, GroupMember, GroupingEngine, IndexGroup, SimilarityGroup};
