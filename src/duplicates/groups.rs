//! Similarity groups and the union-find grouping engine.
//!
//! # Overview
//!
//! [`GroupingEngine`] turns accepted pairs into a partition of the records.
//! Every record starts alone; each accepted pair `(a, b)` merges the groups
//! of `a` and `b` if they differ. The engine is a flat, index-based
//! union-find (union by size, path halving) sized to the record count.
//!
//! ## Founding members and reported similarity
//!
//! The founding member of a group is its lowest record index. When two groups
//! merge, the founder of the group with the higher founder is "merged in" and
//! remembers the similarity of the pair that triggered the merge; members
//! that were already in a group keep their own value. A group's reported
//! similarity is its weakest merge edge.
//!
//! Open question: this is single-linkage chaining. `A~B` and `B~C` put
//! `A`, `B` and `C` in one group even when `A` and `C` alone would not
//! qualify, and the group score does not bound every internal pair. The
//! behavior is kept as the grouping contract; requiring every pair to meet
//! the threshold would be complete-linkage clustering, a different and more
//! expensive algorithm.
//!
//! # Example
//!
//! ```
//! use simdupe::duplicates::GroupingEngine;
//!
//! let mut engine = GroupingEngine::new(3);
//! assert!(engine.merge(0, 1, 0.95));
//! assert!(engine.merge(1, 2, 0.95));
//! assert!(!engine.merge(0, 2, 0.5)); // already together
//!
//! let partition = engine.partition();
//! assert_eq!(partition.len(), 1);
//! assert_eq!(partition[0].members, vec![(0, 1.0), (1, 0.95), (2, 0.95)]);
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::scanner::{FileRecord, MediaKind};

/// One group of the final partition, by record index.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexGroup {
    /// `(record index, member similarity)`, founder first, ascending index
    pub members: Vec<(usize, f64)>,
}

/// Union-find over record indices.
#[derive(Debug, Clone)]
pub struct GroupingEngine {
    parent: Vec<usize>,
    size: Vec<usize>,
    /// Lowest index in the set, valid at roots only.
    founder: Vec<usize>,
    /// Similarity of the merge that brought this record's former group in.
    link: Vec<f64>,
    merges: usize,
}

impl GroupingEngine {
    /// Create an engine with `len` singleton groups.
    #[must_use]
    pub fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
            size: vec![1; len],
            founder: (0..len).collect(),
            link: vec![1.0; len],
            merges: 0,
        }
    }

    /// Number of records tracked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.parent.len()
    }

    /// Whether the engine tracks no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    /// Number of merges performed so far.
    #[must_use]
    pub fn merges(&self) -> usize {
        self.merges
    }

    /// Root of the set containing `x`.
    pub fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    /// Founding member (lowest index) of the group containing `x`.
    pub fn founder_of(&mut self, x: usize) -> usize {
        let root = self.find(x);
        self.founder[root]
    }

    /// Merge the groups of `a` and `b` because they matched with `similarity`.
    ///
    /// Returns `false` if they were already in the same group.
    pub fn merge(&mut self, a: usize, b: usize, similarity: f64) -> bool {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return false;
        }

        let (fa, fb) = (self.founder[ra], self.founder[rb]);
        let (founder, merged_in) = if fa < fb { (fa, fb) } else { (fb, fa) };
        self.link[merged_in] = similarity;

        let (big, small) = if self.size[ra] >= self.size[rb] {
            (ra, rb)
        } else {
            (rb, ra)
        };
        self.parent[small] = big;
        self.size[big] += self.size[small];
        self.founder[big] = founder;
        self.merges += 1;

        log::trace!(
            "Merged group of {} into group of {} (similarity {:.4})",
            merged_in,
            founder,
            similarity
        );
        true
    }

    /// Final partition, ordered by founder.
    ///
    /// Every record appears in exactly one group; singletons included.
    pub fn partition(&mut self) -> Vec<IndexGroup> {
        let mut by_founder: BTreeMap<usize, Vec<(usize, f64)>> = BTreeMap::new();
        for idx in 0..self.len() {
            let founder = self.founder_of(idx);
            let similarity = if idx == founder { 1.0 } else { self.link[idx] };
            by_founder.entry(founder).or_default().push((idx, similarity));
        }
        by_founder
            .into_values()
            .map(|members| IndexGroup { members })
            .collect()
    }
}

/// A member of a similarity group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupMember {
    /// File identifier
    pub path: PathBuf,
    /// Similarity of the merge edge that brought this member in
    /// (1.0 for the founding member)
    pub similarity: f64,
}

/// Files judged similar to each other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityGroup {
    /// Media kind shared by all members
    pub kind: MediaKind,
    /// Members, founding member first
    pub members: Vec<GroupMember>,
    /// Weakest merge edge in the group (1.0 for singletons)
    pub similarity: f64,
}

impl SimilarityGroup {
    /// Build a group from an engine partition entry.
    ///
    /// # Panics
    ///
    /// Panics if the group is empty or an index is out of range for `records`.
    #[must_use]
    pub fn from_indices(group: &IndexGroup, records: &[FileRecord]) -> Self {
        let kind = records[group.members[0].0].kind;
        let members: Vec<GroupMember> = group
            .members
            .iter()
            .map(|&(idx, similarity)| GroupMember {
                path: records[idx].path.clone(),
                similarity,
            })
            .collect();
        let similarity = members
            .iter()
            .skip(1)
            .map(|m| m.similarity)
            .fold(1.0, f64::min);
        Self {
            kind,
            members,
            similarity,
        }
    }

    /// Number of files in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Check if this group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Whether this group has 2+ files and belongs in a duplicate report.
    #[must_use]
    pub fn is_duplicate(&self) -> bool {
        self.members.len() > 1
    }

    /// The founding member.
    #[must_use]
    pub fn founder(&self) -> Option<&GroupMember> {
        self.members.first()
    }

    /// Mean similarity of the merged-in members (1.0 for singletons).
    #[must_use]
    pub fn average_similarity(&self) -> f64 {
        let merged = &self.members[1.min(self.members.len())..];
        if merged.is_empty() {
            1.0
        } else {
            merged.iter().map(|m| m.similarity).sum::<f64>() / merged.len() as f64
        }
    }

    /// Just the paths of the files in this group.
    #[must_use]
    pub fn paths(&self) -> Vec<PathBuf> {
        self.members.iter().map(|m| m.path.clone()).collect()
    }
}

/// Keep only groups with 2+ members.
pub fn duplicate_groups(groups: &[SimilarityGroup]) -> impl Iterator<Item = &SimilarityGroup> {
    groups.iter().filter(|g| g.is_duplicate())
}
