//! Confirmed duplicate groups.
//!
//! # Overview
//!
//! After the checksum stage every surviving record carries a full digest.
//! [`group_by_digest`] clusters records sharing a digest into
//! [`DuplicateGroup`]s. The output is deterministic: groups are sorted by
//! size (largest first) then digest, and paths inside a group are sorted.
//!
//! # Example
//!
//! ```
//! use dupsift::duplicates::{group_by_digest, CandidateRecord};
//! use std::path::PathBuf;
//!
//! let mut a = CandidateRecord::new(PathBuf::from("/a"), 4);
//! let mut b = CandidateRecord::new(PathBuf::from("/b"), 4);
//! a.digest = Some([1; 32]);
//! b.digest = Some([1; 32]);
//!
//! let groups = group_by_digest(vec![a, b]);
//! assert_eq!(groups.len(), 1);
//! assert_eq!(groups[0].wasted_space(), 4);
//! ```

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::record::CandidateRecord;
use crate::scanner::{hash_to_hex, Hash};

/// Files with identical content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    /// BLAKE3 digest of the shared content
    pub hash: Hash,
    /// Size of each file in bytes
    pub size: u64,
    /// Paths of the files, sorted
    pub files: Vec<PathBuf>,
}

impl DuplicateGroup {
    /// Create a group, sorting `files`.
    #[must_use]
    pub fn new(hash: Hash, size: u64, mut files: Vec<PathBuf>) -> Self {
        files.sort();
        Self { hash, size, files }
    }

    /// Number of files in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if this group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Total size of all copies.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.size * self.files.len() as u64
    }

    /// Space taken by every copy except one.
    #[must_use]
    pub fn wasted_space(&self) -> u64 {
        self.size * self.duplicate_count() as u64
    }

    /// Number of copies beyond the first.
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.files.len().saturating_sub(1)
    }

    /// Digest as lowercase hex.
    #[must_use]
    pub fn hash_hex(&self) -> String {
        hash_to_hex(&self.hash)
    }
}

/// Cluster records by final digest.
///
/// Records without a digest (never hashed, or unreadable) are skipped.
/// Only clusters of two or more files are returned.
#[must_use]
pub fn group_by_digest<I>(records: I) -> Vec<DuplicateGroup>
where
    I: IntoIterator<Item = CandidateRecord>,
{
    let mut clusters: HashMap<(Hash, u64), Vec<PathBuf>> = HashMap::new();
    for record in records {
        if let Some(digest) = record.digest {
            clusters
                .entry((digest, record.size))
                .or_default()
                .push(record.path);
        }
    }

    let mut groups: Vec<DuplicateGroup> = clusters
        .into_iter()
        .filter(|(_, files)| files.len() > 1)
        .map(|((hash, size), files)| {
            log::debug!(
                "Duplicate group {}: {} files, {} bytes each",
                hash_to_hex(&hash),
                files.len(),
                size
            );
            DuplicateGroup::new(hash, size, files)
        })
        .collect();

    groups.sort_by(|a, b| b.size.cmp(&a.size).then_with(|| a.hash.cmp(&b.hash)));
    groups
}
