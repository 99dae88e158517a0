//! Size prefilter.
//!
//! Two files can only be duplicates if they have the same size. Because the
//! [`CandidateStore`] keeps records in ascending size order, a record without
//! an equal-size neighbor is alone in its size group and is removed here,
//! before any file content is read.

use super::store::CandidateStore;
use crate::signal::CancellationToken;

/// Options for [`prefilter`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrefilterOptions {
    /// Collapse path-doubles after the size pass.
    ///
    /// Only needed when the same inode can be reached twice, i.e. when more
    /// than one root is scanned or symlinks are followed.
    pub collapse_hardlinks: bool,
}

impl PrefilterOptions {
    /// Derive the options from the shape of a scan.
    #[must_use]
    pub fn for_scan(root_count: usize, follow_symlinks: bool) -> Self {
        Self {
            collapse_hardlinks: root_count > 1 || follow_symlinks,
        }
    }
}

/// Statistics from the size prefilter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrefilterStats {
    /// Records in the store on entry
    pub input: usize,
    /// Records removed for having a unique size
    pub removed: usize,
    /// Records removed as path-doubles
    pub path_doubles: usize,
    /// Whether a stop request ended the pass early
    pub interrupted: bool,
}

/// Remove every record whose size no neighbor shares.
///
/// The pass polls `token` once per record. When a stop is requested it
/// acknowledges the request and returns immediately, leaving the store with
/// whatever subset remains.
pub fn prefilter(
    store: &mut CandidateStore,
    options: PrefilterOptions,
    token: Option<&CancellationToken>,
) -> PrefilterStats {
    let mut stats = PrefilterStats {
        input: store.len(),
        ..Default::default()
    };

    let mut cursor = store.first();
    while let Some(id) = cursor {
        if token.is_some_and(CancellationToken::acknowledge) {
            stats.interrupted = true;
            log::info!("Size prefilter interrupted, {} records left", store.len());
            return stats;
        }

        let prev = store.prev(id);
        let next = store.next(id);
        if store.has_equal_neighbor(id, prev) || store.has_equal_neighbor(id, next) {
            cursor = next;
        } else {
            stats.removed += 1;
            cursor = store.remove(id);
        }
    }

    if options.collapse_hardlinks {
        let before = store.len();
        stats.path_doubles = store.collapse_hardlinks();
        stats.removed += before - store.len() - stats.path_doubles;
    }

    log::info!(
        "Size prefilter: {} -> {} records ({} unique sizes, {} path-doubles)",
        stats.input,
        store.len(),
        stats.removed,
        stats.path_doubles
    );

    stats
}
