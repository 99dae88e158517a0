//! Multi-pass filter engine.
//!
//! # Overview
//!
//! A [`FilterPass`] samples something cheap from each record (`prepare`) and
//! decides whether two samples are compatible (`matches`). [`run_pass`] walks
//! the store one size group at a time, prepares every member, and removes
//! each member that matches no other member of its group. Nothing a pass
//! removes can be a duplicate, so the expensive full checksum only runs on
//! what survives.
//!
//! Two passes ship with the crate and run in this order:
//!
//! 1. [`ByteSignaturePass`]: the first two and last two bytes of the file
//! 2. [`FingerprintPass`]: BLAKE3 digests of a leading and a trailing slice
//!
//! # Example
//!
//! ```no_run
//! use dupsift::duplicates::{run_pass, ByteSignaturePass, CandidateStore, FingerprintPass};
//!
//! let mut store = CandidateStore::new();
//! // ... fill the store ...
//! let bytes = run_pass(&mut store, &ByteSignaturePass::new(), None, None);
//! let prints = run_pass(&mut store, &FingerprintPass::new(), None, None);
//! println!("removed {} + {}", bytes.removed, prints.removed);
//! ```

use super::record::{CandidateRecord, Fingerprint, Signature};
use super::store::{CandidateStore, RecordId};
use crate::progress::ProgressCallback;
use crate::scanner::Hasher;
use crate::signal::CancellationToken;

/// Number of groups (or records, for the checksum stage) between two
/// progress reports.
pub const STATUS_UPDATE_INTERVAL: usize = 10;

/// One narrowing criterion applied within size groups.
pub trait FilterPass {
    /// Short name used in logs and as the progress phase.
    fn name(&self) -> &'static str;

    /// Compute this pass's sample for `record`.
    ///
    /// Must not fail: a record whose sample cannot be computed gets a
    /// neutral value instead.
    fn prepare(&self, record: &mut CandidateRecord);

    /// Whether two prepared records may still be duplicates.
    fn matches(&self, a: &CandidateRecord, b: &CandidateRecord) -> bool;
}

/// Statistics from one filter pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassStats {
    /// Records in the store on entry
    pub input: usize,
    /// Size groups fully processed
    pub groups: usize,
    /// Records removed
    pub removed: usize,
    /// Whether a stop request ended the pass early
    pub interrupted: bool,
}

/// Run `pass` over every size group of `store`.
///
/// The token is polled at the start of each group. On a stop request the
/// group's first record is marked interrupted, the request is acknowledged
/// and the pass returns; groups already processed stay filtered and the
/// rest of the store is left untouched.
pub fn run_pass<P: FilterPass + ?Sized>(
    store: &mut CandidateStore,
    pass: &P,
    token: Option<&CancellationToken>,
    progress: Option<&dyn ProgressCallback>,
) -> PassStats {
    let mut stats = PassStats {
        input: store.len(),
        ..Default::default()
    };
    let total_groups = count_groups(store);

    if let Some(callback) = progress {
        callback.on_phase_start(pass.name(), total_groups);
    }
    log::debug!(
        "Filtering by {}: {} records in {} size groups",
        pass.name(),
        stats.input,
        total_groups
    );

    let mut cursor = store.first();
    while let Some(start) = cursor {
        if token.is_some_and(CancellationToken::acknowledge) {
            if let Some(record) = store.get_mut(start) {
                record.mark_interrupted();
            }
            stats.interrupted = true;
            log::info!(
                "Filtering by {} interrupted after {} of {} groups",
                pass.name(),
                stats.groups,
                total_groups
            );
            break;
        }

        let group = store.size_group(start);
        cursor = group.last().and_then(|&last| store.next(last));

        for &id in &group {
            if let Some(record) = store.get_mut(id) {
                pass.prepare(record);
            }
        }

        let unmatched = unmatched_members(store, &group, pass);
        stats.removed += unmatched.len();
        for id in unmatched {
            store.remove(id);
        }

        stats.groups += 1;
        if stats.groups % STATUS_UPDATE_INTERVAL == 0 {
            log::debug!(
                "Filtering by {} [{}|{}]",
                pass.name(),
                stats.groups,
                total_groups
            );
            if let Some(callback) = progress {
                if let Some(record) = store.get(start) {
                    callback.on_progress(stats.groups, &record.path.to_string_lossy());
                } else {
                    callback.on_progress(stats.groups, "");
                }
            }
        }
    }

    if let Some(callback) = progress {
        callback.on_phase_end(pass.name());
    }
    log::info!(
        "Filtering by {}: {} -> {} records",
        pass.name(),
        stats.input,
        store.len()
    );

    stats
}

/// Members of `group` that match no other member.
fn unmatched_members<P: FilterPass + ?Sized>(
    store: &CandidateStore,
    group: &[RecordId],
    pass: &P,
) -> Vec<RecordId> {
    group
        .iter()
        .copied()
        .filter(|&i| {
            let Some(a) = store.get(i) else {
                return false;
            };
            !group
                .iter()
                .filter(|&&j| j != i)
                .filter_map(|&j| store.get(j))
                .any(|b| pass.matches(a, b))
        })
        .collect()
}

fn count_groups(store: &CandidateStore) -> usize {
    let mut groups = 0;
    let mut last_size = None;
    for (_, record) in store.iter() {
        if last_size != Some(record.size) {
            groups += 1;
            last_size = Some(record.size);
        }
    }
    groups
}

// ============================================================================
// Passes
// ============================================================================

/// Compares the first two and last two bytes of each file.
#[derive(Debug, Clone, Default)]
pub struct ByteSignaturePass {
    hasher: Hasher,
}

impl ByteSignaturePass {
    /// Create the pass with a default [`Hasher`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl FilterPass for ByteSignaturePass {
    fn name(&self) -> &'static str {
        "bytecompare"
    }

    fn prepare(&self, record: &mut CandidateRecord) {
        record.signature = match self.hasher.signature(&record.path, record.size) {
            Ok(bytes) => {
                let signature = Signature(bytes);
                log::trace!(
                    "Edge bytes {:02x?}..{:02x?}: {}",
                    signature.head(),
                    signature.tail(),
                    record.path.display()
                );
                signature
            }
            Err(e) => {
                log::debug!("Cannot read edge bytes: {}", e);
                Signature::ZERO
            }
        };
    }

    fn matches(&self, a: &CandidateRecord, b: &CandidateRecord) -> bool {
        a.signature == b.signature
    }
}

/// Compares BLAKE3 digests of a leading and a trailing slice of each file.
///
/// See [`crate::scanner::fingerprint_slice_len`] for the slice length.
#[derive(Debug, Clone, Default)]
pub struct FingerprintPass {
    hasher: Hasher,
}

impl FingerprintPass {
    /// Create the pass with a default [`Hasher`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl FilterPass for FingerprintPass {
    fn name(&self) -> &'static str {
        "fingerprint"
    }

    fn prepare(&self, record: &mut CandidateRecord) {
        record.fingerprint = match self.hasher.fingerprint(&record.path, record.size) {
            Ok((head, tail)) => Fingerprint { head, tail },
            Err(e) => {
                log::debug!("Cannot fingerprint: {}", e);
                Fingerprint::ZERO
            }
        };
    }

    fn matches(&self, a: &CandidateRecord, b: &CandidateRecord) -> bool {
        a.fingerprint == b.fingerprint
    }
}
