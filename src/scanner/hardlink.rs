//! Inode identity for path-double detection.
//!
//! # Overview
//!
//! Two paths pointing at the same `(device, inode)` pair are the same file,
//! not duplicates of each other. This happens with hardlinks, with roots that
//! overlap, and when following symlinks. [`InodeKey`] is the identity and
//! [`HardlinkTracker`] remembers which identities have been seen.
//!
//! # Platform Support
//!
//! - **Unix**: `(st_dev, st_ino)` and `st_nlink` from file metadata
//! - **Other**: no identity; every path is treated as a distinct file
//!
//! # Example
//!
//! ```
//! use dupsift::scanner::hardlink::{HardlinkTracker, InodeKey};
//!
//! let mut tracker = HardlinkTracker::new();
//! let key = InodeKey::new(1, 42).unwrap();
//!
//! assert!(!tracker.is_path_double(key)); // first occurrence
//! assert!(tracker.is_path_double(key));  // same inode again
//! ```

use std::collections::HashSet;
use std::fs::Metadata;

/// Identity of an on-disk file: `(device, inode)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InodeKey {
    /// Device identifier
    pub dev: u64,
    /// Inode number on that device
    pub ino: u64,
}

impl InodeKey {
    /// Build a key, or `None` when there is no usable inode number.
    ///
    /// Inode `0` is what non-Unix platforms report, and never identifies a
    /// real file.
    #[must_use]
    pub fn new(dev: u64, ino: u64) -> Option<Self> {
        (ino != 0).then_some(Self { dev, ino })
    }
}

/// Raw `(dev, ino, nlink)` triple read from metadata.
///
/// All zero on platforms without inode information.
#[must_use]
pub fn identity_from_metadata(metadata: &Metadata) -> (u64, u64, u64) {
    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        (metadata.dev(), metadata.ino(), metadata.nlink())
    }

    #[cfg(not(unix))]
    {
        let _ = metadata;
        (0, 0, 0)
    }
}

/// Tracks seen inode keys to detect path-doubles.
///
/// # Thread Safety
///
/// `HardlinkTracker` is NOT thread-safe; the pipeline only uses it from the
/// orchestrating thread.
#[derive(Debug, Default)]
pub struct HardlinkTracker {
    seen: HashSet<InodeKey>,
}

impl HardlinkTracker {
    /// Create an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a tracker with pre-allocated capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            seen: HashSet::with_capacity(capacity),
        }
    }

    /// Record `key` and report whether it had been seen before.
    pub fn is_path_double(&mut self, key: InodeKey) -> bool {
        !self.seen.insert(key)
    }

    /// Number of distinct identities recorded.
    #[must_use]
    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }

    /// Whether this platform reports inode identities.
    #[must_use]
    pub const fn is_supported() -> bool {
        cfg!(unix)
    }
}
