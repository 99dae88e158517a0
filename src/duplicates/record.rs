//! Candidate records and their content samples.

use std::path::PathBuf;

use crate::scanner::hardlink::InodeKey;
use crate::scanner::{DiscoveredFile, Hash};

/// Four edge bytes of a file.
///
/// Byte order: offset `0`, offset `1`, offset `size-2`, offset `size-1`.
/// Offsets that do not exist in a file shorter than two bytes are zero, and
/// a file that could not be read has an all-zero signature.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Signature(pub [u8; 4]);

impl Signature {
    /// The signature used for unreadable files.
    pub const ZERO: Self = Self([0; 4]);

    /// The two leading bytes.
    #[must_use]
    pub fn head(&self) -> [u8; 2] {
        [self.0[0], self.0[1]]
    }

    /// The two trailing bytes.
    #[must_use]
    pub fn tail(&self) -> [u8; 2] {
        [self.0[2], self.0[3]]
    }
}

/// Partial digests of a leading and a trailing slice of a file.
///
/// See [`crate::scanner::fingerprint_slice_len`] for the slice length.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    /// Digest of bytes `[0, n)`
    pub head: Hash,
    /// Digest of bytes `[size - n, size)`
    pub tail: Hash,
}

impl Fingerprint {
    /// The fingerprint used for unreadable files.
    pub const ZERO: Self = Self {
        head: [0; 32],
        tail: [0; 32],
    };
}

/// One discovered file and everything the pipeline learns about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateRecord {
    /// Path as discovered
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Device identifier
    pub dev: u64,
    /// Inode number
    pub ino: u64,
    /// Hardlink count
    pub nlink: u64,
    /// Edge bytes, filled by the byte-signature pass
    pub signature: Signature,
    /// Slice digests, filled by the fingerprint pass
    pub fingerprint: Fingerprint,
    /// Full-content digest, filled by the checksum stage
    pub digest: Option<Hash>,
    /// Set when a stage stopped at this record
    pub interrupted: bool,
}

impl CandidateRecord {
    /// Create a record with no samples computed yet.
    #[must_use]
    pub fn new(path: PathBuf, size: u64) -> Self {
        Self {
            path,
            size,
            dev: 0,
            ino: 0,
            nlink: 0,
            signature: Signature::ZERO,
            fingerprint: Fingerprint::ZERO,
            digest: None,
            interrupted: false,
        }
    }

    /// Attach `(dev, ino, nlink)`.
    #[must_use]
    pub fn with_identity(mut self, dev: u64, ino: u64, nlink: u64) -> Self {
        self.dev = dev;
        self.ino = ino;
        self.nlink = nlink;
        self
    }

    /// `(dev, ino)` identity, if the platform provided one.
    #[must_use]
    pub fn inode_key(&self) -> Option<InodeKey> {
        InodeKey::new(self.dev, self.ino)
    }

    /// Record that processing stopped at this record.
    pub fn mark_interrupted(&mut self) {
        self.interrupted = true;
    }
}

impl From<DiscoveredFile> for CandidateRecord {
    fn from(file: DiscoveredFile) -> Self {
        Self::new(file.path, file.size).with_identity(file.dev, file.ino, file.nlink)
    }
}
