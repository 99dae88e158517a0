//! BLAKE3 file hasher.
//!
//! # Overview
//!
//! [`Hasher`] is the only place that reads file content. It offers the three
//! samples the pipeline needs, from cheapest to most expensive:
//!
//! - [`Hasher::signature`]: the first two and last two bytes
//! - [`Hasher::fingerprint`]: digests of a leading and a trailing slice
//! - [`Hasher::full_hash`]: digest of the whole file
//!
//! [`Hasher::hash_range`] is the general byte-range primitive the other
//! digests are built on.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::ops::Range;
use std::path::Path;

use super::HashError;

/// 32-byte BLAKE3 digest.
pub type Hash = [u8; 32];

/// Read buffer used when streaming file content.
pub const BUFFER_SIZE: usize = 64 * 1024;

/// Files at least this large are hashed through a memory map.
pub const MMAP_THRESHOLD: u64 = 16 * 1024 * 1024;

/// Upper bound for each fingerprint slice.
pub const FINGERPRINT_MAX_SLICE: u64 = 16 * 1024;

/// A fingerprint slice covers one tenth of the file (before clamping).
const FINGERPRINT_DIVISOR: u64 = 10;

/// Length of each fingerprint slice for a file of `size` bytes.
///
/// One tenth of the file, at least one byte, at most
/// [`FINGERPRINT_MAX_SLICE`], and never more than the file itself.
#[must_use]
pub fn fingerprint_slice_len(size: u64) -> u64 {
    (size / FINGERPRINT_DIVISOR)
        .clamp(1, FINGERPRINT_MAX_SLICE)
        .min(size)
}

/// Format a digest as lowercase hexadecimal.
///
/// # Example
///
/// ```
/// use dupsift::scanner::hash_to_hex;
///
/// let hex = hash_to_hex(&[0xab; 32]);
/// assert_eq!(hex.len(), 64);
/// assert!(hex.starts_with("abab"));
/// ```
#[must_use]
pub fn hash_to_hex(hash: &Hash) -> String {
    use std::fmt::Write;
    hash.iter().fold(String::with_capacity(64), |mut out, b| {
        let _ = write!(out, "{b:02x}");
        out
    })
}

/// Stateless BLAKE3 hasher over files on disk.
#[derive(Debug, Clone)]
pub struct Hasher {
    buffer_size: usize,
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher {
    /// Create a hasher with the default read buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::with_buffer_size(BUFFER_SIZE)
    }

    /// Create a hasher with a custom read buffer size.
    #[must_use]
    pub fn with_buffer_size(buffer_size: usize) -> Self {
        Self {
            buffer_size: buffer_size.max(1),
        }
    }

    /// Hash a byte range of a file, or the whole file when `range` is `None`.
    ///
    /// A range extending past the end of the file is truncated at EOF.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the file cannot be opened, seeked or read.
    pub fn hash_range(&self, path: &Path, range: Option<Range<u64>>) -> Result<Hash, HashError> {
        let Some(range) = range else {
            return self.full_hash(path);
        };

        let mut file = File::open(path).map_err(|e| HashError::from_io(path, e))?;
        file.seek(SeekFrom::Start(range.start))
            .map_err(|e| HashError::from_io(path, e))?;

        let mut hasher = blake3::Hasher::new();
        let limit = range.end.saturating_sub(range.start);
        self.stream(path, file.take(limit), &mut hasher)?;
        Ok(*hasher.finalize().as_bytes())
    }

    /// Hash the complete content of a file.
    ///
    /// Large files go through a memory map, everything else is streamed.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the file cannot be read.
    pub fn full_hash(&self, path: &Path) -> Result<Hash, HashError> {
        let file = File::open(path).map_err(|e| HashError::from_io(path, e))?;
        let len = file
            .metadata()
            .map_err(|e| HashError::from_io(path, e))?
            .len();

        let mut hasher = blake3::Hasher::new();
        if len >= MMAP_THRESHOLD {
            log::trace!("Hashing {} via mmap ({} bytes)", path.display(), len);
            hasher
                .update_mmap(path)
                .map_err(|e| HashError::from_io(path, e))?;
        } else {
            self.stream(path, file, &mut hasher)?;
        }
        Ok(*hasher.finalize().as_bytes())
    }

    /// Read the edge bytes of a file: offsets `0`, `1`, `size-2`, `size-1`.
    ///
    /// Offsets that fall outside a file shorter than two bytes read as zero.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the file cannot be read, or is shorter than
    /// `size` claims.
    pub fn signature(&self, path: &Path, size: u64) -> Result<[u8; 4], HashError> {
        let mut bytes = [0u8; 4];
        if size == 0 {
            return Ok(bytes);
        }

        let mut file = File::open(path).map_err(|e| HashError::from_io(path, e))?;
        let head = size.min(2) as usize;
        file.read_exact(&mut bytes[..head])
            .map_err(|e| HashError::from_io(path, e))?;

        if size >= 2 {
            file.seek(SeekFrom::Start(size - 2))
                .map_err(|e| HashError::from_io(path, e))?;
            file.read_exact(&mut bytes[2..])
                .map_err(|e| HashError::from_io(path, e))?;
        } else {
            // one-byte file: its last byte is its first byte
            bytes[3] = bytes[0];
        }
        Ok(bytes)
    }

    /// Digest the leading and trailing slices of a file.
    ///
    /// Both slices have length [`fingerprint_slice_len`]`(size)`; for very
    /// small files they overlap.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if either slice cannot be read.
    pub fn fingerprint(&self, path: &Path, size: u64) -> Result<(Hash, Hash), HashError> {
        let slice = fingerprint_slice_len(size);
        let head = self.hash_range(path, Some(0..slice))?;
        let tail = self.hash_range(path, Some(size - slice..size))?;
        Ok((head, tail))
    }

    fn stream<R: Read>(
        &self,
        path: &Path,
        mut reader: R,
        hasher: &mut blake3::Hasher,
    ) -> Result<(), HashError> {
        let mut buffer = vec![0u8; self.buffer_size];
        loop {
            match reader.read(&mut buffer) {
                Ok(0) => return Ok(()),
                Ok(n) => {
                    hasher.update(&buffer[..n]);
                }
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(HashError::from_io(path, e)),
            }
        }
    }
}
