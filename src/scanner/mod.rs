//! Scanner module for directory traversal and file content sampling.
//!
//! This module provides functionality for:
//! - Directory walking with depth, mount and symlink restrictions
//! - File and directory name patterns
//! - Content sampling and hashing with BLAKE3
//! - Inode identity for path-double detection
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Directory traversal and file discovery
//! - [`pattern`]: Base-name regular expressions
//! - [`hasher`]: BLAKE3 signatures, fingerprints and full hashes
//! - [`hardlink`]: `(device, inode)` identity
//!
//! # Example
//!
//! ```no_run
//! use dupsift::scanner::{Walker, WalkerConfig};
//! use std::path::PathBuf;
//!
//! let config = WalkerConfig {
//!     max_depth: Some(3),
//!     file_pattern: Some(r"\.jpe?g$".to_string()),
//!     ..Default::default()
//! };
//!
//! let walker = Walker::new(vec![PathBuf::from(".")], config);
//! for entry in walker.walk() {
//!     match entry {
//!         Ok(file) => println!("{}: {} bytes", file.path.display(), file.size),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

pub mod hardlink;
pub mod hasher;
pub mod pattern;
pub mod walker;

use std::path::{Path, PathBuf};

// Re-export main types
pub use hasher::{fingerprint_slice_len, hash_to_hex, Hash, Hasher};
pub use pattern::NamePattern;
pub use walker::Walker;

/// A regular file yielded by the traversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFile {
    /// Path as produced by the walk (rooted at one of the scan roots)
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Device identifier (0 where unsupported)
    pub dev: u64,
    /// Inode number (0 where unsupported)
    pub ino: u64,
    /// Hardlink count (0 where unsupported)
    pub nlink: u64,
}

impl DiscoveredFile {
    /// Create a discovered file without inode information.
    #[must_use]
    pub fn new(path: PathBuf, size: u64) -> Self {
        Self {
            path,
            size,
            dev: 0,
            ino: 0,
            nlink: 0,
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
}

/// Configuration for directory walking.
#[derive(Debug, Clone, Default)]
pub struct WalkerConfig {
    /// Maximum recursion depth below a root (`None` = unlimited).
    /// Entries directly inside a root are at depth 1.
    pub max_depth: Option<usize>,

    /// Do not cross into other file systems.
    pub same_file_system: bool,

    /// Follow symbolic links during traversal.
    pub follow_symlinks: bool,

    /// Only files whose name passes this pattern are reported.
    pub file_pattern: Option<String>,

    /// Only directories whose name passes this pattern are entered.
    /// Roots are always entered.
    pub dir_pattern: Option<String>,

    /// Match patterns case-sensitively.
    pub case_sensitive: bool,

    /// Select names that do NOT match the patterns.
    pub invert_match: bool,
}

/// Errors that can occur during directory scanning.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// Following a symbolic link led back to one of its ancestors.
    #[error("Symlink loop: {0}")]
    SymlinkLoop(PathBuf),

    /// An I/O error occurred while accessing a file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Errors that can occur during file hashing.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The specified file was not found.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl HashError {
    /// Classify an I/O error raised while reading `path`.
    #[must_use]
    pub fn from_io(path: &Path, error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }
}
