//! Directory walker built on walkdir.
//!
//! # Overview
//!
//! [`Walker`] traverses one or more roots on the calling thread and yields a
//! [`DiscoveredFile`] for every regular, non-empty file that passes the file
//! pattern. Per entry it makes one of three decisions:
//!
//! - recurse into a directory (depth and directory pattern permitting),
//! - skip a directory subtree,
//! - stop the whole walk, when the cancellation token reports a stop.
//!
//! Empty files and broken symlinks are reported through the log only.
//!
//! # Example
//!
//! ```no_run
//! use dupsift::scanner::{Walker, WalkerConfig};
//! use std::path::PathBuf;
//!
//! let walker = Walker::new(vec![PathBuf::from("/home/user/Downloads")], WalkerConfig::default());
//! let files: Vec<_> = walker.walk().filter_map(Result::ok).collect();
//! println!("Found {} files", files.len());
//! ```

use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use super::hardlink::identity_from_metadata;
use super::{DiscoveredFile, NamePattern, ScanError, WalkerConfig};
use crate::signal::CancellationToken;

type EntryIter<'a> = Box<dyn Iterator<Item = walkdir::Result<DirEntry>> + 'a>;

/// Directory walker over one or more roots.
#[derive(Debug)]
pub struct Walker {
    roots: Vec<PathBuf>,
    config: WalkerConfig,
    token: Option<CancellationToken>,
}

impl Walker {
    /// Create a walker for the given roots.
    #[must_use]
    pub fn new(roots: Vec<PathBuf>, config: WalkerConfig) -> Self {
        Self {
            roots,
            config,
            token: None,
        }
    }

    /// Stop the walk as soon as `token` reports a stop request.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.token = Some(token);
        self
    }

    /// The roots this walker traverses.
    #[must_use]
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Walk all roots in order, yielding discovered files.
    ///
    /// Errors are yielded as [`ScanError`] values rather than stopping
    /// iteration. Children are visited in file-name order so repeated walks
    /// of an unchanged tree produce the same sequence.
    pub fn walk(&self) -> Walk<'_> {
        let pattern = |expr: &Option<String>| {
            expr.as_deref().map(|p| {
                NamePattern::new(p, self.config.case_sensitive, self.config.invert_match)
            })
        };

        Walk {
            walker: self,
            file_pattern: pattern(&self.config.file_pattern),
            dir_pattern: pattern(&self.config.dir_pattern),
            roots: self.roots.iter(),
            current: None,
            finished: false,
        }
    }

    fn entries<'a>(&'a self, root: &Path, dir_pattern: Option<NamePattern>) -> EntryIter<'a> {
        let mut walk_dir = WalkDir::new(root)
            .follow_links(self.config.follow_symlinks)
            .same_file_system(self.config.same_file_system)
            .sort_by_file_name();
        if let Some(depth) = self.config.max_depth {
            walk_dir = walk_dir.max_depth(depth);
        }

        Box::new(walk_dir.into_iter().filter_entry(move |entry| {
            if entry.depth() == 0 || !entry.file_type().is_dir() {
                return true;
            }
            match &dir_pattern {
                Some(pattern) if !pattern.accepts(entry.path()) => {
                    log::trace!(
                        "Skipping directory (pattern {:?}): {}",
                        pattern.source(),
                        entry.path().display()
                    );
                    false
                }
                _ => true,
            }
        }))
    }

    fn check_stop(&self) -> bool {
        match &self.token {
            Some(token) if token.is_stop_requested() => {
                token.acknowledge();
                log::info!("Walk stopped on request, continuing with files found so far");
                true
            }
            _ => false,
        }
    }

    /// Turn a walk entry into a discovered file, or `None` if it is skipped.
    fn process_entry(
        &self,
        entry: DirEntry,
        file_pattern: Option<&NamePattern>,
    ) -> Option<Result<DiscoveredFile, ScanError>> {
        let file_type = entry.file_type();
        if file_type.is_dir() {
            return None;
        }

        let path = entry.path();
        if file_type.is_symlink() {
            // Only seen when links are not followed; the target is only
            // resolved when the warning can be emitted
            if log::log_enabled!(log::Level::Warn) && is_dangling(path) {
                log::warn!("Bad symlink: {}", path.display());
            } else {
                log::trace!("Skipping symlink: {}", path.display());
            }
            return None;
        }

        if !file_type.is_file() {
            log::trace!("Skipping special file: {}", path.display());
            return None;
        }

        let metadata = match entry.metadata() {
            Ok(m) => m,
            Err(e) => return Some(Err(self.handle_walk_error(e))),
        };

        let size = metadata.len();
        if size == 0 {
            log::info!("Empty file: {}", path.display());
            return None;
        }

        if let Some(pattern) = file_pattern {
            if !pattern.accepts(path) {
                log::trace!(
                    "Skipping file (pattern {:?}): {}",
                    pattern.source(),
                    path.display()
                );
                return None;
            }
        }

        let (dev, ino, nlink) = identity_from_metadata(&metadata);
        Some(Ok(
            DiscoveredFile::new(entry.into_path(), size).with_identity(dev, ino, nlink)
        ))
    }

    /// Convert walkdir errors into scan errors.
    fn handle_walk_error(&self, error: walkdir::Error) -> ScanError {
        use std::io::ErrorKind;

        let path = error
            .path()
            .map_or_else(|| PathBuf::from("<unknown>"), Path::to_path_buf);

        if error.loop_ancestor().is_some() {
            log::warn!("Symlink loop: {}", path.display());
            return ScanError::SymlinkLoop(path);
        }

        match error.io_error().map(std::io::Error::kind) {
            Some(ErrorKind::PermissionDenied) => {
                log::warn!("Permission denied: {}", path.display());
                ScanError::PermissionDenied(path)
            }
            Some(ErrorKind::NotFound) => {
                // With link following, a dangling symlink surfaces here
                if path.symlink_metadata().is_ok_and(|m| m.file_type().is_symlink()) {
                    log::warn!("Bad symlink: {}", path.display());
                } else {
                    log::debug!("File not found (may have been deleted): {}", path.display());
                }
                ScanError::NotFound(path)
            }
            _ => {
                log::warn!("Walker error for {}: {}", path.display(), error);
                let source = error
                    .into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("walk error"));
                ScanError::Io { path, source }
            }
        }
    }
}

/// Iterator returned by [`Walker::walk`].
pub struct Walk<'a> {
    walker: &'a Walker,
    file_pattern: Option<NamePattern>,
    dir_pattern: Option<NamePattern>,
    roots: std::slice::Iter<'a, PathBuf>,
    current: Option<EntryIter<'a>>,
    finished: bool,
}

impl Iterator for Walk<'_> {
    type Item = Result<DiscoveredFile, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.finished {
                return None;
            }
            if self.walker.check_stop() {
                self.finished = true;
                return None;
            }

            let Some(entries) = self.current.as_mut() else {
                let Some(root) = self.roots.next() else {
                    self.finished = true;
                    return None;
                };
                log::debug!("Walking {}", root.display());
                self.current = Some(self.walker.entries(root, self.dir_pattern.clone()));
                continue;
            };

            match entries.next() {
                None => self.current = None,
                Some(Ok(entry)) => {
                    if let Some(item) = self.walker.process_entry(entry, self.file_pattern.as_ref())
                    {
                        return Some(item);
                    }
                }
                Some(Err(e)) => return Some(Err(self.walker.handle_walk_error(e))),
            }
        }
    }
}

/// Whether the symlink at `path` points nowhere.
fn is_dangling(path: &Path) -> bool {
    !path.exists()
}
