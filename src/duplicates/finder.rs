//! Duplicate finder pipeline orchestrator.
//!
//! # Overview
//!
//! [`DuplicateFinder`] drives the stages in order:
//!
//! 1. **Walk** - discovered files are inserted into the [`CandidateStore`]
//!    in size order as they arrive
//! 2. **Size prefilter** - records with a unique size are dropped, and
//!    path-doubles are collapsed when the same inode can be reached twice
//! 3. **Byte pass** - first two and last two bytes within size groups
//! 4. **Fingerprint pass** - digests of a leading and a trailing slice
//! 5. **Checksum** - full BLAKE3 digest of every survivor
//! 6. **Grouping** - records sharing a digest form a [`DuplicateGroup`]
//!
//! A stop request (first Ctrl+C) is honored by whichever stage is running;
//! the later stages still run on what is left, so an interrupted scan still
//! returns a valid, if partial, result flagged in
//! [`ScanSummary::interrupted`].
//!
//! # Example
//!
//! ```no_run
//! use dupsift::duplicates::{DuplicateFinder, FinderConfig};
//! use std::path::PathBuf;
//!
//! let config = FinderConfig::default().with_threads(4);
//! let finder = DuplicateFinder::new(config);
//!
//! let (groups, summary) = finder.find_duplicates(&[PathBuf::from(".")]).unwrap();
//!
//! println!("Found {} duplicate groups", summary.duplicate_groups);
//! println!("Reclaimable space: {}", summary.reclaimable_display());
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytesize::ByteSize;

use super::checksum::{compute_checksums, ChecksumConfig, ChecksumError, DEFAULT_WORKERS};
use super::filter::{run_pass, ByteSignaturePass, FingerprintPass};
use super::groups::{group_by_digest, DuplicateGroup};
use super::prefilter::{prefilter, PrefilterOptions};
use super::record::CandidateRecord;
use super::store::CandidateStore;
use crate::progress::ProgressCallback;
use crate::scanner::{DiscoveredFile, ScanError, Walker, WalkerConfig};
use crate::signal::CancellationToken;

/// Configuration for the duplicate finder.
#[derive(Clone)]
pub struct FinderConfig {
    /// Number of hashing workers for the checksum stage.
    /// Default is 4 to prevent disk thrashing; 1 hashes on the calling thread.
    pub threads: usize,
    /// Walker configuration for directory traversal.
    pub walker_config: WalkerConfig,
    /// Optional token for cooperative cancellation.
    pub token: Option<CancellationToken>,
    /// Optional progress callback for reporting.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderConfig")
            .field("threads", &self.threads)
            .field("walker_config", &self.walker_config)
            .field("token", &self.token)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            threads: DEFAULT_WORKERS,
            walker_config: WalkerConfig::default(),
            token: None,
            progress_callback: None,
        }
    }
}

impl FinderConfig {
    /// Set the number of hashing workers (at least one).
    #[must_use]
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }

    /// Set the walker configuration.
    #[must_use]
    pub fn with_walker_config(mut self, config: WalkerConfig) -> Self {
        self.walker_config = config;
        self
    }

    /// Set the cancellation token.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.token = Some(token);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }
}

/// Summary statistics from a duplicate scan.
#[derive(Debug, Default)]
pub struct ScanSummary {
    /// Total number of files discovered
    pub total_files: usize,
    /// Total size of all discovered files in bytes
    pub total_size: u64,
    /// Files dropped because no other file had their size
    pub eliminated_by_size: usize,
    /// Paths dropped because they lead to an inode already seen
    pub path_doubles: usize,
    /// Files dropped by the byte-signature pass
    pub eliminated_by_bytes: usize,
    /// Files dropped by the fingerprint pass
    pub eliminated_by_fingerprint: usize,
    /// Files that received a full digest
    pub hashed_files: usize,
    /// Files whose full digest could not be computed
    pub failed_files: usize,
    /// Bytes read by the checksum stage
    pub bytes_hashed: u64,
    /// Number of confirmed duplicate groups
    pub duplicate_groups: usize,
    /// Total number of duplicate files (excluding one copy per group)
    pub duplicate_files: usize,
    /// Total space that can be reclaimed by removing duplicates
    pub reclaimable_space: u64,
    /// Duration of the entire scan
    pub scan_duration: Duration,
    /// Whether any stage stopped early on a stop request
    pub interrupted: bool,
    /// Errors encountered while walking
    pub scan_errors: Vec<ScanError>,
}

impl ScanSummary {
    /// Calculate the percentage of space that is wasted by duplicates.
    #[must_use]
    pub fn wasted_percentage(&self) -> f64 {
        if self.total_size == 0 {
            0.0
        } else {
            (self.reclaimable_space as f64 / self.total_size as f64) * 100.0
        }
    }

    /// Format reclaimable space as human-readable string.
    #[must_use]
    pub fn reclaimable_display(&self) -> String {
        ByteSize::b(self.reclaimable_space).to_string()
    }

    /// Format total size as human-readable string.
    #[must_use]
    pub fn total_size_display(&self) -> String {
        ByteSize::b(self.total_size).to_string()
    }
}

/// Errors that can occur during duplicate finding.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// No root was given.
    #[error("No path to scan")]
    NoRoots,

    /// The provided path does not exist.
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// The checksum stage could not run.
    #[error(transparent)]
    Checksum(#[from] ChecksumError),
}

/// Duplicate finder that orchestrates the multi-stage pipeline.
pub struct DuplicateFinder {
    config: FinderConfig,
}

impl DuplicateFinder {
    /// Create a new duplicate finder with the given configuration.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        Self { config }
    }

    /// Create a new duplicate finder with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(FinderConfig::default())
    }

    /// The finder's configuration.
    #[must_use]
    pub fn config(&self) -> &FinderConfig {
        &self.config
    }

    /// Find all duplicate files below `roots`.
    ///
    /// # Errors
    ///
    /// Returns [`FinderError`] if no root is given, a root does not exist,
    /// or the hashing thread pool cannot start. Unreadable files and
    /// directories are reported in [`ScanSummary::scan_errors`] instead.
    /// A stop request is not an error.
    pub fn find_duplicates(
        &self,
        roots: &[PathBuf],
    ) -> Result<(Vec<DuplicateGroup>, ScanSummary), FinderError> {
        let start_time = Instant::now();
        let mut summary = ScanSummary::default();

        if roots.is_empty() {
            return Err(FinderError::NoRoots);
        }
        if let Some(missing) = roots.iter().find(|root| !root.exists()) {
            return Err(FinderError::PathNotFound(missing.clone()));
        }

        let progress = self.config.progress_callback.as_deref();
        if let Some(callback) = progress {
            callback.on_phase_start("walking", 0);
        }

        let mut walker = Walker::new(roots.to_vec(), self.config.walker_config.clone());
        if let Some(ref token) = self.config.token {
            walker = walker.with_cancellation(token.clone());
        }
        log::info!(
            "Starting duplicate scan of {}",
            walker
                .roots()
                .iter()
                .map(|r| r.display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );

        let mut store = CandidateStore::new();
        for result in walker.walk() {
            match result {
                Ok(file) => {
                    summary.total_files += 1;
                    summary.total_size += file.size;
                    if let Some(callback) = progress {
                        callback.on_progress(summary.total_files, &file.path.to_string_lossy());
                    }
                    store.insert(CandidateRecord::from(file));
                }
                Err(e) => {
                    log::warn!("{}", e);
                    summary.scan_errors.push(e);
                }
            }
        }

        if let Some(callback) = progress {
            callback.on_phase_end("walking");
        }
        log::info!(
            "Found {} files ({} total)",
            summary.total_files,
            summary.total_size_display()
        );

        let options = PrefilterOptions::for_scan(
            roots.len(),
            self.config.walker_config.follow_symlinks,
        );
        let groups = self.run_pipeline(store, options, &mut summary)?;
        summary.scan_duration = start_time.elapsed();
        Ok((groups, summary))
    }

    /// Find duplicates among files collected elsewhere.
    ///
    /// Path-doubles are always collapsed since the origin of the list is
    /// unknown.
    ///
    /// # Errors
    ///
    /// Returns [`FinderError::Checksum`] if the hashing thread pool cannot
    /// start.
    pub fn find_duplicates_from_files(
        &self,
        files: Vec<DiscoveredFile>,
    ) -> Result<(Vec<DuplicateGroup>, ScanSummary), FinderError> {
        let start_time = Instant::now();
        let mut summary = ScanSummary::default();

        let mut store = CandidateStore::with_capacity(files.len());
        for file in files.into_iter().filter(|f| f.size > 0) {
            summary.total_files += 1;
            summary.total_size += file.size;
            store.insert(CandidateRecord::from(file));
        }

        log::info!(
            "Processing {} files ({})",
            summary.total_files,
            summary.total_size_display()
        );

        let options = PrefilterOptions {
            collapse_hardlinks: true,
        };
        let groups = self.run_pipeline(store, options, &mut summary)?;
        summary.scan_duration = start_time.elapsed();
        Ok((groups, summary))
    }

    /// Run every stage after discovery.
    fn run_pipeline(
        &self,
        mut store: CandidateStore,
        options: PrefilterOptions,
        summary: &mut ScanSummary,
    ) -> Result<Vec<DuplicateGroup>, FinderError> {
        let token = self.config.token.as_ref();
        let progress = self.config.progress_callback.as_deref();

        let size_stats = prefilter(&mut store, options, token);
        summary.eliminated_by_size = size_stats.removed;
        summary.path_doubles = size_stats.path_doubles;

        let byte_stats = run_pass(&mut store, &ByteSignaturePass::new(), token, progress);
        summary.eliminated_by_bytes = byte_stats.removed;

        let print_stats = run_pass(&mut store, &FingerprintPass::new(), token, progress);
        summary.eliminated_by_fingerprint = print_stats.removed;

        let checksum_config = ChecksumConfig::default().with_workers(self.config.threads);
        let checksum_stats = match compute_checksums(&mut store, &checksum_config, token, progress)
        {
            Ok(stats) => stats,
            Err(ChecksumError::NoCandidates) => {
                log::info!("No files left after filtering, no duplicates found");
                summary.interrupted = self.was_interrupted();
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };
        summary.hashed_files = checksum_stats.hashed;
        summary.failed_files = checksum_stats.failed;
        summary.bytes_hashed = checksum_stats.bytes;

        let groups = group_by_digest(store.into_records());
        summary.duplicate_groups = groups.len();
        summary.duplicate_files = groups.iter().map(DuplicateGroup::duplicate_count).sum();
        summary.reclaimable_space = groups.iter().map(DuplicateGroup::wasted_space).sum();
        summary.interrupted = self.was_interrupted();

        log::info!(
            "Scan complete: {} duplicate groups, {} duplicate files, {} reclaimable",
            summary.duplicate_groups,
            summary.duplicate_files,
            summary.reclaimable_display()
        );

        Ok(groups)
    }

    fn was_interrupted(&self) -> bool {
        self.config
            .token
            .as_ref()
            .is_some_and(CancellationToken::was_interrupted)
    }
}
