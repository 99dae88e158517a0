//! Full-content checksum stage.
//!
//! # Overview
//!
//! Every record that survived the filter passes gets a full BLAKE3 digest.
//! With a single worker the digests are computed in place, one record after
//! the other. With more workers, records are submitted to a [`WorkerPool`]:
//! jobs are buffered until the pool holds `workers * BATCH_PER_WORKER` of
//! them, then the whole batch is hashed on a rayon pool while the submitting
//! thread waits. The outcomes come back to the caller, which is the only
//! code that writes digests into the store.
//!
//! A stop request is honored between submissions: the record that was about
//! to be submitted is marked interrupted, submission stops, and the jobs
//! already buffered are still hashed before the stage returns.

use std::path::PathBuf;

use rayon::prelude::*;

use super::filter::STATUS_UPDATE_INTERVAL;
use super::store::{CandidateStore, RecordId};
use crate::progress::ProgressCallback;
use crate::scanner::{Hash, HashError, Hasher};
use crate::signal::CancellationToken;

/// Jobs buffered per worker before a batch is dispatched.
pub const BATCH_PER_WORKER: usize = 4;

/// Default number of hashing workers.
pub const DEFAULT_WORKERS: usize = 4;

/// Configuration for [`compute_checksums`].
#[derive(Debug, Clone)]
pub struct ChecksumConfig {
    /// Number of hashing workers. `1` hashes on the calling thread.
    pub workers: usize,
}

impl Default for ChecksumConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
        }
    }
}

impl ChecksumConfig {
    /// Set the number of workers (at least one).
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }
}

/// Statistics from the checksum stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChecksumStats {
    /// Records in the store on entry
    pub input: usize,
    /// Records that received a digest
    pub hashed: usize,
    /// Records whose content could not be read
    pub failed: usize,
    /// Bytes hashed
    pub bytes: u64,
    /// Whether a stop request ended submission early
    pub interrupted: bool,
}

/// Errors from the checksum stage.
#[derive(thiserror::Error, Debug)]
pub enum ChecksumError {
    /// Nothing survived filtering, so there is nothing to compare.
    #[error("No files left after filtering, no duplicates found")]
    NoCandidates,

    /// The hashing thread pool could not be created.
    #[error("Failed to create hashing thread pool: {0}")]
    PoolBuild(#[from] rayon::ThreadPoolBuildError),
}

/// One record handed to a worker.
///
/// The job carries everything the worker needs, so the store itself is
/// never shared with the pool.
#[derive(Debug, Clone)]
pub struct Job {
    /// Record the digest belongs to
    pub id: RecordId,
    /// File to hash
    pub path: PathBuf,
    /// File size, for throughput accounting
    pub size: u64,
}

/// Result of one [`Job`].
#[derive(Debug)]
pub struct JobOutcome {
    /// Record the digest belongs to
    pub id: RecordId,
    /// File size
    pub size: u64,
    /// Digest or read failure
    pub result: Result<Hash, HashError>,
}

/// Bounded pool of hashing workers.
pub struct WorkerPool {
    pool: rayon::ThreadPool,
    hasher: Hasher,
    capacity: usize,
    buffered: Vec<Job>,
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("workers", &self.pool.current_num_threads())
            .field("capacity", &self.capacity)
            .field("buffered", &self.buffered.len())
            .finish()
    }
}

impl WorkerPool {
    /// Create a pool of `workers` threads buffering
    /// `workers * BATCH_PER_WORKER` jobs.
    ///
    /// # Errors
    ///
    /// Returns [`ChecksumError::PoolBuild`] if the threads cannot be spawned.
    pub fn new(workers: usize) -> Result<Self, ChecksumError> {
        let workers = workers.max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("dupsift-hash-{i}"))
            .build()?;

        Ok(Self {
            pool,
            hasher: Hasher::new(),
            capacity: workers * BATCH_PER_WORKER,
            buffered: Vec::with_capacity(workers * BATCH_PER_WORKER),
        })
    }

    /// Maximum number of buffered jobs.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of jobs waiting for the next batch.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.buffered.len()
    }

    /// Buffer a job.
    ///
    /// When the buffer reaches capacity the batch is hashed and its outcomes
    /// returned; the call blocks until every job of the batch is done.
    pub fn submit(&mut self, job: Job) -> Option<Vec<JobOutcome>> {
        self.buffered.push(job);
        (self.buffered.len() >= self.capacity).then(|| self.flush())
    }

    /// Hash every buffered job and wait for all of them.
    pub fn flush(&mut self) -> Vec<JobOutcome> {
        if self.buffered.is_empty() {
            return Vec::new();
        }

        let jobs = std::mem::take(&mut self.buffered);
        log::trace!("Dispatching batch of {} jobs", jobs.len());

        let hasher = &self.hasher;
        self.pool.install(|| {
            jobs.into_par_iter()
                .map(|job| JobOutcome {
                    result: hasher.full_hash(&job.path),
                    id: job.id,
                    size: job.size,
                })
                .collect()
        })
    }
}

/// Compute the full digest of every record in `store`.
///
/// # Errors
///
/// Returns [`ChecksumError::NoCandidates`] if the store is empty on entry,
/// and [`ChecksumError::PoolBuild`] if pooled mode cannot start its threads.
/// Unreadable files are not errors: they keep `digest = None` and are
/// counted in [`ChecksumStats::failed`].
pub fn compute_checksums(
    store: &mut CandidateStore,
    config: &ChecksumConfig,
    token: Option<&CancellationToken>,
    progress: Option<&dyn ProgressCallback>,
) -> Result<ChecksumStats, ChecksumError> {
    if store.is_empty() {
        return Err(ChecksumError::NoCandidates);
    }

    let total = store.len();
    let mut stats = ChecksumStats {
        input: total,
        ..Default::default()
    };

    let mut pool = if config.workers > 1 {
        Some(WorkerPool::new(config.workers)?)
    } else {
        None
    };
    let hasher = Hasher::new();

    log::info!(
        "Building checksums for {} files on {} worker(s)",
        total,
        config.workers.max(1)
    );
    if let Some(callback) = progress {
        callback.on_phase_start("checksum", total);
    }

    let mut submitted = 0;
    let mut cursor = store.first();
    while let Some(id) = cursor {
        if token.is_some_and(CancellationToken::acknowledge) {
            if let Some(record) = store.get_mut(id) {
                record.mark_interrupted();
            }
            stats.interrupted = true;
            log::info!(
                "Checksums interrupted after {} of {} files",
                submitted,
                total
            );
            break;
        }

        let Some(record) = store.get(id) else {
            break;
        };
        let job = Job {
            id,
            path: record.path.clone(),
            size: record.size,
        };

        if submitted % STATUS_UPDATE_INTERVAL == 0 {
            let percent = submitted as f64 / total as f64 * 100.0;
            log::debug!(
                "Building checksums.. {:.1}% [{}/{}] - [{} bytes]",
                percent,
                submitted,
                total,
                job.size
            );
            if let Some(callback) = progress {
                callback.on_progress(submitted, &job.path.to_string_lossy());
            }
        }
        submitted += 1;
        cursor = store.next(id);

        match pool.as_mut() {
            Some(pool) => {
                if let Some(outcomes) = pool.submit(job) {
                    apply_outcomes(store, outcomes, &mut stats, progress);
                }
            }
            None => {
                let outcome = JobOutcome {
                    result: hasher.full_hash(&job.path),
                    id: job.id,
                    size: job.size,
                };
                apply_outcomes(store, vec![outcome], &mut stats, progress);
            }
        }
    }

    if let Some(pool) = pool.as_mut() {
        let outcomes = pool.flush();
        apply_outcomes(store, outcomes, &mut stats, progress);
    }

    if let Some(callback) = progress {
        callback.on_phase_end("checksum");
    }
    log::info!(
        "Checksums complete: {} hashed, {} failed, {} bytes",
        stats.hashed,
        stats.failed,
        stats.bytes
    );

    Ok(stats)
}

/// Write job outcomes into the store.
fn apply_outcomes(
    store: &mut CandidateStore,
    outcomes: Vec<JobOutcome>,
    stats: &mut ChecksumStats,
    progress: Option<&dyn ProgressCallback>,
) {
    for outcome in outcomes {
        let Some(record) = store.get_mut(outcome.id) else {
            continue;
        };
        match outcome.result {
            Ok(hash) => {
                record.digest = Some(hash);
                stats.hashed += 1;
                stats.bytes += outcome.size;
                if let Some(callback) = progress {
                    callback.on_item_completed(outcome.size);
                }
            }
            Err(e) => {
                log::warn!("Failed to hash {}: {}", record.path.display(), e);
                record.digest = None;
                stats.failed += 1;
            }
        }
    }
}
