//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - The size-ordered candidate store
//! - Size prefiltering and path-double collapsing
//! - Byte-signature and fingerprint passes within size groups
//! - Full-content checksums on a bounded worker pool
//! - Duplicate group management
//!
//! [`DuplicateFinder`] runs all of it in order.

pub mod checksum;
pub mod filter;
pub mod finder;
pub mod groups;
pub mod prefilter;
pub mod record;
pub mod store;

pub use checksum::{
    compute_checksums, ChecksumConfig, ChecksumError, ChecksumStats, Job, JobOutcome, WorkerPool,
    BATCH_PER_WORKER,
};
pub use filter::{
    run_pass, ByteSignaturePass, FilterPass, FingerprintPass, PassStats, STATUS_UPDATE_INTERVAL,
};
pub use finder::{DuplicateFinder, FinderConfig, FinderError, ScanSummary};
pub use groups::{group_by_digest, DuplicateGroup};
pub use prefilter::{prefilter, PrefilterOptions, PrefilterStats};
pub use record::{CandidateRecord, Fingerprint, Signature};
pub use store::{CandidateStore, RecordId};
