//! JSON report.
//!
//! The document has the groups first and the totals last, with the number
//! of files each stage removed under `totals.stages`:
//!
//! ```json
//! {
//!   "duplicates": [
//!     { "hash": "9f86d0...", "size": 4096, "files": ["/a/x.bin", "/b/x.bin"] }
//!   ],
//!   "totals": {
//!     "total_files": 812,
//!     "total_size": 73400320,
//!     "duplicate_groups": 1,
//!     "duplicate_files": 1,
//!     "reclaimable_space": 4096,
//!     "stages": {
//!       "size": 790, "path_doubles": 0, "bytes": 12,
//!       "fingerprint": 4, "hashed": 6, "unreadable": 0
//!     },
//!     "scan_errors": 0,
//!     "scan_duration_ms": 87,
//!     "interrupted": false,
//!     "exit_code": 0,
//!     "exit_code_name": "DS000"
//!   }
//! }
//! ```

use std::io::Write;

use serde::Serialize;

use crate::duplicates::{DuplicateGroup, ScanSummary};
use crate::error::ExitCode;

/// One group of identical files.
#[derive(Debug, Clone, Serialize)]
pub struct JsonGroup {
    /// Hex BLAKE3 digest
    pub hash: String,
    pub size: u64,
    pub files: Vec<String>,
}

impl From<&DuplicateGroup> for JsonGroup {
    fn from(group: &DuplicateGroup) -> Self {
        Self {
            hash: group.hash_hex(),
            size: group.size,
            files: group
                .files
                .iter()
                .map(|path| path.to_string_lossy().into_owned())
                .collect(),
        }
    }
}

/// Files removed, or processed, by each stage of the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JsonStages {
    /// Removed for having a unique size
    pub size: usize,
    /// Removed as a second path to an inode already listed
    pub path_doubles: usize,
    /// Removed by the edge-byte comparison
    pub bytes: usize,
    /// Removed by the head/tail fingerprint comparison
    pub fingerprint: usize,
    /// Digested in full
    pub hashed: usize,
    /// Could not be read for the full digest
    pub unreadable: usize,
}

/// Scan totals plus the process outcome.
#[derive(Debug, Clone, Serialize)]
pub struct JsonTotals {
    pub total_files: usize,
    pub total_size: u64,
    pub duplicate_groups: usize,
    pub duplicate_files: usize,
    pub reclaimable_space: u64,
    pub stages: JsonStages,
    pub scan_errors: usize,
    pub scan_duration_ms: u64,
    pub interrupted: bool,
    pub exit_code: i32,
    /// Prefix such as `DS130`
    pub exit_code_name: String,
}

impl JsonTotals {
    #[must_use]
    pub fn new(summary: &ScanSummary, exit_code: ExitCode) -> Self {
        Self {
            total_files: summary.total_files,
            total_size: summary.total_size,
            duplicate_groups: summary.duplicate_groups,
            duplicate_files: summary.duplicate_files,
            reclaimable_space: summary.reclaimable_space,
            stages: JsonStages {
                size: summary.eliminated_by_size,
                path_doubles: summary.path_doubles,
                bytes: summary.eliminated_by_bytes,
                fingerprint: summary.eliminated_by_fingerprint,
                hashed: summary.hashed_files,
                unreadable: summary.failed_files,
            },
            scan_errors: summary.scan_errors.len(),
            scan_duration_ms: u64::try_from(summary.scan_duration.as_millis()).unwrap_or(u64::MAX),
            interrupted: summary.interrupted,
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix().to_string(),
        }
    }
}

/// The whole JSON report.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    pub duplicates: Vec<JsonGroup>,
    pub totals: JsonTotals,
}

impl JsonOutput {
    /// Build the report for one scan.
    ///
    /// ```
    /// use dupsift::duplicates::{DuplicateGroup, ScanSummary};
    /// use dupsift::error::ExitCode;
    /// use dupsift::output::JsonOutput;
    /// use std::path::PathBuf;
    ///
    /// let groups = vec![DuplicateGroup::new(
    ///     [7u8; 32],
    ///     512,
    ///     vec![PathBuf::from("/x"), PathBuf::from("/y")],
    /// )];
    /// let report = JsonOutput::new(&groups, &ScanSummary::default(), ExitCode::Success);
    /// assert_eq!(report.duplicates[0].files, vec!["/x", "/y"]);
    /// ```
    #[must_use]
    pub fn new(groups: &[DuplicateGroup], summary: &ScanSummary, exit_code: ExitCode) -> Self {
        Self {
            duplicates: groups.iter().map(JsonGroup::from).collect(),
            totals: JsonTotals::new(summary, exit_code),
        }
    }

    /// Single-line JSON.
    ///
    /// # Errors
    ///
    /// Propagates any [`serde_json::Error`].
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Indented JSON.
    ///
    /// # Errors
    ///
    /// Propagates any [`serde_json::Error`].
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Serialize straight into `writer`, ending with a newline.
    ///
    /// # Errors
    ///
    /// Returns [`OutputError`] if encoding or writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W, pretty: bool) -> Result<(), OutputError> {
        if pretty {
            serde_json::to_writer_pretty(&mut *writer, self)?;
        } else {
            serde_json::to_writer(&mut *writer, self)?;
        }
        writeln!(writer)?;
        Ok(())
    }
}

/// Failure to emit a report.
#[derive(thiserror::Error, Debug)]
pub enum OutputError {
    #[error("Failed to encode report: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to write report: {0}")]
    Io(#[from] std::io::Error),
}
