//! Plain text output.
//!
//! One block per duplicate group, then a summary line:
//!
//! ```text
//! 3 files, 4.0 KiB each, blake3 5f1c...e2
//!   /home/user/a.jpg
//!   /home/user/backup/a.jpg
//!   /home/user/old/a.jpg
//!
//! 1 duplicate group, 2 duplicate files, 8.0 KiB reclaimable (12 files scanned)
//! ```

use std::io::Write;

use bytesize::ByteSize;

use crate::duplicates::{DuplicateGroup, ScanSummary};

/// Text renderer for scan results.
#[derive(Debug)]
pub struct TextOutput<'a> {
    groups: &'a [DuplicateGroup],
    summary: &'a ScanSummary,
}

impl<'a> TextOutput<'a> {
    /// Create a renderer over `groups` and `summary`.
    #[must_use]
    pub fn new(groups: &'a [DuplicateGroup], summary: &'a ScanSummary) -> Self {
        Self { groups, summary }
    }

    /// Write every group and the summary.
    ///
    /// # Errors
    ///
    /// Returns any error raised by `writer`.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for group in self.groups {
            writeln!(
                writer,
                "{} files, {} each, blake3 {}",
                group.len(),
                ByteSize::b(group.size),
                group.hash_hex()
            )?;
            for path in &group.files {
                writeln!(writer, "  {}", path.display())?;
            }
            writeln!(writer)?;
        }

        writeln!(writer, "{}", self.summary_line())?;
        if self.summary.interrupted {
            writeln!(writer, "Scan was interrupted, results are incomplete.")?;
        }
        Ok(())
    }

    /// One-line summary of the scan.
    #[must_use]
    pub fn summary_line(&self) -> String {
        let summary = self.summary;
        if summary.duplicate_groups == 0 {
            return format!(
                "No duplicates found ({} files scanned)",
                summary.total_files
            );
        }
        format!(
            "{} duplicate group{}, {} duplicate file{}, {} reclaimable ({} files scanned)",
            summary.duplicate_groups,
            plural(summary.duplicate_groups),
            summary.duplicate_files,
            plural(summary.duplicate_files),
            summary.reclaimable_display(),
            summary.total_files
        )
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}
