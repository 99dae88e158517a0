//! Progress reporting utilities using indicatif.
//!
//! The pipeline reports through the [`ProgressCallback`] trait; [`Progress`]
//! renders it as a spinner for the walk and bars for the filter passes and
//! the checksum stage.

use std::sync::Mutex;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// Progress callback for duplicate finding phases.
///
/// Phases reported by the pipeline, in order: `"walking"`, `"bytecompare"`,
/// `"fingerprint"`, `"checksum"`.
pub trait ProgressCallback: Send + Sync {
    /// Called when a phase starts.
    ///
    /// # Arguments
    ///
    /// * `phase` - Name of the phase
    /// * `total` - Total number of items to process (0 if unknown)
    fn on_phase_start(&self, phase: &str, total: usize);

    /// Called periodically while a phase runs.
    ///
    /// # Arguments
    ///
    /// * `current` - Items processed so far
    /// * `path` - Path being processed
    fn on_progress(&self, current: usize, path: &str);

    /// Called when an item has been hashed, providing its size.
    fn on_item_completed(&self, _bytes: u64) {}

    /// Called when a phase completes.
    fn on_phase_end(&self, phase: &str);

    /// Called to update the progress message.
    fn on_message(&self, _message: &str) {}
}

/// Which bar a phase is drawn on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Walking,
    Filter,
    Checksum,
}

impl Slot {
    fn of(phase: &str) -> Self {
        match phase {
            "walking" => Self::Walking,
            "checksum" => Self::Checksum,
            _ => Self::Filter,
        }
    }
}

/// Progress reporter using indicatif.
pub struct Progress {
    multi: MultiProgress,
    walking: Mutex<Option<ProgressBar>>,
    filter: Mutex<Option<ProgressBar>>,
    checksum: Mutex<Option<ProgressBar>>,
    quiet: bool,
}

impl Progress {
    /// Create a new progress reporter.
    ///
    /// # Arguments
    ///
    /// * `quiet` - If true, nothing is displayed.
    ///
    /// # Examples
    ///
    /// ```
    /// use dupsift::progress::Progress;
    ///
    /// let progress = Progress::new(true);
    /// ```
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self {
            multi: MultiProgress::new(),
            walking: Mutex::new(None),
            filter: Mutex::new(None),
            checksum: Mutex::new(None),
            quiet,
        }
    }

    fn slot(&self, slot: Slot) -> &Mutex<Option<ProgressBar>> {
        match slot {
            Slot::Walking => &self.walking,
            Slot::Filter => &self.filter,
            Slot::Checksum => &self.checksum,
        }
    }

    /// The bar of the most advanced active phase.
    fn active(&self) -> Option<ProgressBar> {
        [Slot::Checksum, Slot::Filter, Slot::Walking]
            .into_iter()
            .find_map(|slot| self.slot(slot).lock().ok().and_then(|bar| bar.clone()))
    }

    fn walking_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed_precise}] {pos} files")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
    }

    fn filter_style() -> ProgressStyle {
        ProgressStyle::with_template(
            "[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} groups {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█>-")
    }

    fn checksum_style() -> ProgressStyle {
        ProgressStyle::with_template(
            "[{elapsed_precise}] [{bar:40.green/blue}] {pos}/{len} ({percent}%) {msg} {per_sec} (ETA: {eta})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█>-")
    }
}

impl ProgressCallback for Progress {
    fn on_phase_start(&self, phase: &str, total: usize) {
        if self.quiet {
            return;
        }

        let slot = Slot::of(phase);
        let bar = match slot {
            Slot::Walking => {
                let bar = self.multi.add(ProgressBar::new_spinner());
                bar.set_style(Self::walking_style());
                bar.set_message("Walking");
                bar.enable_steady_tick(Duration::from_millis(100));
                bar
            }
            Slot::Filter => {
                let bar = self.multi.add(ProgressBar::new(total as u64));
                bar.set_style(Self::filter_style());
                bar.set_prefix(phase.to_string());
                bar.set_message(format!("Filtering by {phase}"));
                bar
            }
            Slot::Checksum => {
                let bar = self.multi.add(ProgressBar::new(total as u64));
                bar.set_style(Self::checksum_style());
                bar.set_message("Building checksums");
                bar
            }
        };

        if let Ok(mut current) = self.slot(slot).lock() {
            *current = Some(bar);
        }
    }

    fn on_progress(&self, current: usize, path: &str) {
        if self.quiet {
            return;
        }
        let checksum = self.checksum.lock().ok().and_then(|bar| bar.clone());
        if let Some(bar) = checksum {
            // position advances through on_item_completed
            bar.set_message(truncate_path(path, 30));
        } else if let Some(bar) = self.active() {
            bar.set_position(current as u64);
            bar.set_message(truncate_path(path, 30));
        }
    }

    fn on_item_completed(&self, _bytes: u64) {
        if self.quiet {
            return;
        }
        if let Ok(current) = self.checksum.lock() {
            if let Some(ref bar) = *current {
                bar.inc(1);
            }
        }
    }

    fn on_phase_end(&self, phase: &str) {
        if self.quiet {
            return;
        }

        let bar = self
            .slot(Slot::of(phase))
            .lock()
            .ok()
            .and_then(|mut current| current.take());
        if let Some(bar) = bar {
            let message = match Slot::of(phase) {
                Slot::Walking => "Walking complete".to_string(),
                Slot::Filter => format!("Filtering by {phase} complete"),
                Slot::Checksum => "Checksums complete".to_string(),
            };
            bar.finish_with_message(message);
        }
    }

    fn on_message(&self, message: &str) {
        if self.quiet {
            return;
        }
        if let Some(bar) = self.active() {
            bar.set_message(message.to_string());
        }
    }
}

/// Truncate a path for display in the progress bar.
fn truncate_path(path: &str, max_len: usize) -> String {
    if path.chars().count() <= max_len {
        return path.to_string();
    }

    let file_name = std::path::Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let count = file_name.chars().count();
    if count + 4 > max_len {
        let tail: String = file_name.chars().skip(count + 3 - max_len).collect();
        return format!("...{tail}");
    }

    format!(".../{file_name}")
}
