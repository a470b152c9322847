//! Progress reporting utilities using indicatif.
//!
//! This module provides the [`Progress`] struct which implements [`ProgressCallback`]
//! to display progress bars in the terminal for the download and hash phases.
//! [`NoProgress`] discards all updates.

use std::sync::Mutex;

use indicatif::{ProgressBar, ProgressStyle};

/// Progress callback for pipeline phases.
///
/// Implement this trait to receive progress updates while images are
/// downloaded and hashed.
pub trait ProgressCallback: Send + Sync {
    /// Called when a phase starts.
    ///
    /// # Arguments
    ///
    /// * `phase` - Name of the phase ("download" or "hash")
    /// * `total` - Total number of items to process
    fn on_phase_start(&self, phase: &str, total: usize);

    /// Called for each item processed.
    ///
    /// # Arguments
    ///
    /// * `current` - Current item number (1-based)
    /// * `item` - Record id being processed
    fn on_progress(&self, current: usize, item: &str);

    /// Called when an item has been transferred or hashed, with its size.
    fn on_item_completed(&self, _bytes: u64) {}

    /// Called when a phase completes.
    fn on_phase_end(&self, phase: &str);
}

/// A [`ProgressCallback`] that ignores every update.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_phase_start(&self, _phase: &str, _total: usize) {}
    fn on_progress(&self, _current: usize, _item: &str) {}
    fn on_phase_end(&self, _phase: &str) {}
}

/// Progress reporter using indicatif.
///
/// Shows one bar at a time; phases run strictly one after another.
pub struct Progress {
    bar: Mutex<Option<ProgressBar>>,
    bytes: Mutex<u64>,
    quiet: bool,
}

impl Progress {
    /// Create a new progress reporter.
    ///
    /// # Arguments
    ///
    /// * `quiet` - If true, no progress bars will be displayed.
    ///
    /// # Examples
    ///
    /// ```
    /// use imgdupe::progress::Progress;
    ///
    /// let progress = Progress::new(false);
    /// ```
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self {
            bar: Mutex::new(None),
            bytes: Mutex::new(0),
            quiet,
        }
    }

    fn style(phase: &str) -> ProgressStyle {
        let template = match phase {
            "download" => {
                "[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg} (ETA: {eta})"
            }
            _ => "[{elapsed_precise}] [{bar:40.green/blue}] {pos}/{len} ({percent}%) {msg}",
        };
        ProgressStyle::with_template(template)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█>-")
    }

    fn label(phase: &str) -> &'static str {
        match phase {
            "download" => "Downloading",
            "hash" => "Hashing",
            _ => "Working",
        }
    }
}

impl ProgressCallback for Progress {
    fn on_phase_start(&self, phase: &str, total: usize) {
        if self.quiet {
            return;
        }

        let pb = ProgressBar::new(total as u64);
        pb.set_style(Self::style(phase));
        pb.set_message(Self::label(phase));
        if let Ok(mut bytes) = self.bytes.lock() {
            *bytes = 0;
        }
        if let Ok(mut bar) = self.bar.lock() {
            *bar = Some(pb);
        }
    }

    fn on_progress(&self, current: usize, item: &str) {
        if self.quiet {
            return;
        }

        if let Ok(bar) = self.bar.lock() {
            if let Some(ref pb) = *bar {
                pb.set_position(current as u64);
                pb.set_message(truncate_item(item, 30));
            }
        }
    }

    fn on_item_completed(&self, bytes: u64) {
        if let Ok(mut total) = self.bytes.lock() {
            *total += bytes;
        }
    }

    fn on_phase_end(&self, phase: &str) {
        if self.quiet {
            return;
        }

        let bytes = self.bytes.lock().map(|b| *b).unwrap_or(0);
        if let Ok(mut bar) = self.bar.lock() {
            if let Some(pb) = bar.take() {
                pb.finish_with_message(format!(
                    "{} complete ({})",
                    Self::label(phase),
                    bytesize::ByteSize::b(bytes)
                ));
            }
        }
    }
}

/// Truncate an item label for display in the progress bar.
fn truncate_item(item: &str, max_len: usize) -> String {
    if item.chars().count() <= max_len {
        return item.to_string();
    }
    let tail: String = item
        .chars()
        .rev()
        .take(max_len.saturating_sub(3))
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("...{tail}")
}
