//! Progress reporting using indicatif.
//!
//! Pipeline stages report through [`ProgressCallback`]; [`Progress`] renders
//! them as terminal bars on stderr. The stages are `walking` (a spinner, as
//! the total is unknown), `prehash` and `verify`.

use std::io::IsTerminal;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Progress callback for duplicate finding phases.
///
/// Implement this trait to receive progress updates during
/// the duplicate detection pipeline.
pub trait ProgressCallback: Send + Sync {
    /// Called when a phase starts.
    ///
    /// # Arguments
    ///
    /// * `phase` - Name of the phase ("walking", "prehash", "verify")
    /// * `total` - Total number of items to process, 0 if unknown
    fn on_phase_start(&self, phase: &str, total: usize);

    /// Called as items are processed.
    ///
    /// # Arguments
    ///
    /// * `current` - Items processed so far in this phase
    /// * `path` - Path being processed, empty if not meaningful
    fn on_progress(&self, current: usize, path: &str);

    /// Called when a unit of work finishes, with the bytes it covered.
    fn on_item_completed(&self, _bytes: u64) {}

    /// Called when a phase completes.
    fn on_phase_end(&self, phase: &str);

    /// Called to replace the progress message.
    fn on_message(&self, _message: &str) {}
}

struct ActiveBar {
    phase: String,
    bar: ProgressBar,
}

/// Progress reporter drawing indicatif bars on stderr.
///
/// Only one phase is active at a time. Nothing is drawn when quiet or when
/// stderr is not a terminal.
pub struct Progress {
    multi: MultiProgress,
    active: Mutex<Option<ActiveBar>>,
    bytes: AtomicU64,
    enabled: bool,
}

impl Progress {
    /// Create a new progress reporter.
    ///
    /// ```
    /// use dupelink::progress::Progress;
    ///
    /// let progress = Progress::new(true);
    /// assert!(!progress.is_enabled());
    /// ```
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        let enabled = !quiet && std::io::stderr().is_terminal();
        let multi = if enabled {
            MultiProgress::new()
        } else {
            MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
        };
        Self {
            multi,
            active: Mutex::new(None),
            bytes: AtomicU64::new(0),
            enabled,
        }
    }

    /// Whether bars are actually drawn.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn active(&self) -> MutexGuard<'_, Option<ActiveBar>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn walking_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed_precise}] {pos} files")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::with_template(
            "[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg} (ETA: {eta})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█>-")
    }

    fn start_message(phase: &str) -> &'static str {
        match phase {
            "walking" => "Walking directories",
            "prehash" => "Comparing prefixes",
            "verify" => "Verifying contents",
            _ => "Working",
        }
    }
}

impl ProgressCallback for Progress {
    fn on_phase_start(&self, phase: &str, total: usize) {
        if !self.enabled {
            return;
        }

        let bar = if phase == "walking" {
            let pb = self.multi.add(ProgressBar::new_spinner());
            pb.set_style(Self::walking_style());
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        } else {
            let pb = self.multi.add(ProgressBar::new(total as u64));
            pb.set_style(Self::bar_style());
            pb
        };
        bar.set_message(Self::start_message(phase));
        self.bytes.store(0, Ordering::Relaxed);

        if let Some(previous) = self.active().replace(ActiveBar {
            phase: phase.to_string(),
            bar,
        }) {
            previous.bar.finish_and_clear();
        }
    }

    fn on_progress(&self, current: usize, path: &str) {
        if !self.enabled {
            return;
        }
        if let Some(active) = self.active().as_ref() {
            active.bar.set_position(current as u64);
            if !path.is_empty() {
                active.bar.set_message(truncate_path(path, 40));
            }
        }
    }

    fn on_item_completed(&self, bytes: u64) {
        if !self.enabled {
            return;
        }
        let total = self.bytes.fetch_add(bytes, Ordering::Relaxed) + bytes;
        if let Some(active) = self.active().as_ref() {
            active
                .bar
                .set_message(format!("{} read", bytesize::ByteSize::b(total)));
        }
    }

    fn on_phase_end(&self, phase: &str) {
        let mut active = self.active();
        if active.as_ref().is_some_and(|a| a.phase == phase) {
            if let Some(done) = active.take() {
                done.bar.finish_and_clear();
            }
        }
    }

    fn on_message(&self, message: &str) {
        if let Some(active) = self.active().as_ref() {
            active.bar.set_message(message.to_string());
        }
    }
}

/// Shorten a path for display, keeping the file name.
fn truncate_path(path: &str, max_len: usize) -> String {
    if path.chars().count() <= max_len {
        return path.to_string();
    }

    let file_name = std::path::Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name_len = file_name.chars().count();

    if name_len + 4 > max_len {
        let keep = max_len.saturating_sub(3);
        let tail: String = file_name.chars().skip(name_len.saturating_sub(keep)).collect();
        return format!("...{tail}");
    }

    format!(".../{file_name}")
}
