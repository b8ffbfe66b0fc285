//! Progress reporting using indicatif.
//!
//! The core and the extraction driver report through the [`ProgressCallback`]
//! trait; [`Progress`] renders those events as terminal progress bars for the
//! `extract` and `compare` phases.

use std::collections::HashMap;
use std::sync::Mutex;

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Receives progress updates from long-running phases.
///
/// Implementations are shared across worker threads.
pub trait ProgressCallback: Send + Sync {
    /// Called when a phase starts.
    ///
    /// # Arguments
    ///
    /// * `phase` - Name of the phase (`"extract"` or `"compare"`)
    /// * `total` - Total number of items to process
    fn on_phase_start(&self, phase: &str, total: usize);

    /// Called for each item processed.
    ///
    /// # Arguments
    ///
    /// * `current` - Number of items processed so far (1-based)
    /// * `path` - Path being processed, empty when not file-based
    fn on_progress(&self, current: usize, path: &str);

    /// Called when a phase completes.
    fn on_phase_end(&self, phase: &str);
}

/// Terminal progress bars, one per active phase.
pub struct Progress {
    multi: MultiProgress,
    bars: Mutex<HashMap<String, ProgressBar>>,
    active: Mutex<Option<String>>,
    quiet: bool,
}

impl Progress {
    /// Create a new progress reporter.
    ///
    /// # Arguments
    ///
    /// * `quiet` - If true, nothing is drawn.
    ///
    /// # Examples
    ///
    /// ```
    /// use simdupe::progress::Progress;
    ///
    /// let progress = Progress::new(true);
    /// ```
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        let multi = if quiet {
            MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
        } else {
            MultiProgress::new()
        };
        Self {
            multi,
            bars: Mutex::new(HashMap::new()),
            active: Mutex::new(None),
            quiet,
        }
    }

    fn style(phase: &str) -> ProgressStyle {
        let template = match phase {
            "extract" => {
                "[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg} (ETA: {eta})"
            }
            _ => "[{elapsed_precise}] [{bar:40.green/blue}] {pos}/{len} pairs {per_sec} {msg}",
        };
        ProgressStyle::with_template(template)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█>-")
    }

    fn label(phase: &str) -> &str {
        match phase {
            "extract" => "Fingerprinting",
            "compare" => "Comparing",
            other => other,
        }
    }
}

impl ProgressCallback for Progress {
    fn on_phase_start(&self, phase: &str, total: usize) {
        if self.quiet {
            return;
        }

        let pb = self.multi.add(ProgressBar::new(total as u64));
        pb.set_style(Self::style(phase));
        pb.set_message(Self::label(phase).to_string());
        if let Ok(mut bars) = self.bars.lock() {
            bars.insert(phase.to_string(), pb);
        }
        if let Ok(mut active) = self.active.lock() {
            *active = Some(phase.to_string());
        }
    }

    fn on_progress(&self, current: usize, path: &str) {
        if self.quiet {
            return;
        }

        let Ok(active) = self.active.lock() else {
            return;
        };
        let Some(phase) = active.as_deref() else {
            return;
        };
        if let Ok(bars) = self.bars.lock() {
            if let Some(pb) = bars.get(phase) {
                pb.set_position(current as u64);
                if !path.is_empty() {
                    pb.set_message(truncate_path(path, 30));
                }
            }
        }
    }

    fn on_phase_end(&self, phase: &str) {
        if self.quiet {
            return;
        }

        if let Some(pb) = self.bars.lock().ok().and_then(|mut bars| bars.remove(phase)) {
            pb.finish_with_message(format!("{} complete", Self::label(phase)));
        }
        if let Ok(mut active) = self.active.lock() {
            if active.as_deref() == Some(phase) {
                *active = None;
            }
        }
    }
}

/// Shorten a path to its file name when it is too long to display.
fn truncate_path(path: &str, max_len: usize) -> String {
    if path.chars().count() <= max_len {
        return path.to_string();
    }

    let file_name = std::path::Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let chars: Vec<char> = file_name.chars().collect();
    if chars.len() + 4 > max_len {
        let tail: String = chars[chars.len().saturating_sub(max_len - 3)..]
            .iter()
            .collect();
        return format!("...{}", tail);
    }

    format!(".../{}", file_name)
}
