use indicatif::{ProgressBar, ProgressStyle};

/// Progress bar tracking for map generation
pub struct GenerationProgress {
    progress_bar: ProgressBar,
    restart_count: usize,
}

impl GenerationProgress {
    /// Creates a tracker over `cells` collapse steps; hidden unless `visible`
    pub fn new(cells: usize, visible: bool) -> Self {
        let pb = if visible {
            ProgressBar::new(cells as u64)
        } else {
            ProgressBar::hidden()
        };
        pb.set_style(
            ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} cells (Restarts: {msg})")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("##-"),
        );
        pb.set_message("0");

        Self {
            progress_bar: pb,
            restart_count: 0,
        }
    }

    /// Increment progress
    pub fn increment(&self) {
        self.progress_bar.inc(1);
    }

    /// Record a restart and rewind the bar
    pub fn record_restart(&mut self) {
        self.restart_count += 1;
        self.progress_bar.set_position(0);
        self.progress_bar.set_message(self.restart_count.to_string());
    }

    /// Get current restart count
    pub const fn restart_count(&self) -> usize {
        self.restart_count
    }

    /// Finish and clear progress display
    pub fn finish(self) {
        self.progress_bar.finish_and_clear();

        if self.restart_count > 0 {
            tracing::info!(restarts = self.restart_count, "completed after restarting");
        }
    }
}
