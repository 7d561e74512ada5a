//! Terminal progress line for batch conversion

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Cells in the drawn bar
pub const BAR_WIDTH: usize = 40;

/// Percentage of `completed` over `total`, with two decimals
pub fn format_percentage(completed: u64, total: u64) -> String {
    let percentage = if total == 0 {
        100.0
    } else {
        completed as f64 / total as f64 * 100.0
    };
    format!("{:.2}%", percentage)
}

/// Draws `Progress: [████----] 50.00%` on stdout as jobs complete.
///
/// Hidden when stdout is not a terminal, so redirected output never receives
/// control characters.
#[derive(Clone)]
pub struct ProgressReporter {
    bar: ProgressBar,
    total: u64,
}

impl ProgressReporter {
    pub fn new(total: u64, enabled: bool) -> Self {
        if !enabled || total == 0 || !atty::is(atty::Stream::Stdout) {
            return Self::hidden(total);
        }

        let bar = ProgressBar::with_draw_target(Some(total), ProgressDrawTarget::stdout());
        let template = format!("Progress: [{{bar:{}}}] {{msg}}", BAR_WIDTH);
        let style = ProgressStyle::with_template(&template)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█-");
        bar.set_style(style);
        bar.set_message(format_percentage(0, total));
        Self { bar, total }
    }

    /// A reporter that tracks counts but never draws
    pub fn hidden(total: u64) -> Self {
        let bar = ProgressBar::hidden();
        bar.set_length(total);
        Self { bar, total }
    }

    /// Record one completed job
    pub fn inc(&self) {
        let completed = (self.bar.position() + 1).min(self.total);
        self.bar.set_message(format_percentage(completed, self.total));
        self.bar.set_position(completed);
        if completed == self.total {
            self.bar.finish();
        }
    }

    pub fn completed(&self) -> u64 {
        self.bar.position()
    }

    pub fn is_finished(&self) -> bool {
        self.bar.is_finished()
    }
}
