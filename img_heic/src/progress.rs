//! Batch Progress Bar
//!
//! One bar for the sequential conversion loop, drawn on stderr so the
//! per-file lines on stdout stay clean.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

pub mod templates {
    pub const BATCH: &str = "{spinner:.green} {prefix:.cyan.bold} ▕{bar:35.green/black}▏ {percent:>3}% • {pos}/{len} • {elapsed_precise} • {msg}";
    pub const PROGRESS_CHARS: &str = "█▓░";
    pub const SPINNER_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";
}

pub struct BatchProgressBar {
    bar: ProgressBar,
}

impl BatchProgressBar {
    pub fn new(total: u64, prefix: &str) -> Self {
        let bar = ProgressBar::new(total);
        bar.set_style(
            ProgressStyle::default_bar()
                .template(templates::BATCH)
                .expect("Invalid template")
                .progress_chars(templates::PROGRESS_CHARS)
                .tick_chars(templates::SPINNER_CHARS),
        );
        bar.set_prefix(prefix.to_string());
        bar.set_draw_target(ProgressDrawTarget::stderr_with_hz(20));
        Self { bar }
    }

    /// A bar that never draws. Used in quiet mode and by tests.
    pub fn hidden(total: u64) -> Self {
        let bar = ProgressBar::new(total);
        bar.set_draw_target(ProgressDrawTarget::hidden());
        Self { bar }
    }

    pub fn inc(&self) {
        self.bar.inc(1);
    }

    pub fn set_message(&self, msg: impl Into<String>) {
        self.bar.set_message(msg.into());
    }

    /// Print a line above the bar without tearing it.
    pub fn println(&self, msg: &str) {
        self.bar.suspend(|| println!("{}", msg));
    }

    pub fn finish_with_message(&self, msg: &str) {
        self.bar.finish_with_message(msg.to_string());
    }
}

impl Drop for BatchProgressBar {
    fn drop(&mut self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}
