use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// Interval between spinner frames.
const TICK: Duration = Duration::from_millis(100);

/// Animated indicator shown while a slow git command runs.
///
/// The spinner draws to stderr and only when stderr is a terminal. It clears
/// itself on [`Spinner::finish`] or when dropped, so callers report the
/// outcome through [`crate::Output`] afterwards.
pub struct Spinner {
    /// Underlying progress bar.
    bar: ProgressBar,
}

impl Spinner {
    /// Start a visible spinner labelled `msg`, indented by `indent` spaces.
    pub(crate) fn start(msg: &str, indent: usize) -> Self {
        let template = format!("{}{{spinner}} {{msg}}", " ".repeat(indent));
        let style = ProgressStyle::with_template(&template)
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        let bar = ProgressBar::new_spinner().with_style(style);
        bar.set_message(msg.to_string());
        bar.enable_steady_tick(TICK);
        Self { bar }
    }

    /// A spinner that never draws.
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    /// Whether this spinner never draws.
    pub fn is_hidden(&self) -> bool {
        self.bar.is_hidden()
    }

    /// Replace the label.
    pub fn set_message(&self, msg: &str) {
        self.bar.set_message(msg.to_string());
    }

    /// Stop and erase the spinner.
    pub fn finish(self) {
        self.bar.finish_and_clear();
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}
