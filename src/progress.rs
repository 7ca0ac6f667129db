use crate::checks::CheckResultType;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::Mutex;
use std::time::Duration;

/// Receives completion events while checks run
pub trait ProgressSink: Send + Sync {
    /// Open a channel expecting `total` completions, one per checked package
    fn add_channel(&self, label: &str, total: u64) -> Box<dyn ProgressChannel>;
}

pub trait ProgressChannel: Send + Sync {
    /// One check finished with the given outcome
    fn advance(&self, result_type: CheckResultType);

    fn finish(&self);
}

/// Discards all progress events
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn add_channel(&self, _label: &str, _total: u64) -> Box<dyn ProgressChannel> {
        Box::new(NoProgress)
    }
}

impl ProgressChannel for NoProgress {
    fn advance(&self, _result_type: CheckResultType) {}

    fn finish(&self) {}
}

/// One progress bar per checker on stderr
pub struct TerminalProgress {
    multi: MultiProgress,
}

impl TerminalProgress {
    /// Create a new set of progress bars drawn on stderr
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::with_draw_target(ProgressDrawTarget::stderr()),
        }
    }
}

impl Default for TerminalProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for TerminalProgress {
    fn add_channel(&self, label: &str, total: u64) -> Box<dyn ProgressChannel> {
        let bar = self.multi.add(ProgressBar::new(total));
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{prefix} {msg:<34} {bar:30.cyan/blue} {pos}/{len}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        bar.set_message(label.to_string());
        Box::new(TerminalChannel {
            bar,
            worst: Mutex::new(None),
        })
    }
}

struct TerminalChannel {
    bar: ProgressBar,
    worst: Mutex<Option<CheckResultType>>,
}

impl ProgressChannel for TerminalChannel {
    fn advance(&self, result_type: CheckResultType) {
        if let Ok(mut worst) = self.worst.lock() {
            let updated = CheckResultType::get_worst(worst.iter().copied().chain([result_type]));
            *worst = updated;
            if let Some(worst) = updated {
                self.bar
                    .set_prefix(crate::report::render_markup(worst.icon(), console::colors_enabled_stderr()));
            }
        }
        self.bar.inc(1);
    }

    fn finish(&self) {
        self.bar.finish();
    }
}

/// Spinner shown while pip resolves the packages to install
pub fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr());
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}
