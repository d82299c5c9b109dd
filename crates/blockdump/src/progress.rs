use indicatif::{ProgressBar, ProgressStyle};
use once_cell::sync::Lazy;

pub trait Tracker {
    fn step(&self, n: u64) -> &Self;
    fn finish(self);
}

const PB_STYLE: &str =
    "{spinner:.blue} {prefix:>8.cyan.bold} [{elapsed_precise}] {wide_bar:.cyan/blue} {pos}/{len} ({per_sec}, {eta}) {msg}";

const TICK: &str = "⠁⠂⠄⡀⢀⠠⠐⠈ ";

const PB_CHARS: &str = "█▓▒░  ";

static PB_TEMPLATE: Lazy<Option<ProgressStyle>> = Lazy::new(|| {
    ProgressStyle::with_template(PB_STYLE)
        .ok()
        .map(|style| style.tick_chars(TICK).progress_chars(PB_CHARS))
});

/// Counting bar on stderr; clones drive the same bar.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    pb:     ProgressBar,
    finish: Option<String>,
}

impl ProgressTracker {
    pub fn set_position(&self, pos: u64) {
        self.pb.set_position(pos);
    }

    pub fn set_message(&self, msg: impl Into<String>) {
        self.pb.set_message(msg.into());
    }

    pub fn abandon(self) {
        self.pb.abandon();
    }
}

impl Tracker for ProgressTracker {
    fn step(&self, n: u64) -> &Self {
        self.pb.inc(n);
        self
    }

    fn finish(self) {
        match self.finish {
            Some(msg) => self.pb.finish_with_message(msg),
            None => self.pb.finish(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProgressTrackerBuilder {
    len:    Option<u64>,
    prefix: Option<String>,
    finish: Option<String>,
    hidden: bool,
}

impl ProgressTrackerBuilder {
    pub fn with_len(mut self, len: u64) -> Self {
        self.len = Some(len);
        self
    }

    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = Some(prefix.to_string());
        self
    }

    pub fn with_finish(mut self, finish: &str) -> Self {
        self.finish = Some(finish.to_string());
        self
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    pub fn build(self) -> ProgressTracker {
        let pb = match (self.hidden, self.len) {
            (true, _) => ProgressBar::hidden(),
            (false, Some(len)) => ProgressBar::new(len),
            (false, None) => ProgressBar::new_spinner(),
        };
        if let Some(len) = self.len {
            pb.set_length(len);
        }
        let pb = match PB_TEMPLATE.as_ref() {
            Some(style) => pb.with_style(style.clone()),
            None => pb,
        };
        if let Some(prefix) = self.prefix {
            pb.set_prefix(prefix);
        }
        ProgressTracker {
            pb,
            finish: self.finish,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hidden_tracker_still_counts() {
        let tracker = ProgressTrackerBuilder::default().with_len(10).hidden(true).build();
        tracker.step(3).step(2);
        tracker.set_position(7);
        assert_eq!(tracker.pb.position(), 7);
        assert_eq!(tracker.pb.length(), Some(10));
        tracker.finish();
    }
}
