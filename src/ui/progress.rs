use indicatif::{HumanDuration, ProgressBar};
use owo_colors::OwoColorize;
use std::time::{Duration, Instant};
use crate::ui::{theme, Icons};

/// Steady-tick spinner; hidden when stdout is not a terminal
pub struct Spinner {
    pb: ProgressBar,
    started: Instant,
}

impl Spinner {
    pub fn new(message: &str) -> Self {
        let pb = if console::Term::stdout().is_term() {
            let pb = ProgressBar::new_spinner();
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        } else {
            ProgressBar::hidden()
        };
        pb.set_message(message.to_string());
        Self { pb, started: Instant::now() }
    }

    pub fn set_message(&self, msg: &str) {
        self.pb.set_message(msg.to_string());
    }

    pub fn finish_with_message(&self, msg: &str) {
        self.pb.finish_with_message(msg.to_string());
    }

    /// Clear the spinner and print a one-line ingest summary
    pub fn finish_with_summary(&self, nodes: usize, edges: usize, packages: usize) {
        self.pb.finish_and_clear();
        println!(
            "{} {}",
            Icons::CHECK.style(theme().success.clone()),
            format!("Complete in {}", HumanDuration(self.started.elapsed())).style(theme().success.clone())
        );
        println!(
            "  {} {}  {} {}  {} {}",
            Icons::FILE.style(theme().info.clone()),
            nodes,
            Icons::LINK.style(theme().info.clone()),
            edges,
            Icons::PACKAGE.style(theme().info.clone()),
            packages
        );
    }
}
