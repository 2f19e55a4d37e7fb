use std::time::{Duration, Instant};

use console::style;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::pipeline::events::{ProgressEvent, ScanState};
use crate::pipeline::phase::display_name;
use crate::pipeline::state::PhaseName;

/// Terminal rendering of a scan's progress events: one bar for the current
/// phase and a spinner line for elapsed time and status.
pub struct ScanProgress {
    multi: MultiProgress,
    phase_bar: Option<ProgressBar>,
    current_phase: Option<String>,
    status_bar: ProgressBar,
    start_time: Instant,
}

impl ScanProgress {
    /// `hidden` suppresses drawing, e.g. when stdout carries JSON output.
    pub fn new(hidden: bool) -> Self {
        let multi = if hidden {
            MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
        } else {
            MultiProgress::new()
        };

        let status_bar = multi.add(ProgressBar::new_spinner());
        status_bar.set_style(spinner_style("  {spinner:.cyan} {msg}"));
        status_bar.set_message("Initializing scan...");
        if !hidden {
            status_bar.enable_steady_tick(Duration::from_millis(120));
        }

        Self {
            multi,
            phase_bar: None,
            current_phase: None,
            status_bar,
            start_time: Instant::now(),
        }
    }

    pub fn handle_event(&mut self, event: &ProgressEvent) {
        match event.state {
            ScanState::Connecting => {
                self.status_bar.set_message(event.message.clone());
            }
            ScanState::Scanning | ScanState::Fetching => {
                self.enter_phase(&event.phase);
                if let Some(bar) = &self.phase_bar {
                    bar.set_position(event.progress as u64);
                }
                self.update_status(&event.message);
            }
            ScanState::Completed => {
                if let Some(bar) = self.phase_bar.take() {
                    bar.finish_with_message("All phases complete");
                }
                self.status_bar.finish_with_message(format!(
                    "{} {} ({})",
                    style("✓").green(),
                    event.message,
                    format_elapsed(self.start_time.elapsed()),
                ));
            }
            ScanState::Cancelled => {
                if let Some(bar) = self.phase_bar.take() {
                    bar.abandon_with_message("Cancelled");
                }
                self.status_bar.finish_with_message(format!("{} {}", style("■").yellow(), event.message));
            }
            ScanState::Error => {
                if let Some(bar) = self.phase_bar.take() {
                    bar.abandon_with_message("Failed");
                }
                self.status_bar.finish_with_message(format!("{} {}", style("✗").red(), event.message));
            }
        }
    }

    /// Swap the phase bar when the event belongs to a new phase.
    fn enter_phase(&mut self, phase: &str) {
        if self.current_phase.as_deref() == Some(phase) {
            return;
        }
        if let Some(bar) = self.phase_bar.take() {
            bar.finish_and_clear();
        }

        let bar = self.multi.insert_before(&self.status_bar, ProgressBar::new(100));
        bar.set_style(
            ProgressStyle::default_bar()
                .template("  {bar:30.cyan/dark_gray} {pos:>3}% | {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▓░"),
        );
        bar.set_message(phase_label(phase));
        self.phase_bar = Some(bar);
        self.current_phase = Some(phase.to_string());
    }

    fn update_status(&self, message: &str) {
        self.status_bar.set_message(format!(
            "{} | {}",
            format_elapsed(self.start_time.elapsed()),
            message
        ));
    }
}

fn spinner_style(template: &str) -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template(template)
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

fn phase_label(phase: &str) -> String {
    let known = [
        PhaseName::Spidering,
        PhaseName::RegisteringContext,
        PhaseName::ActiveScanning,
        PhaseName::FetchingResults,
    ];
    known
        .into_iter()
        .find(|p| p.as_str() == phase)
        .map(|p| display_name(p).to_string())
        .unwrap_or_else(|| phase.to_string())
}

fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    let mins = secs / 60;
    let remaining_secs = secs % 60;
    if mins > 0 {
        format!("{}m{}s", mins, remaining_secs)
    } else {
        format!("{}s", secs)
    }
}
