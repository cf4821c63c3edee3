//! Live event reporting while a panel runs

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use panel_application::ports::event_notifier::PanelEventNotifier;
use panel_domain::core::string::{collapse_whitespace, truncate};
use panel_domain::{ConsensusLevel, PanelEvent};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// Characters of each contribution echoed while the panel runs
const EXCERPT_CHARS: usize = 160;

/// One-line rendering of an event, shared by both reporters.
/// `None` for events that only drive the spinner.
fn event_line(event: &PanelEvent) -> Option<String> {
    match event {
        PanelEvent::PhaseChange { phase } => Some(format!(
            "\n{} {}",
            "->".cyan(),
            phase.display_name().bold()
        )),
        PanelEvent::RoundStart { round } => Some(format!("  {}", format!("Round {}", round).cyan())),
        PanelEvent::Statement {
            member_name,
            content,
            ..
        }
        | PanelEvent::Discussion {
            member_name,
            content,
            ..
        }
        | PanelEvent::Rebuttal {
            member_name,
            content,
            ..
        } => Some(format!(
            "  {} {}: {}",
            "v".green(),
            member_name.yellow().bold(),
            truncate(&collapse_whitespace(content), EXCERPT_CHARS).dimmed()
        )),
        PanelEvent::Consensus { result } => {
            let level = result.level.as_str().to_uppercase();
            let level = match result.level {
                ConsensusLevel::High => level.green().bold(),
                ConsensusLevel::Medium => level.yellow().bold(),
                ConsensusLevel::Low => level.red().bold(),
            };
            Some(format!(
                "  {} consensus ({:.0}%)",
                level,
                result.composite * 100.0
            ))
        }
        PanelEvent::Error { message } => Some(format!("{} {}", "x".red(), message.red())),
        PanelEvent::MemberSpeaking { .. } | PanelEvent::Complete { .. } => None,
    }
}

/// Reports panel events with a spinner for the member currently speaking
pub struct EventReporter {
    spinner: Mutex<Option<ProgressBar>>,
}

impl EventReporter {
    pub fn new() -> Self {
        Self {
            spinner: Mutex::new(None),
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg} {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn start_spinner(&self, message: String) {
        let mut spinner = self.spinner.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = spinner.take() {
            previous.finish_and_clear();
        }
        let pb = ProgressBar::new_spinner();
        pb.set_style(Self::spinner_style());
        pb.set_message(message);
        pb.enable_steady_tick(Duration::from_millis(100));
        *spinner = Some(pb);
    }

    fn clear_spinner(&self) {
        if let Some(pb) = self
            .spinner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            pb.finish_and_clear();
        }
    }
}

impl Default for EventReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl PanelEventNotifier for EventReporter {
    fn notify(&self, event: &PanelEvent) {
        match event {
            PanelEvent::MemberSpeaking { member_name, .. } => {
                self.start_spinner(format!("{} is speaking...", member_name));
            }
            _ => {
                self.clear_spinner();
                if let Some(line) = event_line(event) {
                    eprintln!("{}", line);
                }
            }
        }
    }
}

/// Plain line-per-event output (no spinner)
pub struct SimpleEventPrinter;

impl PanelEventNotifier for SimpleEventPrinter {
    fn notify(&self, event: &PanelEvent) {
        if let Some(line) = event_line(event) {
            eprintln!("{}", line);
        }
    }
}
