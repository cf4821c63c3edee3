//! Presentation layer for expert-panel
//!
//! This crate contains the CLI definition, output formatters
//! and live event reporters.

pub mod cli;
pub mod output;
pub mod progress;

// Re-export commonly used types
pub use cli::commands::{Cli, OutputArg};
pub use output::console::ConsoleFormatter;
pub use output::formatter::OutputFormatter;
pub use output::report::PanelReport;
pub use progress::reporter::{EventReporter, SimpleEventPrinter};
