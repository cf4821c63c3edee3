//! Output formatter trait

use panel_domain::{OutputFormat, PanelSession};

/// Trait for formatting finished panel sessions
pub trait OutputFormatter {
    /// Full transcript followed by the consensus report
    fn format_full(&self, session: &PanelSession) -> String;

    /// Consensus report only (concise output)
    fn format_summary(&self, session: &PanelSession) -> String;

    /// Format as JSON
    fn format_json(&self, session: &PanelSession) -> String;

    /// Dispatch on the configured output format
    fn render(&self, session: &PanelSession, format: OutputFormat) -> String {
        match format {
            OutputFormat::Full => self.format_full(session),
            OutputFormat::Summary => self.format_summary(session),
            OutputFormat::Json => self.format_json(session),
        }
    }
}
