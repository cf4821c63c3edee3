//! `[output]` section: how a finished panel is rendered

use panel_domain::OutputFormat;
use serde::{Deserialize, Serialize};

/// Rendering preferences. Command-line flags take precedence over both fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOutputConfig {
    /// Report format used when `--output` is not given
    pub format: Option<OutputFormat>,
    /// Colored terminal output; `false` disables colors for the whole process
    pub color: bool,
}

impl Default for FileOutputConfig {
    fn default() -> Self {
        Self {
            format: None,
            color: true,
        }
    }
}

impl FileOutputConfig {
    /// Pick the report format: the requested one, then this section's, then
    /// the domain default (summary).
    pub fn resolve_format(&self, requested: Option<OutputFormat>) -> OutputFormat {
        requested.or(self.format).unwrap_or_default()
    }
}
