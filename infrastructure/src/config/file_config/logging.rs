//! Logging configuration from TOML (`[logging]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// Directory for per-session JSONL transcripts; disabled when unset
    pub conversation_log_dir: Option<PathBuf>,
    /// Directory for daily-rolling diagnostic logs; disabled when unset
    pub log_dir: Option<PathBuf>,
}
