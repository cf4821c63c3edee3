//! Configuration file loading for expert-panel
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `PANEL_`-prefixed environment variables (`PANEL_PANEL__MAX_ROUNDS=3`)
//! 2. `--config <path>` specified file
//! 3. Project root: `./panel.toml` or `./.panel.toml`
//! 4. XDG config: `$XDG_CONFIG_HOME/expert-panel/config.toml`
//! 5. Fallback: `~/.config/expert-panel/config.toml`
//! 6. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, FileConfig, FileConsensusConfig, FileLoggingConfig, FileOutputConfig,
    FilePanelConfig, FileProviderConfig, MAX_TEMPERATURE,
};
pub use loader::ConfigLoader;
