//! CLI command definitions

use clap::{Parser, ValueEnum};
use panel_domain::OutputFormat;
use std::path::PathBuf;

/// Output format for panel results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputArg {
    /// Full transcript followed by the consensus report
    Full,
    /// Consensus report only
    Summary,
    /// JSON output
    Json,
}

impl From<OutputArg> for OutputFormat {
    fn from(arg: OutputArg) -> Self {
        match arg {
            OutputArg::Full => OutputFormat::Full,
            OutputArg::Summary => OutputFormat::Summary,
            OutputArg::Json => OutputFormat::Json,
        }
    }
}

/// CLI arguments for expert-panel
#[derive(Parser, Debug)]
#[command(name = "expert-panel")]
#[command(author, version, about = "Expert Panel - Virtual specialists deliberate and measure their consensus")]
#[command(long_about = r#"
Expert Panel assembles a panel of virtual domain experts for a question,
runs them through a structured discussion and reports how far they agree.

The session has these phases:
1. Opening Statements: every expert states an initial position
2. Discussion: one or more rounds responding to each other
3. Rebuttals: final responses to the strongest counterpoints (optional)
4. Consensus Building: agreement is scored and a recommendation synthesized (optional)

Configuration files are loaded from (in priority order):
1. PANEL_* environment variables   e.g. PANEL_PANEL__MAX_ROUNDS=3
2. --config <path>                  Explicit config file
3. ./panel.toml                     Project-level config
4. ~/.config/expert-panel/config.toml   Global config

Example:
  expert-panel "What are the cardiovascular risks of diabetes medication X?"
  expert-panel --template policy_debate --rounds 3 "Should cities tax congestion?"
  expert-panel --expert economics --expert public_policy --route-only "Raise the minimum wage?"
"#)]
pub struct Cli {
    /// The question to put before the panel
    pub question: Option<String>,

    /// Background context shown to every panelist
    #[arg(long, value_name = "TEXT")]
    pub context: Option<String>,

    /// Restrict the panel to these expertise tags (can be specified multiple times)
    #[arg(short, long = "expert", value_name = "TAG")]
    pub experts: Vec<String>,

    /// Use this panel template instead of the routed one
    #[arg(short, long, value_name = "KEY")]
    pub template: Option<String>,

    /// Number of discussion rounds
    #[arg(short, long, value_name = "N")]
    pub rounds: Option<u32>,

    /// Skip the rebuttal phase
    #[arg(long)]
    pub no_rebuttals: bool,

    /// Skip consensus building
    #[arg(long)]
    pub no_consensus: bool,

    /// Output format (default: from config, else summary)
    #[arg(short, long, value_enum)]
    pub output: Option<OutputArg>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress live progress output
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration sources and the effective configuration, then exit
    #[arg(long)]
    pub show_config: bool,

    /// List the panel templates and exit
    #[arg(long)]
    pub list_templates: bool,

    /// Print the routing decision and exit without running the panel
    #[arg(long)]
    pub route_only: bool,
}
