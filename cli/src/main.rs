//! CLI entrypoint for Expert Panel
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use panel_application::{
    AssemblePanelInput, AssemblePanelUseCase, InMemorySessionStore, NoEvents, PanelEventNotifier,
    PanelOrchestrator,
};
use panel_domain::{ExpertiseTag, PanelMember, PanelRouter, Question, persona_for};
use panel_infrastructure::{
    ConfigLoader, FileConfig, HttpLlmGateway, JsonlConversationLogger, UsageCounter,
};
use panel_presentation::{
    Cli, ConsoleFormatter, EventReporter, OutputFormatter, SimpleEventPrinter,
};
use std::io::IsTerminal;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())
            .map_err(|e| anyhow!("Failed to load configuration: {}", e))?
    };

    // Keep the guard alive so buffered file logs are flushed on exit
    let _log_guard = init_tracing(cli.verbose, config.logging.log_dir.as_deref());
    info!("Starting Expert Panel");

    if !config.output.color {
        colored::control::set_override(false);
    }

    apply_overrides(&cli, &mut config);
    config.validate().context("Invalid configuration")?;

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_ref());
        println!("\nEffective configuration:\n");
        println!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }

    let router = PanelRouter::default();
    if cli.list_templates {
        println!("{}", ConsoleFormatter::format_templates(&router.list_templates()));
        return Ok(());
    }

    let Some(text) = cli.question.as_deref() else {
        bail!("A question is required. See --help.");
    };
    let mut question = Question::new(text)?;
    if let Some(context) = &cli.context {
        question = question.with_context(context.clone());
    }

    let params = config.to_params();
    let mut input = AssemblePanelInput::new(question);
    if !cli.experts.is_empty() {
        input = input.with_available_experts(available_experts(&cli.experts));
    }
    if let Some(key) = &cli.template {
        input = input.with_template(key.clone());
    }

    let panel = AssemblePanelUseCase::new(router)
        .with_params(params.clone())
        .assemble(input)?;

    if cli.route_only {
        println!("{}", ConsoleFormatter::format_routing(&panel.routing));
        println!("Panel:");
        for member in &panel.config.members {
            println!("  - {}", member.label());
        }
        return Ok(());
    }

    // === Dependency Injection ===
    let gateway = Arc::new(HttpLlmGateway::from_config(&config.provider)?);
    let store = Arc::new(InMemorySessionStore::new());
    let usage = Arc::new(UsageCounter::new());

    let mut orchestrator = PanelOrchestrator::new(gateway, store)
        .with_params(params.clone())
        .with_usage_tracker(usage.clone());
    if let Some(dir) = &config.logging.conversation_log_dir
        && let Some(logger) = JsonlConversationLogger::in_dir(dir)
    {
        info!("Conversation log: {}", logger.path().display());
        orchestrator = orchestrator.with_conversation_logger(Arc::new(logger));
    }
    let orchestrator = Arc::new(orchestrator);

    let session_id = orchestrator.open(panel.config)?;

    // Ctrl-C or an exhausted time budget cancels the session
    let canceller = {
        let orchestrator = Arc::clone(&orchestrator);
        let session_id = session_id.clone();
        let budget = params.time_budget;
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => warn!("Interrupted, cancelling panel"),
                _ = budget_elapsed(budget) => warn!("Time budget exhausted, cancelling panel"),
            }
            orchestrator.cancel(&session_id);
        })
    };

    let notifier: Box<dyn PanelEventNotifier> = if cli.quiet {
        Box::new(NoEvents)
    } else if std::io::stderr().is_terminal() {
        Box::new(EventReporter::new())
    } else {
        Box::new(SimpleEventPrinter)
    };

    let outcome = orchestrator.run(&session_id, notifier.as_ref()).await;
    canceller.abort();
    let session = outcome?;

    let usage = usage.snapshot();
    info!(
        calls = usage.calls,
        prompt_chars = usage.prompt_chars,
        response_chars = usage.response_chars,
        "Generation usage"
    );

    let format = config.output.resolve_format(cli.output.map(Into::into));
    println!("{}", ConsoleFormatter.render(&session, format));

    Ok(())
}

/// Fold command-line flags over the loaded configuration
fn apply_overrides(cli: &Cli, config: &mut FileConfig) {
    if let Some(rounds) = cli.rounds {
        config.panel.max_rounds = rounds;
    }
    if cli.no_rebuttals {
        config.panel.enable_rebuttals = false;
    }
    if cli.no_consensus {
        config.panel.require_consensus = false;
    }
}

/// One generated persona per `--expert` tag
fn available_experts(tags: &[String]) -> Vec<PanelMember> {
    tags.iter()
        .map(|tag| persona_for(&ExpertiseTag::new(tag)))
        .collect()
}

async fn budget_elapsed(budget: Option<Duration>) {
    match budget {
        Some(budget) => tokio::time::sleep(budget).await,
        None => std::future::pending::<()>().await,
    }
}

/// Console logging from `-v`, overridden by `RUST_LOG`; optional daily file
fn init_tracing(verbose: u8, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "expert-panel.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(file_layer)
        .init();

    guard
}
