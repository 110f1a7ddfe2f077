//! taskweave - goal decomposition and dependency-ordered task execution
//!
//! CLI entry point.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{CommandFactory, FromArgMatches};
use eyre::{Context, Result};
use tracing::{debug, info, warn};

use taskweave::agent::{Agent, AgentMode};
use taskweave::cli::{Cli, Command, generate_after_help, get_log_path};
use taskweave::config::Config;
use taskweave::events::create_event_bus;
use taskweave::llm::create_client;
use taskweave::progress::spawn_progress_renderer;
use taskweave::tools::ToolRegistry;

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Logging is not up yet, so nothing here can log
    let log_path = get_log_path();
    let log_dir = log_path.parent().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));
    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Priority: CLI --log-level > config file > INFO
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cmd = Cli::command().after_help(generate_after_help());
    let cli = Cli::from_arg_matches(&cmd.get_matches())?;

    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    info!(provider = %config.llm.provider, model = %config.llm.model, "taskweave loaded config");

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::Run {
            query,
            mode,
            web,
            model,
            workdir,
            verbose,
        } => {
            debug!(%query, %mode, web, "main: matched Run command");
            let mut config = config;
            if let Some(model) = model {
                config.llm.model = model;
            }
            if let Some(workdir) = workdir {
                config.agent.workdir = workdir;
            }
            config.agent.verbose |= verbose;
            cmd_run(config, &query, mode, web).await
        }
        Command::Tools { web } => {
            debug!(web, "main: matched Tools command");
            cmd_tools(&config, web)
        }
    }
}

/// Run one goal and print the answer
async fn cmd_run(config: Config, query: &str, mode: AgentMode, web: bool) -> Result<()> {
    debug!(%query, %mode, web, "cmd_run: called");
    config.validate().context("Invalid configuration")?;

    let llm = create_client(&config.llm).context("Failed to create completion backend")?;
    let registry = ToolRegistry::standard(&config.search, web);
    let bus = create_event_bus();
    let renderer = spawn_progress_renderer(&bus, config.agent.verbose);

    let agent = Agent::new(llm, registry, config.agent.clone())
        .with_mode(mode)
        .with_event_bus(Arc::clone(&bus));

    let cancel = agent.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling run");
            cancel.cancel();
        }
    });

    let outcome = agent.run(query).await;
    if let Err(e) = renderer.await {
        warn!(error = %e, "Progress renderer ended abnormally");
    }

    match outcome {
        Ok(answer) => {
            println!("{}", answer);
            Ok(())
        }
        Err(e) => Err(eyre::Report::new(e).wrap_err(format!("Run failed for: {}", query))),
    }
}

/// List the tools a run would register
fn cmd_tools(config: &Config, web: bool) -> Result<()> {
    debug!(web, "cmd_tools: called");
    let registry = ToolRegistry::standard(&config.search, web);
    println!("{}", registry.descriptions(&[]));
    Ok(())
}
