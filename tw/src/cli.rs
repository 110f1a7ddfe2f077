//! CLI command definitions and subcommands

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::debug;

use crate::agent::AgentMode;
use crate::config::SearchConfig;

/// taskweave - goal decomposition and dependency-ordered task execution
#[derive(Parser)]
#[command(
    name = "tw",
    about = "Break a goal into tasks, run them in dependency order, and answer",
    version
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Answer a goal
    Run {
        /// The goal, in plain language
        query: String,

        /// How the goal is routed
        #[arg(short, long, value_enum, default_value_t = AgentMode::Orchestrated)]
        mode: AgentMode,

        /// Register web search even without credentials (reports what is missing)
        #[arg(short, long)]
        web: bool,

        /// Override the configured model
        #[arg(long)]
        model: Option<String>,

        /// Directory file tools are confined to
        #[arg(long)]
        workdir: Option<PathBuf>,

        /// Show tool invocations and warnings
        #[arg(short, long)]
        verbose: bool,
    },

    /// List the tools a run would have
    Tools {
        /// Include web search as if --web were given
        #[arg(short, long)]
        web: bool,
    },
}

/// Get the log file path
pub fn get_log_path() -> PathBuf {
    debug!("get_log_path: called");
    let path = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("taskweave")
        .join("logs")
        .join("taskweave.log");
    debug!(?path, "get_log_path: returning path");
    path
}

/// Generate the after_help text: web search readiness and the log path
pub fn generate_after_help() -> String {
    debug!("generate_after_help: called");
    let search = SearchConfig::default();
    let mut help = String::new();

    help.push_str("Web search:\n");
    for var in [&search.api_key_env, &search.engine_id_env] {
        let icon = if std::env::var(var).is_ok_and(|v| !v.is_empty()) {
            "\u{2705}"
        } else {
            "\u{274C}"
        };
        help.push_str(&format!("  {} {}\n", icon, var));
    }

    help.push('\n');
    help.push_str(&format!("Logs are written to: {}\n", get_log_path().display()));
    help
}
