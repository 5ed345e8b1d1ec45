//! Binary entry point for intellitab.
//!
//! This binary provides the CLI interface over a window snapshot file.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow needless_pass_by_value for command functions
#![allow(clippy::needless_pass_by_value)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use commands::{
    CommandResult, CredentialAction, PatternsAction, RulesAction, SoulAction, cmd_analyze,
    cmd_apply, cmd_config, cmd_credential, cmd_feedback, cmd_last_action, cmd_organize,
    cmd_patterns, cmd_rename, cmd_rules, cmd_soul, cmd_ungroup,
};
use intellitab::config::IntellitabConfig;
use intellitab::observability::{self, LoggingConfig};

/// IntelliTab - rule-first, LLM-assisted browser tab grouping.
#[derive(Parser)]
#[command(name = "intellitab")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Classify the current window and print the proposed groups.
    Analyze {
        /// Write the result to a file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Create the groups described in a classification file.
    Apply {
        /// JSON file produced by `analyze --output`.
        file: PathBuf,
    },

    /// Classify the current window and apply the result.
    Organize,

    /// Remove every tab from its group.
    Ungroup,

    /// Talk to the assistant about the last grouping.
    Feedback {
        /// The message to send.
        #[arg(required = true, num_args = 1..)]
        message: Vec<String>,

        /// JSON file holding the conversation so far; extended after the reply.
        #[arg(long)]
        history: Option<PathBuf>,
    },

    /// Label a tab group by hand, as in the browser.
    Rename {
        /// Group identifier.
        group_id: i64,

        /// New label.
        label: String,
    },

    /// Manage grouping rules.
    Rules {
        /// Rules action.
        #[command(subcommand)]
        action: RulesAction,
    },

    /// Manage learned domain patterns.
    Patterns {
        /// Patterns action.
        #[command(subcommand)]
        action: PatternsAction,
    },

    /// Manage the policy text.
    Soul {
        /// Soul action.
        #[command(subcommand)]
        action: SoulAction,
    },

    /// Show the most recently applied grouping.
    LastAction,

    /// Manage the reasoning service API key.
    Credential {
        /// Credential action.
        #[command(subcommand)]
        action: CredentialAction,
    },

    /// Show configuration.
    Config {
        /// Show current configuration.
        #[arg(short, long)]
        show: bool,
    },
}

/// Main entry point.
fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match IntellitabConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        },
    };

    let logging = LoggingConfig::from_settings(Some(&config.logging), cli.verbose);
    if let Err(e) = observability::init(&logging) {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    match run_command(cli, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            if e
                .downcast_ref::<intellitab::Error>()
                .is_some_and(intellitab::Error::is_missing_credential)
            {
                eprintln!("Hint: run `intellitab credential set <KEY>` or set INTELLITAB_API_KEY.");
            }
            ExitCode::FAILURE
        },
    }
}

/// Runs the selected command.
fn run_command(cli: Cli, config: &IntellitabConfig) -> CommandResult {
    match cli.command {
        Commands::Analyze { output } => cmd_analyze(config, output),
        Commands::Apply { file } => cmd_apply(config, file),
        Commands::Organize => cmd_organize(config),
        Commands::Ungroup => cmd_ungroup(config),
        Commands::Feedback { message, history } => cmd_feedback(config, &message, history),
        Commands::Rename { group_id, label } => cmd_rename(config, group_id, &label),
        Commands::Rules { action } => cmd_rules(config, action),
        Commands::Patterns { action } => cmd_patterns(config, action),
        Commands::Soul { action } => cmd_soul(config, action),
        Commands::LastAction => cmd_last_action(config),
        Commands::Credential { action } => cmd_credential(config, action),
        Commands::Config { show } => cmd_config(config, show, cli.verbose),
    }
}
