//! Command handlers module.
//!
//! This module organizes the CLI command implementations into separate files:
//! - `organize.rs`: analyze, apply, organize, ungroup, rename
//! - `feedback.rs`: feedback conversations and the last-action record
//! - `state.rs`: rules, patterns, policy text and credential management
//! - `config.rs`: configuration display

mod config;
mod feedback;
mod organize;
mod state;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Subcommand;
use intellitab::config::IntellitabConfig;
use intellitab::llm::{LlmHttpConfig, OpenAiClient};
use intellitab::host::SnapshotHost;
use intellitab::{Error, FilesystemStore, StateStore, TabOrganizer};
use serde::Serialize;
use serde::de::DeserializeOwned;

pub use config::cmd_config;
pub use feedback::{cmd_feedback, cmd_last_action};
pub use organize::{cmd_analyze, cmd_apply, cmd_organize, cmd_rename, cmd_ungroup};
pub use state::{cmd_credential, cmd_patterns, cmd_rules, cmd_soul};

/// Result type shared by command handlers.
pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Rules subcommands.
#[derive(Subcommand)]
pub enum RulesAction {
    /// List rules in priority order.
    List,
    /// Replace the rule set with the JSON array in FILE.
    Import {
        /// JSON file holding an array of rules.
        file: PathBuf,
    },
    /// Write the rule set to FILE as JSON.
    Export {
        /// Destination file.
        file: PathBuf,
    },
    /// Restore the default rules.
    Reset,
}

/// Pattern store subcommands.
#[derive(Subcommand)]
pub enum PatternsAction {
    /// Print learned patterns, heaviest domains first.
    Show {
        /// Only show the N heaviest domains.
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Write the pattern store to FILE as JSON.
    Export {
        /// Destination file.
        file: PathBuf,
    },
    /// Replace the pattern store with the JSON object in FILE.
    Import {
        /// JSON file holding a domain -> group -> weight object.
        file: PathBuf,
    },
    /// Forget everything learned.
    Reset,
}

/// Policy text subcommands.
#[derive(Subcommand)]
pub enum SoulAction {
    /// Print the policy text.
    Show,
    /// Replace the policy text with the contents of FILE.
    Set {
        /// Text file with the new policy.
        file: PathBuf,
    },
    /// Restore the built-in policy text.
    Reset,
}

/// Credential subcommands.
#[derive(Subcommand)]
pub enum CredentialAction {
    /// Store the API key for the reasoning service.
    Set {
        /// The API key.
        key: String,
    },
    /// Remove the stored API key.
    Clear,
}

/// Opens the persisted state in the configured data directory.
pub fn open_state(config: &IntellitabConfig) -> Result<StateStore, Error> {
    let store = FilesystemStore::with_create(&config.data_dir)?;
    Ok(StateStore::new(Arc::new(store)))
}

/// Opens the window snapshot host.
pub fn open_host(config: &IntellitabConfig) -> Result<Arc<SnapshotHost>, Error> {
    Ok(Arc::new(SnapshotHost::open(config.tabs_path())?))
}

/// Builds an organizer wired to the configured reasoning service.
pub fn build_organizer(
    config: &IntellitabConfig,
    host: Arc<SnapshotHost>,
) -> Result<TabOrganizer, Error> {
    let mut client = OpenAiClient::new().with_http_config(LlmHttpConfig::from_config(&config.llm));
    if let Some(endpoint) = &config.llm.endpoint {
        client = client.with_endpoint(endpoint.clone());
    }
    if let Some(model) = &config.llm.model {
        client = client.with_model(model.clone());
    }

    Ok(TabOrganizer::new(open_state(config)?, host, Arc::new(client))
        .with_fallback_credential(config.llm.api_key.clone()))
}

/// Reads a JSON file.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, Error> {
    let contents = std::fs::read_to_string(path).map_err(|e| Error::OperationFailed {
        operation: "read_file".to_string(),
        cause: format!("{}: {e}", path.display()),
    })?;
    serde_json::from_str(&contents)
        .map_err(|e| Error::InvalidInput(format!("{}: {e}", path.display())))
}

/// Writes a value as pretty JSON.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), Error> {
    let json = to_pretty_json(value)?;
    std::fs::write(path, json + "\n").map_err(|e| Error::OperationFailed {
        operation: "write_file".to_string(),
        cause: format!("{}: {e}", path.display()),
    })
}

/// Serializes a value as pretty JSON.
pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> Result<String, Error> {
    serde_json::to_string_pretty(value).map_err(|e| Error::OperationFailed {
        operation: "serialize_output".to_string(),
        cause: e.to_string(),
    })
}
