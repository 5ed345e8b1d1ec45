//! Config command handler.
//!
//! Contains the implementation of the `config` CLI command and
//! display helpers for configuration output.

use intellitab::config::IntellitabConfig;
use intellitab::llm::{LlmHttpConfig, OpenAiClient};
use intellitab::observability::LoggingConfig;

use super::{CommandResult, open_state};

/// Config command.
pub fn cmd_config(config: &IntellitabConfig, show: bool, verbose: bool) -> CommandResult {
    if !show {
        println!("Use 'intellitab config --show' to display the current configuration.");
        return Ok(());
    }

    println!("Current Configuration");
    println!("=====================");
    println!();
    println!("Data Directory: {}", config.data_dir.display());
    println!("Tabs File: {}", config.tabs_path().display());
    println!();

    let http = LlmHttpConfig::from_config(&config.llm);
    println!("LLM Configuration:");
    println!(
        "  Endpoint: {}",
        config
            .llm
            .endpoint
            .as_deref()
            .unwrap_or(OpenAiClient::DEFAULT_ENDPOINT)
    );
    println!(
        "  Model: {}",
        config
            .llm
            .model
            .as_deref()
            .unwrap_or(OpenAiClient::DEFAULT_MODEL)
    );
    println!("  Timeout: {}ms", http.timeout_ms);
    println!("  Connect Timeout: {}ms", http.connect_timeout_ms);
    println!("  Configured API Key: {}", set_or_not(config.llm.api_key.is_some()));
    let stored = open_state(config)?.credential()?.is_some();
    println!("  Stored API Key: {}", set_or_not(stored));
    println!();

    display_logging_config(config, verbose);
    Ok(())
}

fn display_logging_config(config: &IntellitabConfig, verbose: bool) {
    let logging = LoggingConfig::from_settings(Some(&config.logging), verbose);
    println!("Logging:");
    println!("  Format: {:?}", logging.format);
    println!("  Filter: {}", logging.filter);
    println!(
        "  File: {}",
        logging
            .file
            .as_ref()
            .map_or_else(|| "(stderr)".to_string(), |p| p.display().to_string())
    );
}

const fn set_or_not(set: bool) -> &'static str {
    if set { "(set)" } else { "(not set)" }
}
