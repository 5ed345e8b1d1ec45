//! Feedback command handlers.

use std::path::PathBuf;

use intellitab::ChatTurn;
use intellitab::config::IntellitabConfig;

use super::{
    CommandResult, build_organizer, open_host, open_state, read_json, to_pretty_json, write_json,
};

/// Feedback command.
///
/// With `--history`, earlier turns are read from the file and the new
/// exchange is appended to it afterwards, so repeated calls continue the
/// same conversation.
pub fn cmd_feedback(
    config: &IntellitabConfig,
    message: &[String],
    history: Option<PathBuf>,
) -> CommandResult {
    let message = message.join(" ");
    let mut transcript: Vec<ChatTurn> = match &history {
        Some(path) if path.exists() => read_json(path)?,
        _ => Vec::new(),
    };
    transcript.push(ChatTurn::user(message));

    let organizer = build_organizer(config, open_host(config)?)?;
    let response = organizer.process_feedback(&transcript)?;

    println!("{}", response.response_message);
    if response.soul_update().is_some() {
        println!("\n(policy text updated)");
    }
    if let Some(deltas) = response.updated_patterns.as_ref().filter(|d| !d.is_empty()) {
        println!("(learned patterns updated for {} domain(s))", deltas.len());
    }

    if let Some(path) = history {
        transcript.push(ChatTurn::ai(response.response_message));
        write_json(&path, &transcript)?;
    }
    Ok(())
}

/// Last-action command.
pub fn cmd_last_action(config: &IntellitabConfig) -> CommandResult {
    match open_state(config)?.last_action()? {
        Some(action) => println!("{}", to_pretty_json(&action)?),
        None => println!("No grouping has been applied yet."),
    }
    Ok(())
}
