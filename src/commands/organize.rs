//! Tab organization command handlers.
//!
//! Contains the implementation of `analyze`, `apply`, `organize`,
//! `ungroup` and `rename`.

use std::path::PathBuf;

use intellitab::config::IntellitabConfig;
use intellitab::host::GroupId;
use intellitab::{ClassificationResult, LastAction};

use super::{CommandResult, build_organizer, open_host, read_json, to_pretty_json, write_json};

/// Analyze command: classify the current window without changing it.
pub fn cmd_analyze(config: &IntellitabConfig, output: Option<PathBuf>) -> CommandResult {
    let organizer = build_organizer(config, open_host(config)?)?;
    let result = organizer.analyze_tabs()?;

    match output {
        Some(path) => {
            write_json(&path, &result)?;
            println!(
                "Wrote {} group(s) covering {} tab(s) to {}",
                result.groups.len(),
                result.grouped_count(),
                path.display()
            );
        },
        None => println!("{}", to_pretty_json(&result)?),
    }
    Ok(())
}

/// Apply command: create the groups described in a classification file.
pub fn cmd_apply(config: &IntellitabConfig, file: PathBuf) -> CommandResult {
    let result: ClassificationResult = read_json(&file)?;
    let organizer = build_organizer(config, open_host(config)?)?;
    let action = organizer.apply_result(&result)?;
    print_action(&action);
    Ok(())
}

/// Organize command: analyze then apply.
pub fn cmd_organize(config: &IntellitabConfig) -> CommandResult {
    let organizer = build_organizer(config, open_host(config)?)?;
    let result = organizer.analyze_tabs()?;
    let action = organizer.apply_result(&result)?;
    print_action(&action);
    Ok(())
}

/// Ungroup command: dissolve every group in the window.
pub fn cmd_ungroup(config: &IntellitabConfig) -> CommandResult {
    let organizer = build_organizer(config, open_host(config)?)?;
    let count = organizer.ungroup_all()?;
    if count == 0 {
        println!("No grouped tabs.");
    } else {
        println!("Ungrouped {count} tab(s).");
    }
    Ok(())
}

/// Rename command: label a group by hand and learn from it.
pub fn cmd_rename(config: &IntellitabConfig, group: i64, label: &str) -> CommandResult {
    let host = open_host(config)?;
    let group = GroupId::new(group);
    host.rename_group(group, label)?;

    let organizer = build_organizer(config, host)?;
    let learned = organizer.on_group_updated(group, Some(label))?;
    println!("Renamed group {group} to '{label}' ({learned} pattern observation(s) recorded).");
    Ok(())
}

fn print_action(action: &LastAction) {
    if action.groups_created.is_empty() {
        println!("Nothing to group.");
        return;
    }
    println!(
        "Organized {} tab(s) into {} group(s):",
        action.tabs_organized,
        action.groups_created.len()
    );
    for group in &action.groups_created {
        println!("  {} ({})", group.group_name, group.tab_count);
        for tab in &group.tabs {
            println!("    - {} [{}]", tab.title, tab.domain);
        }
    }
    if action.close_recommendations > 0 {
        println!(
            "{} tab(s) recommended for closing.",
            action.close_recommendations
        );
    }
}
