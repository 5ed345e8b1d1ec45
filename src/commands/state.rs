//! Persisted state command handlers.
//!
//! Contains the implementation of `rules`, `patterns`, `soul` and
//! `credential`.

use intellitab::config::IntellitabConfig;
use intellitab::{Error, PatternStore, Rule, RulesEngine};

use super::{
    CommandResult, CredentialAction, PatternsAction, RulesAction, SoulAction, open_state,
    read_json, write_json,
};

/// Rules command.
pub fn cmd_rules(config: &IntellitabConfig, action: RulesAction) -> CommandResult {
    let engine = RulesEngine::new(open_state(config)?);
    match action {
        RulesAction::List => print_rules(&engine.list()?),
        RulesAction::Import { file } => {
            let rules: Vec<Rule> = read_json(&file)?;
            engine.save(&rules)?;
            println!("Imported {} rule(s).", rules.len());
        },
        RulesAction::Export { file } => {
            let rules = engine.list()?;
            write_json(&file, &rules)?;
            println!("Exported {} rule(s) to {}", rules.len(), file.display());
        },
        RulesAction::Reset => {
            let rules = engine.reset()?;
            println!("Restored {} default rule(s).", rules.len());
        },
    }
    Ok(())
}

fn print_rules(rules: &[Rule]) {
    if rules.is_empty() {
        println!("No rules.");
        return;
    }
    for (position, rule) in rules.iter().enumerate() {
        let target = rule.group_name.as_deref().unwrap_or("-");
        let inert = if rule.target_group().is_none() {
            "  (inactive)"
        } else {
            ""
        };
        println!(
            "{:>3}. [{}] {:<11} {:<24} -> {target}{inert}",
            position + 1,
            rule.id,
            rule.kind.as_str(),
            rule.pattern
        );
    }
}

/// Patterns command.
pub fn cmd_patterns(config: &IntellitabConfig, action: PatternsAction) -> CommandResult {
    let state = open_state(config)?;
    match action {
        PatternsAction::Show { limit } => {
            let patterns = state.patterns()?;
            if patterns.is_empty() {
                println!("No learned patterns.");
                return Ok(());
            }
            let ranked = patterns.ranked_domains();
            for (domain, total) in ranked.into_iter().take(limit.unwrap_or(usize::MAX)) {
                println!("{domain} ({total})");
                if let Some(groups) = patterns.groups_for(domain) {
                    for (group, weight) in groups {
                        println!("    {group}: {weight}");
                    }
                }
            }
        },
        PatternsAction::Export { file } => {
            let patterns = state.patterns()?;
            write_json(&file, &patterns)?;
            println!(
                "Exported {} domain(s) to {}",
                patterns.len(),
                file.display()
            );
        },
        PatternsAction::Import { file } => {
            let patterns: PatternStore = read_json(&file)?;
            state.replace_patterns(&patterns)?;
            println!("Imported {} domain(s).", patterns.len());
        },
        PatternsAction::Reset => {
            state.reset_patterns()?;
            println!("Learned patterns cleared.");
        },
    }
    Ok(())
}

/// Soul command.
pub fn cmd_soul(config: &IntellitabConfig, action: SoulAction) -> CommandResult {
    let state = open_state(config)?;
    match action {
        SoulAction::Show => println!("{}", state.soul()?),
        SoulAction::Set { file } => {
            let text = std::fs::read_to_string(&file).map_err(|e| Error::OperationFailed {
                operation: "read_file".to_string(),
                cause: format!("{}: {e}", file.display()),
            })?;
            if text.trim().is_empty() {
                return Err(Error::InvalidInput(format!("{} is empty", file.display())).into());
            }
            state.save_soul(&text)?;
            println!("Policy text updated.");
        },
        SoulAction::Reset => {
            state.reset_soul()?;
            println!("Policy text restored to the default.");
        },
    }
    Ok(())
}

/// Credential command.
pub fn cmd_credential(config: &IntellitabConfig, action: CredentialAction) -> CommandResult {
    let state = open_state(config)?;
    match action {
        CredentialAction::Set { key } => {
            if key.trim().is_empty() {
                return Err(Error::InvalidInput("API key is empty".to_string()).into());
            }
            state.set_credential(key.trim())?;
            println!("API key saved.");
        },
        CredentialAction::Clear => {
            state.clear_credential()?;
            println!("API key removed.");
        },
    }
    Ok(())
}

