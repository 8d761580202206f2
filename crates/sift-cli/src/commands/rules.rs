//! Rule management commands

use anyhow::Result;
use sift_core::{validate_pattern, CategoryLookup, RuleKind, TransactionInput};

use super::truncate;
use crate::host::EngineHost;
use crate::store::Store;

pub fn cmd_rules_add(
    store: &Store,
    name: &str,
    kind: &str,
    pattern: &str,
    category: &str,
    priority: i32,
    stop: bool,
) -> Result<()> {
    let kind: RuleKind = kind.parse().map_err(|e: String| anyhow::anyhow!(e))?;
    if !store.contains(category)? {
        anyhow::bail!("Unknown category: {}", category);
    }

    // Reject patterns that would be silently skipped at engine load
    validate_pattern(kind, pattern)?;

    let id = store.add_rule(name, kind, pattern, category, priority, stop)?;
    println!(
        "Added rule {} '{}': {} '{}' → {} (priority {}{})",
        id,
        name,
        kind,
        pattern,
        category,
        priority,
        if stop { ", stop" } else { "" }
    );
    Ok(())
}

pub fn cmd_rules_list(store: &Store) -> Result<()> {
    let rules = store.list_rules()?;
    if rules.is_empty() {
        println!("No rules defined. Add one with 'sift rules add'.");
        return Ok(());
    }

    println!();
    println!("📋 Rules (lower priority evaluates first)");
    println!("   ────────────────────────────────────────────────────────────");
    let mut sorted = rules;
    sorted.sort_by_key(|r| r.priority);
    for rule in sorted {
        println!(
            "   [{:>3}] {:4} {:24} {:15} '{}' → {}{}{}",
            rule.priority,
            rule.id,
            truncate(&rule.name, 24),
            rule.kind,
            truncate(&rule.pattern, 24),
            rule.category_id,
            if rule.stop_processing { " [stop]" } else { "" },
            if rule.active { "" } else { " (inactive)" },
        );
    }
    Ok(())
}

pub fn cmd_rules_delete(store: &Store, id: i64) -> Result<()> {
    if store.delete_rule(id)? {
        println!("Deleted rule {}", id);
    } else {
        println!("No rule with id {}", id);
    }
    Ok(())
}

/// Dry-run a description against the stored rule set.
pub fn cmd_rules_test(store: Store, description: &str) -> Result<()> {
    let host = EngineHost::attach(store)?;
    let tx = TransactionInput {
        id: "dry-run".to_string(),
        description: Some(description.to_string()),
        counterparty: None,
        counterparty_iban: None,
        variable_symbol: None,
        constant_symbol: None,
        specific_symbol: None,
        amount: 0.0,
        is_credit: false,
    };

    let matches = host.engine().matching_rules(&tx);
    if matches.is_empty() {
        println!("No rules match '{}'", description);
        return Ok(());
    }

    println!("Rules matching '{}':", description);
    for rule in matches {
        println!(
            "   [{:>3}] {} ({} '{}') → {}{}",
            rule.priority,
            rule.name,
            rule.kind,
            rule.pattern,
            rule.category_id,
            if rule.stop_processing {
                " [stops processing]"
            } else {
                ""
            }
        );
    }
    Ok(())
}
