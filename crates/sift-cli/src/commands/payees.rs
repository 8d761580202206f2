//! Learned-payee commands

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};

use crate::host::EngineHost;
use crate::store::Store;

pub fn cmd_learn(
    store: Store,
    payee: Option<&str>,
    iban: Option<&str>,
    category: &str,
    text: Option<&str>,
) -> Result<()> {
    let mut host = EngineHost::attach(store)?;
    host.learn(payee, iban, category, text)?;

    let key = match (payee, iban) {
        (Some(p), Some(i)) => format!("{} / {}", p, i),
        (Some(p), None) => p.to_string(),
        (None, Some(i)) => i.to_string(),
        (None, None) => unreachable!("learn validated at least one key"),
    };
    println!("Learned {} → {}", key, category);
    if text.is_some() {
        println!("Recorded correction text; fold it in with 'sift model retrain'");
    }
    Ok(())
}

pub fn cmd_forget(store: Store, payee: &str) -> Result<()> {
    let mut host = EngineHost::attach(store)?;
    if host.forget(payee)? {
        println!("Forgot learned entries for '{}'", payee);
    } else {
        println!("Nothing learned for '{}'", payee);
    }
    Ok(())
}

pub fn cmd_payees_list(store: Store) -> Result<()> {
    let host = EngineHost::attach(store)?;
    let mut entries = host.engine().learned_entries();
    if entries.is_empty() {
        println!("No learned payees yet. Record one with 'sift learn'.");
        return Ok(());
    }

    entries.sort_by(|a, b| a.tier.as_str().cmp(b.tier.as_str()).then(a.payee.cmp(&b.payee)));

    println!();
    println!("🧠 Learned payees");
    println!("   ────────────────────────────────────────────────────────────");
    for entry in entries {
        let key = match (&entry.payee, &entry.iban) {
            (Some(p), Some(i)) => format!("{} / {}", p, i),
            (Some(p), None) => p.clone(),
            (None, Some(i)) => i.clone(),
            (None, None) => continue,
        };
        println!(
            "   {:20} {:44} → {} ({})",
            entry.tier,
            key,
            entry.category_id,
            entry.updated_at.format("%Y-%m-%d")
        );
    }
    Ok(())
}

pub fn cmd_payees_export(store: Store, output: Option<&Path>) -> Result<()> {
    let host = EngineHost::attach(store)?;
    let exported = host.export_payees();
    let json = serde_json::to_string_pretty(&exported)?;

    match output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Exported {} learned entries to {}", exported.len(), path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

pub fn cmd_payees_import(store: Store, file: &Path) -> Result<()> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let map: BTreeMap<String, String> =
        serde_json::from_str(&raw).context("Import file must be a JSON object of key → category")?;

    let mut host = EngineHost::attach(store)?;
    let applied = host.import_payees(&map)?;
    println!("Imported {} of {} learned entries", applied, map.len());
    Ok(())
}
