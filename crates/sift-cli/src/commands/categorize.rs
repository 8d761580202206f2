//! Waterfall evaluation commands

use std::path::Path;

use anyhow::{Context, Result};
use sift_core::{CategorizationResult, MatchSource, TransactionInput};

use super::truncate;
use crate::host::EngineHost;
use crate::store::Store;

pub fn cmd_categorize(
    store: Store,
    description: Option<&str>,
    file: Option<&Path>,
    json: bool,
) -> Result<()> {
    let mut host = EngineHost::attach(store)?;

    let transactions = match (description, file) {
        (Some(desc), None) => vec![TransactionInput {
            id: "ad-hoc".to_string(),
            description: Some(desc.to_string()),
            counterparty: None,
            counterparty_iban: None,
            variable_symbol: None,
            constant_symbol: None,
            specific_symbol: None,
            amount: 0.0,
            is_credit: false,
        }],
        (None, Some(path)) => read_batch(path)?,
        _ => anyhow::bail!("Provide either --description or --file"),
    };

    let results = host.categorize_batch(&transactions);

    if json {
        let paired: Vec<serde_json::Value> = transactions
            .iter()
            .zip(&results)
            .map(|(tx, result)| {
                serde_json::json!({
                    "id": tx.id,
                    "result": result,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&paired)?);
        return Ok(());
    }

    println!();
    println!("🧮 Categorization results");
    println!("   ────────────────────────────────────────────────────────────");
    for (tx, result) in transactions.iter().zip(&results) {
        let label = tx
            .description
            .as_deref()
            .or(tx.counterparty.as_deref())
            .unwrap_or("(no description)");
        println!("   {:12} {:40} {}", tx.id, truncate(label, 40), render(result));
    }

    let matched = results.iter().filter(|r| r.is_match()).count();
    let suggested = results
        .iter()
        .filter(|r| matches!(r, CategorizationResult::Suggestion { .. }))
        .count();
    println!();
    println!(
        "   {} transactions: {} matched, {} suggested, {} unresolved",
        results.len(),
        matched,
        suggested,
        results.len() - matched - suggested
    );

    Ok(())
}

fn read_batch(path: &Path) -> Result<Vec<TransactionInput>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read batch file {}", path.display()))?;
    let transactions: Vec<TransactionInput> =
        serde_json::from_str(&raw).context("Batch file must be a JSON array of transactions")?;
    Ok(transactions)
}

fn render(result: &CategorizationResult) -> String {
    match result {
        CategorizationResult::Match {
            category_id,
            source,
        } => {
            let via = match source {
                MatchSource::Rule { rule_name, .. } => format!("rule '{}'", rule_name),
                MatchSource::ExactMatch { tier, .. } => format!("learned ({})", tier),
                MatchSource::MachineLearning { confidence } => {
                    format!("classifier {:.0}%", confidence * 100.0)
                }
                MatchSource::Manual => "manual".to_string(),
            };
            format!("→ {} (via {})", category_id, via)
        }
        CategorizationResult::Suggestion {
            category_id,
            confidence,
        } => format!("? {} (suggested, {:.0}%)", category_id, confidence * 100.0),
        CategorizationResult::None => "· uncategorized".to_string(),
    }
}
