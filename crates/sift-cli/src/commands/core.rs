//! Store initialization, stats and shared utilities

use std::path::Path;

use anyhow::{Context, Result};

use crate::host::EngineHost;
use crate::store::Store;

/// Open the host store, failing with a hint when it does not exist yet.
pub fn open_store(path: &Path) -> Result<Store> {
    if !path.exists() {
        anyhow::bail!(
            "Store not found at {}. Run 'sift init' first.",
            path.display()
        );
    }
    Store::open(path)
}

pub fn cmd_init(path: &Path) -> Result<()> {
    let store = Store::open(path).context("Failed to create store")?;
    let seeded = store.seed_default_categories()?;

    println!("Initialized store at {}", path.display());
    if seeded > 0 {
        println!("Seeded {} default categories:", seeded);
        for (id, name) in store.list_categories()? {
            println!("   {:16} {}", id, name);
        }
    }
    Ok(())
}

pub fn cmd_stats(store: Store) -> Result<()> {
    let history = store.history_count()?;
    let host = EngineHost::attach(store)?;
    let stats = host.stats();

    println!();
    println!("📊 Engine statistics");
    println!("   ──────────────────────────────");
    println!("   Active rules:       {}", stats.active_rules);
    println!("   Learned payees:     {}", stats.learned_payees);
    println!("   Trained categories: {}", stats.ml_classes);
    println!("   Vocabulary size:    {}", stats.ml_vocabulary);
    println!("   Stored history:     {}", history);
    println!();
    println!("   The classifier rebuilds from history: 'sift model bootstrap'");

    Ok(())
}
