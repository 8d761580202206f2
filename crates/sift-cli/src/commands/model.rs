//! Classifier training commands

use anyhow::Result;

use crate::host::EngineHost;
use crate::store::Store;

pub fn cmd_model_retrain(store: Store) -> Result<()> {
    let mut host = EngineHost::attach(store)?;
    let consumed = host.retrain()?;
    let stats = host.stats();
    println!(
        "Retrained from {} history samples: {} categories, {} tokens",
        consumed, stats.ml_classes, stats.ml_vocabulary
    );
    Ok(())
}

pub fn cmd_model_bootstrap(store: Store) -> Result<()> {
    let mut host = EngineHost::attach(store)?;
    let consumed = host.bootstrap()?;
    let stats = host.stats();
    println!(
        "Bootstrapped from {} history samples: {} categories, {} tokens",
        consumed, stats.ml_classes, stats.ml_vocabulary
    );
    if consumed == 0 {
        println!("History is empty; corrections recorded with 'sift learn --text' feed it.");
    }
    Ok(())
}
