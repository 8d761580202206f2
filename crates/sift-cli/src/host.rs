//! Engine host adapter
//!
//! Wires the engine to the SQLite store and carries the session-scoped
//! read-through cache: a transaction categorized once in this session is not
//! re-run through the waterfall. The cache is a caller-side optimization and
//! never engine state; any correction invalidates it wholesale, since a
//! single learn call can change the outcome for many cached transactions.

use std::collections::{BTreeMap, HashMap};

use anyhow::{Context, Result};
use tracing::debug;

use sift_core::{
    validate_category, CategorizationEngine, CategorizationResult, EngineStats, TrainingSample,
    TransactionInput,
};

use crate::store::Store;

pub struct EngineHost {
    engine: CategorizationEngine,
    store: Store,
    /// Session memo: transaction id → result
    cache: HashMap<String, CategorizationResult>,
}

impl EngineHost {
    /// Attach the engine to a host store: sync the rule cache and rehydrate
    /// the learned payee memory.
    pub fn attach(store: Store) -> Result<Self> {
        let engine = CategorizationEngine::new();
        engine.update_rules(store.list_rules()?);
        let loaded = engine
            .load_learned(&store)
            .context("Failed to load learned payees")?;
        debug!("Attached engine: {} learned entries loaded", loaded);

        Ok(Self {
            engine,
            store,
            cache: HashMap::new(),
        })
    }

    pub fn engine(&self) -> &CategorizationEngine {
        &self.engine
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Read-through categorization: cached results short-circuit the engine.
    pub fn categorize(&mut self, tx: &TransactionInput) -> CategorizationResult {
        if let Some(cached) = self.cache.get(&tx.id) {
            debug!("Session cache hit for transaction {}", tx.id);
            return cached.clone();
        }
        let result = self.engine.categorize(tx);
        self.cache.insert(tx.id.clone(), result.clone());
        result
    }

    /// Batch categorization through the cache, preserving input order. Only
    /// uncached transactions reach the engine.
    pub fn categorize_batch(&mut self, txs: &[TransactionInput]) -> Vec<CategorizationResult> {
        let mut results: Vec<Option<CategorizationResult>> = txs
            .iter()
            .map(|tx| self.cache.get(&tx.id).cloned())
            .collect();

        let misses: Vec<TransactionInput> = txs
            .iter()
            .zip(&results)
            .filter(|(_, r)| r.is_none())
            .map(|(tx, _)| tx.clone())
            .collect();

        if !misses.is_empty() {
            let fresh = self.engine.categorize_batch(&misses);
            for (tx, result) in misses.iter().zip(fresh) {
                self.cache.insert(tx.id.clone(), result);
            }
            for (slot, tx) in results.iter_mut().zip(txs) {
                if slot.is_none() {
                    *slot = self.cache.get(&tx.id).cloned();
                }
            }
        }

        results
            .into_iter()
            .zip(txs)
            .map(|(slot, tx)| slot.unwrap_or_else(|| self.engine.categorize(tx)))
            .collect()
    }

    /// Record a correction: validate the category against the store's
    /// catalogue, teach the engine, persist the new learned snapshot, queue
    /// the correction text for training, and drop the session cache.
    pub fn learn(
        &mut self,
        payee: Option<&str>,
        iban: Option<&str>,
        category_id: &str,
        text: Option<&str>,
    ) -> Result<()> {
        validate_category(&self.store, category_id)?;
        self.engine.learn(payee, iban, category_id)?;

        if let Some(text) = text {
            self.engine
                .queue_correction(TrainingSample::new(text, category_id));
            self.store.record_history(text, category_id)?;
        }

        self.persist_learned()?;
        self.cache.clear();
        Ok(())
    }

    /// Forget a payee. Returns whether anything was removed.
    pub fn forget(&mut self, payee: &str) -> Result<bool> {
        let removed = self.engine.forget(payee);
        if removed {
            self.persist_learned()?;
            self.cache.clear();
        }
        Ok(removed)
    }

    pub fn export_payees(&self) -> BTreeMap<String, String> {
        self.engine.export_learned_payees()
    }

    pub fn import_payees(&mut self, map: &BTreeMap<String, String>) -> Result<usize> {
        let applied = self.engine.import_learned_payees(map);
        self.persist_learned()?;
        self.cache.clear();
        Ok(applied)
    }

    /// Rebuild the classifier from the store's categorized history.
    pub fn retrain(&mut self) -> Result<usize> {
        use sift_core::TrainingSource;
        let samples = self.store.samples()?;
        self.engine.retrain_model(&samples)?;
        self.cache.clear();
        Ok(samples.len())
    }

    /// First-run bootstrap: additive training from categorized history.
    pub fn bootstrap(&mut self) -> Result<usize> {
        let consumed = self.engine.bootstrap_from(&self.store)?;
        self.cache.clear();
        Ok(consumed)
    }

    /// Apply queued correction texts to the classifier.
    pub fn train_pending(&mut self) -> usize {
        let applied = self.engine.train_pending();
        if applied > 0 {
            self.cache.clear();
        }
        applied
    }

    pub fn stats(&self) -> EngineStats {
        self.engine.stats()
    }

    fn persist_learned(&mut self) -> Result<()> {
        let entries = self.engine.learned_entries();
        self.store.replace_learned(&entries)
    }
}
