//! Waterfall categorization engine
//!
//! Composes the three stages into a single decision per transaction:
//! user-defined rules first, then the learned payee memory, then the text
//! classifier gated by an accept threshold. The first confident stage
//! short-circuits the rest. The engine is stateless per call apart from its
//! two mutable stores (learned payees, classifier model) and the rule cache
//! the host re-syncs before each batch.

use std::collections::BTreeMap;
use std::sync::{Mutex, RwLock};

use tracing::debug;

use crate::classifier::TextClassifier;
use crate::error::{Error, Result};
use crate::learned::LearnedPayeeStore;
use crate::models::{
    CategorizationResult, CategorizationRule, EngineStats, LearnedPayeeEntry, MatchSource,
    TrainingSample, TransactionInput,
};
use crate::repo::{LearnedPayeeSource, TrainingSource};
use crate::rules::RuleSet;

/// Engine-level tunables, fixed at construction (not per call)
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// Classifier confidence at or above which an ML result is promoted from
    /// `Suggestion` to `Match`
    pub accept_threshold: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            accept_threshold: 0.7,
        }
    }
}

/// The categorization engine: rule cache, learned payee store and classifier
/// behind their own locks.
///
/// Reads (categorize, stats, export) take shared locks; corrections and
/// training take exclusive ones, so a batch never observes a half-written
/// learned tier or a half-swapped model.
pub struct CategorizationEngine {
    config: EngineConfig,
    rules: RwLock<RuleSet>,
    learned: RwLock<LearnedPayeeStore>,
    classifier: RwLock<TextClassifier>,
    /// Correction texts queued for the next caller-triggered training pass
    pending: Mutex<Vec<TrainingSample>>,
    /// Held for the duration of a retrain; a second retrain fails fast
    retrain_guard: Mutex<()>,
}

impl CategorizationEngine {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            rules: RwLock::new(RuleSet::default()),
            learned: RwLock::new(LearnedPayeeStore::new()),
            classifier: RwLock::new(TextClassifier::new()),
            pending: Mutex::new(Vec::new()),
            retrain_guard: Mutex::new(()),
        }
    }

    /// Replace the engine's rule cache with a fresh copy of the host's rules.
    pub fn update_rules(&self, rules: Vec<CategorizationRule>) {
        let compiled = RuleSet::compile(rules);
        debug!(
            "Rule cache updated: {} active rules ({} invalid skipped)",
            compiled.len(),
            compiled.invalid_count()
        );
        *self.rules.write().unwrap() = compiled;
    }

    /// Run the waterfall for one transaction.
    pub fn categorize(&self, tx: &TransactionInput) -> CategorizationResult {
        let rules = self.rules.read().unwrap();
        let learned = self.learned.read().unwrap();
        let classifier = self.classifier.read().unwrap();
        self.run_stages(&rules, &learned, &classifier, tx)
    }

    /// Categorize a batch, preserving input order.
    ///
    /// All stages are read-only against state loaded once up front, so the
    /// results are identical to calling `categorize` per transaction.
    pub fn categorize_batch(&self, txs: &[TransactionInput]) -> Vec<CategorizationResult> {
        let rules = self.rules.read().unwrap();
        let learned = self.learned.read().unwrap();
        let classifier = self.classifier.read().unwrap();

        txs.iter()
            .map(|tx| self.run_stages(&rules, &learned, &classifier, tx))
            .collect()
    }

    fn run_stages(
        &self,
        rules: &RuleSet,
        learned: &LearnedPayeeStore,
        classifier: &TextClassifier,
        tx: &TransactionInput,
    ) -> CategorizationResult {
        // 1. Rule stage
        if let Some(rule) = rules.first_match(tx) {
            return CategorizationResult::Match {
                category_id: rule.category_id.clone(),
                source: MatchSource::Rule {
                    rule_id: rule.id,
                    rule_name: rule.name.clone(),
                },
            };
        }

        // 2. Learned stage
        if let Some(hit) = learned.lookup(
            tx.counterparty.as_deref(),
            tx.counterparty_iban.as_deref(),
        ) {
            return CategorizationResult::Match {
                category_id: hit.category_id,
                source: MatchSource::ExactMatch {
                    payee: hit.payee,
                    tier: hit.tier,
                },
            };
        }

        // 3. ML stage, confidence-gated
        if let Some(classification) = classifier.classify(&tx.classification_text()) {
            if classification.confidence >= self.config.accept_threshold {
                return CategorizationResult::Match {
                    category_id: classification.category_id,
                    source: MatchSource::MachineLearning {
                        confidence: classification.confidence,
                    },
                };
            }
            if classification.confidence > 0.0 {
                return CategorizationResult::Suggestion {
                    category_id: classification.category_id,
                    confidence: classification.confidence,
                };
            }
        }

        debug!("No stage produced a signal for transaction {}", tx.id);
        CategorizationResult::None
    }

    /// Record a user correction in the learned payee store.
    ///
    /// Requires at least one of payee/IBAN. Never trains the classifier;
    /// queue the transaction text with `queue_correction` and apply it later
    /// with `train_pending` to keep learn latency bounded.
    pub fn learn(
        &self,
        payee: Option<&str>,
        iban: Option<&str>,
        category_id: &str,
    ) -> Result<()> {
        self.learned.write().unwrap().learn(payee, iban, category_id)
    }

    /// Drop every learned entry keyed by this payee. Returns whether
    /// anything was removed.
    pub fn forget(&self, payee: &str) -> bool {
        self.learned.write().unwrap().forget(payee)
    }

    /// Queue a correction text for the next training pass.
    pub fn queue_correction(&self, sample: TrainingSample) {
        self.pending.lock().unwrap().push(sample);
    }

    /// Additively train the classifier on all queued corrections. Returns
    /// how many samples were applied.
    pub fn train_pending(&self) -> usize {
        let samples: Vec<TrainingSample> = self.pending.lock().unwrap().drain(..).collect();
        if samples.is_empty() {
            return 0;
        }
        self.classifier.write().unwrap().train(&samples);
        samples.len()
    }

    /// Rebuild the classifier from scratch.
    ///
    /// The replacement model is built off to the side and published in one
    /// write-lock swap, so concurrent `categorize` calls see either the old
    /// model or the new one, never a partial rebuild. A retrain racing
    /// another retrain fails fast with `RetrainInFlight`.
    pub fn retrain_model(&self, samples: &[TrainingSample]) -> Result<()> {
        let _guard = self
            .retrain_guard
            .try_lock()
            .map_err(|_| Error::RetrainInFlight)?;

        let mut fresh = TextClassifier::new();
        fresh.train(samples);
        *self.classifier.write().unwrap() = fresh;
        Ok(())
    }

    /// Additive first-run bootstrap from already-categorized history.
    pub fn initialize_from_transactions(&self, samples: &[TrainingSample]) {
        self.classifier.write().unwrap().train(samples);
    }

    /// Bootstrap the classifier from the host's transaction repository.
    /// Returns the number of samples consumed.
    pub fn bootstrap_from(&self, source: &dyn TrainingSource) -> Result<usize> {
        let samples = source.samples()?;
        self.initialize_from_transactions(&samples);
        Ok(samples.len())
    }

    /// Rehydrate the learned payee store from the host's persistent store.
    /// Returns the number of entries loaded.
    pub fn load_learned(&self, source: &dyn LearnedPayeeSource) -> Result<usize> {
        let entries = source.entries()?;
        Ok(self.learned.write().unwrap().load(entries))
    }

    pub fn export_learned_payees(&self) -> BTreeMap<String, String> {
        self.learned.read().unwrap().export()
    }

    /// Restore learned payees from an exported map. Returns the number of
    /// entries applied.
    pub fn import_learned_payees(&self, map: &BTreeMap<String, String>) -> usize {
        self.learned.write().unwrap().import(map)
    }

    /// Snapshot of every learned entry, for host persistence.
    pub fn learned_entries(&self) -> Vec<LearnedPayeeEntry> {
        self.learned.read().unwrap().entries()
    }

    /// Dry-run a transaction against the rule cache only, for rule editors.
    pub fn matching_rules(&self, tx: &TransactionInput) -> Vec<CategorizationRule> {
        self.rules
            .read()
            .unwrap()
            .matches(tx)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Purely derived, read-only statistics.
    pub fn stats(&self) -> EngineStats {
        let classifier = self.classifier.read().unwrap();
        EngineStats {
            active_rules: self.rules.read().unwrap().len(),
            learned_payees: self.learned.read().unwrap().len(),
            ml_classes: classifier.class_count(),
            ml_vocabulary: classifier.vocabulary_size(),
        }
    }
}

impl Default for CategorizationEngine {
    fn default() -> Self {
        Self::new()
    }
}
