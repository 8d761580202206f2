//! Integration tests for sift-core
//!
//! These tests exercise the full waterfall: rules → learned payees →
//! classifier, plus the correction loop (learn, queue, train) and the
//! host-facing load/export surfaces.

use sift_core::{
    CategorizationEngine, CategorizationResult, CategorizationRule, EngineConfig,
    LearnedPayeeEntry, LearnedPayeeSource, LearnedTier, MatchSource, Result, RuleKind,
    TrainingSample, TrainingSource, TransactionInput,
};

fn rule(
    id: i64,
    kind: RuleKind,
    pattern: &str,
    category: &str,
    priority: i32,
    stop: bool,
) -> CategorizationRule {
    CategorizationRule {
        id,
        name: format!("{}-{}", kind, pattern.to_lowercase()),
        kind,
        pattern: pattern.to_string(),
        category_id: category.to_string(),
        priority,
        active: true,
        stop_processing: stop,
    }
}

fn transaction(id: &str) -> TransactionInput {
    TransactionInput {
        id: id.to_string(),
        description: None,
        counterparty: None,
        counterparty_iban: None,
        variable_symbol: None,
        constant_symbol: None,
        specific_symbol: None,
        amount: -100.0,
        is_credit: false,
    }
}

fn grocery_history() -> Vec<TrainingSample> {
    vec![
        TrainingSample::new("ALBERT SUPERMARKET PRAHA", "groceries"),
        TrainingSample::new("TESCO STORES BRNO", "groceries"),
        TrainingSample::new("NETFLIX.COM subscription", "entertainment"),
        TrainingSample::new("SPOTIFY premium", "entertainment"),
    ]
}

// =============================================================================
// Waterfall Scenarios
// =============================================================================

#[test]
fn test_netflix_contains_rule_scenario() {
    let engine = CategorizationEngine::new();
    engine.update_rules(vec![rule(
        1,
        RuleKind::Contains,
        "NETFLIX",
        "entertainment",
        1,
        true,
    )]);

    let mut tx = transaction("t1");
    tx.description = Some("NETFLIX.COM".to_string());
    tx.amount = -399.0;

    match engine.categorize(&tx) {
        CategorizationResult::Match {
            category_id,
            source: MatchSource::Rule { rule_name, .. },
        } => {
            assert_eq!(category_id, "entertainment");
            assert_eq!(rule_name, "contains-netflix");
        }
        other => panic!("expected rule match, got {:?}", other),
    }
}

#[test]
fn test_iban_only_learned_scenario() {
    let engine = CategorizationEngine::new();
    engine
        .learn(None, Some("CZ6508000000192000145399"), "groceries")
        .unwrap();

    let mut tx = transaction("t1");
    tx.counterparty_iban = Some("CZ6508000000192000145399".to_string());

    match engine.categorize(&tx) {
        CategorizationResult::Match {
            category_id,
            source: MatchSource::ExactMatch { tier, .. },
        } => {
            assert_eq!(category_id, "groceries");
            assert_eq!(tier, LearnedTier::IbanOnly);
        }
        other => panic!("expected exact match, got {:?}", other),
    }
}

#[test]
fn test_rule_stage_beats_loaded_stores() {
    let engine = CategorizationEngine::new();
    engine.update_rules(vec![rule(
        7,
        RuleKind::Contains,
        "ALBERT",
        "shopping",
        5,
        false,
    )]);
    engine.learn(Some("ALBERT"), None, "groceries").unwrap();
    engine.initialize_from_transactions(&grocery_history());

    let mut tx = transaction("t1");
    tx.description = Some("ALBERT SUPERMARKET".to_string());
    tx.counterparty = Some("ALBERT".to_string());

    // Rules win even though both later stages would resolve to groceries
    match engine.categorize(&tx) {
        CategorizationResult::Match {
            category_id,
            source: MatchSource::Rule { .. },
        } => assert_eq!(category_id, "shopping"),
        other => panic!("expected rule match, got {:?}", other),
    }
}

#[test]
fn test_exact_payee_iban_learned_match() {
    let engine = CategorizationEngine::new();
    engine
        .learn(Some("Rohlik.cz"), Some("CZ1111"), "groceries")
        .unwrap();

    let mut tx = transaction("t1");
    tx.counterparty = Some("ROHLIK.CZ".to_string());
    tx.counterparty_iban = Some("CZ1111".to_string());

    match engine.categorize(&tx) {
        CategorizationResult::Match {
            category_id,
            source: MatchSource::ExactMatch { payee, tier },
        } => {
            assert_eq!(category_id, "groceries");
            assert_eq!(payee.as_deref(), Some("rohlik.cz"));
            assert_eq!(tier, LearnedTier::PayeeIban);
        }
        other => panic!("expected exact match, got {:?}", other),
    }
}

#[test]
fn test_partial_key_fallback_after_full_learn() {
    let engine = CategorizationEngine::new();
    engine.learn(Some("ACME"), Some("CZ1234"), "cat1").unwrap();

    // Same payee, different IBAN resolves via the payee-only tier
    let mut tx = transaction("t1");
    tx.counterparty = Some("ACME".to_string());
    tx.counterparty_iban = Some("CZ5678".to_string());

    match engine.categorize(&tx) {
        CategorizationResult::Match {
            category_id,
            source: MatchSource::ExactMatch { tier, .. },
        } => {
            assert_eq!(category_id, "cat1");
            assert_eq!(tier, LearnedTier::PayeeOnly);
        }
        other => panic!("expected exact match, got {:?}", other),
    }
}

#[test]
fn test_forget_then_categorize_returns_none() {
    let engine = CategorizationEngine::new();
    engine.learn(Some("ACME"), None, "cat1").unwrap();
    assert!(engine.forget("acme"));

    let mut tx = transaction("t1");
    tx.counterparty = Some("ACME".to_string());
    assert_eq!(engine.categorize(&tx), CategorizationResult::None);
}

// =============================================================================
// Correction Loop
// =============================================================================

#[test]
fn test_correction_loop_none_then_learn_then_match() {
    let engine = CategorizationEngine::new();

    let mut tx = transaction("t1");
    tx.description = Some("ROHLIK.CZ objednavka 8812".to_string());
    tx.counterparty = Some("Rohlik.cz".to_string());

    // Nothing knows this payee yet
    assert_eq!(engine.categorize(&tx), CategorizationResult::None);

    // User corrects; the correction text is queued, not trained inline
    engine.learn(Some("Rohlik.cz"), None, "groceries").unwrap();
    engine.queue_correction(TrainingSample::new(tx.classification_text(), "groceries"));

    // The learned store answers immediately
    assert!(engine.categorize(&tx).is_match());

    // After the caller-triggered training pass, a fresh payee with similar
    // text gets at least a suggestion from the classifier
    assert_eq!(engine.train_pending(), 1);
    let mut fresh = transaction("t2");
    fresh.description = Some("objednavka rohlik".to_string());
    let result = engine.categorize(&fresh);
    assert_eq!(result.category_id(), Some("groceries"));
}

#[test]
fn test_learn_requires_a_key() {
    let engine = CategorizationEngine::new();
    assert!(engine.learn(None, None, "cat1").is_err());
}

// =============================================================================
// Classifier Gating
// =============================================================================

#[test]
fn test_confident_classifier_match_vs_suggestion() {
    // A permissive threshold turns the same signal into a confident match
    let strict = CategorizationEngine::with_config(EngineConfig {
        accept_threshold: 0.999,
    });
    let lenient = CategorizationEngine::with_config(EngineConfig {
        accept_threshold: 0.5,
    });
    for engine in [&strict, &lenient] {
        engine.initialize_from_transactions(&grocery_history());
    }

    let mut tx = transaction("t1");
    tx.description = Some("TESCO PRAHA".to_string());

    match strict.categorize(&tx) {
        CategorizationResult::Suggestion {
            category_id,
            confidence,
        } => {
            assert_eq!(category_id, "groceries");
            assert!(confidence > 0.0 && confidence < 1.0);
        }
        other => panic!("expected suggestion, got {:?}", other),
    }

    match lenient.categorize(&tx) {
        CategorizationResult::Match {
            source: MatchSource::MachineLearning { confidence },
            ..
        } => assert!(confidence >= 0.5),
        other => panic!("expected ML match, got {:?}", other),
    }
}

#[test]
fn test_unseen_vocabulary_yields_none() {
    let engine = CategorizationEngine::new();
    engine.initialize_from_transactions(&grocery_history());

    let mut tx = transaction("t1");
    tx.description = Some("XQZW UNRELATED".to_string());
    assert_eq!(engine.categorize(&tx), CategorizationResult::None);
}

// =============================================================================
// Batch
// =============================================================================

#[test]
fn test_batch_equivalence_across_all_stages() {
    let engine = CategorizationEngine::new();
    engine.update_rules(vec![rule(
        1,
        RuleKind::Contains,
        "NETFLIX",
        "entertainment",
        1,
        true,
    )]);
    engine.learn(Some("ACME"), Some("CZ1234"), "cat1").unwrap();
    engine.initialize_from_transactions(&grocery_history());

    let mut by_rule = transaction("a");
    by_rule.description = Some("NETFLIX.COM".to_string());
    let mut by_learned = transaction("b");
    by_learned.counterparty = Some("acme".to_string());
    let mut by_ml = transaction("c");
    by_ml.description = Some("TESCO STORES".to_string());
    let unmatched = transaction("d");

    let batch = vec![by_rule, by_learned, by_ml, unmatched];
    let batched = engine.categorize_batch(&batch);
    let singles: Vec<_> = batch.iter().map(|t| engine.categorize(t)).collect();

    assert_eq!(batched.len(), 4);
    assert_eq!(batched, singles);
    assert_eq!(batched[3], CategorizationResult::None);
}

// =============================================================================
// Host Collaborators
// =============================================================================

struct SeededPayees;

impl LearnedPayeeSource for SeededPayees {
    fn entries(&self) -> Result<Vec<LearnedPayeeEntry>> {
        Ok(vec![LearnedPayeeEntry {
            payee: Some("ceska posta".to_string()),
            iban: None,
            tier: LearnedTier::PayeeOnly,
            category_id: "fees".to_string(),
            updated_at: "2024-03-01T08:00:00Z".parse().unwrap(),
        }])
    }
}

struct SeededHistory;

impl TrainingSource for SeededHistory {
    fn samples(&self) -> Result<Vec<TrainingSample>> {
        Ok(grocery_history())
    }
}

#[test]
fn test_load_learned_from_host_store() {
    let engine = CategorizationEngine::new();
    assert_eq!(engine.load_learned(&SeededPayees).unwrap(), 1);

    let mut tx = transaction("t1");
    tx.counterparty = Some("Česká Pošta".to_string());
    assert_eq!(engine.categorize(&tx).category_id(), Some("fees"));
}

#[test]
fn test_bootstrap_from_host_history() {
    let engine = CategorizationEngine::new();
    assert_eq!(engine.bootstrap_from(&SeededHistory).unwrap(), 4);
    assert_eq!(engine.stats().ml_classes, 2);
}

#[test]
fn test_export_import_round_trip_is_stable() {
    let engine = CategorizationEngine::new();
    engine.learn(Some("ACME"), Some("CZ1234"), "cat1").unwrap();
    engine.learn(None, Some("CZ9999"), "cat2").unwrap();

    let exported = engine.export_learned_payees();
    let stats_before = engine.stats();

    let applied = engine.import_learned_payees(&exported);
    assert_eq!(applied, exported.len());
    assert_eq!(engine.stats(), stats_before);
    assert_eq!(engine.export_learned_payees(), exported);
}
