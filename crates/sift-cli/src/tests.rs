//! CLI command tests
//!
//! Store, host-adapter and command tests against temp or in-memory stores.

use sift_core::{CategorizationResult, CategoryLookup, RuleKind, TrainingSource, TransactionInput};

use crate::commands;
use crate::host::EngineHost;
use crate::store::Store;

fn seeded_store() -> Store {
    let store = Store::in_memory().unwrap();
    store.seed_default_categories().unwrap();
    store
}

fn tx(id: &str, description: &str) -> TransactionInput {
    TransactionInput {
        id: id.to_string(),
        description: Some(description.to_string()),
        counterparty: None,
        counterparty_iban: None,
        variable_symbol: None,
        constant_symbol: None,
        specific_symbol: None,
        amount: -100.0,
        is_credit: false,
    }
}

// ========== Store Tests ==========

#[test]
fn test_store_seeds_default_categories_once() {
    let store = Store::in_memory().unwrap();
    let first = store.seed_default_categories().unwrap();
    assert!(first > 0);
    // Idempotent: a second seed inserts nothing
    assert_eq!(store.seed_default_categories().unwrap(), 0);
    assert!(store.contains("groceries").unwrap());
    assert!(!store.contains("nonsense").unwrap());
}

#[test]
fn test_store_rule_round_trip() {
    let store = seeded_store();
    let id = store
        .add_rule("netflix", RuleKind::Contains, "NETFLIX", "subscriptions", 10, true)
        .unwrap();

    let rules = store.list_rules().unwrap();
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].id, id);
    assert_eq!(rules[0].kind, RuleKind::Contains);
    assert!(rules[0].stop_processing);
    assert!(rules[0].active);

    assert!(store.delete_rule(id).unwrap());
    assert!(!store.delete_rule(id).unwrap());
    assert!(store.list_rules().unwrap().is_empty());
}

#[test]
fn test_store_learned_persistence_round_trip() {
    let mut store = seeded_store();
    let host_engine = sift_core::CategorizationEngine::new();
    host_engine
        .learn(Some("ACME"), Some("CZ1234"), "groceries")
        .unwrap();

    store.replace_learned(&host_engine.learned_entries()).unwrap();
    assert_eq!(store.learned_count().unwrap(), 3);

    // A fresh engine rehydrates from the store
    let fresh = sift_core::CategorizationEngine::new();
    assert_eq!(fresh.load_learned(&store).unwrap(), 3);
    let mut t = tx("t1", "whatever");
    t.counterparty = Some("acme".to_string());
    assert_eq!(fresh.categorize(&t).category_id(), Some("groceries"));
}

#[test]
fn test_store_history_feeds_training_samples() {
    let store = seeded_store();
    store.record_history("ALBERT SUPERMARKET", "groceries").unwrap();
    store.record_history("NETFLIX.COM", "subscriptions").unwrap();

    let samples = store.samples().unwrap();
    assert_eq!(samples.len(), 2);
    assert_eq!(samples[0].text, "ALBERT SUPERMARKET");
    assert_eq!(store.history_count().unwrap(), 2);
}

// ========== Host Adapter Tests ==========

#[test]
fn test_host_attach_syncs_rules_and_payees() {
    let mut store = seeded_store();
    store
        .add_rule("netflix", RuleKind::Contains, "NETFLIX", "subscriptions", 10, true)
        .unwrap();
    let engine = sift_core::CategorizationEngine::new();
    engine.learn(Some("ACME"), None, "groceries").unwrap();
    store.replace_learned(&engine.learned_entries()).unwrap();

    let host = EngineHost::attach(store).unwrap();
    let stats = host.stats();
    assert_eq!(stats.active_rules, 1);
    assert_eq!(stats.learned_payees, 1);
}

#[test]
fn test_host_cache_serves_repeat_lookups() {
    let mut host = EngineHost::attach(seeded_store()).unwrap();
    let t = tx("t1", "MYSTERY PAYEE");

    assert_eq!(host.categorize(&t), CategorizationResult::None);

    // Teach the engine directly, bypassing the host: the cached result
    // still answers because nothing invalidated it
    host.engine()
        .update_rules(vec![sift_core::CategorizationRule {
            id: 1,
            name: "mystery".to_string(),
            kind: RuleKind::Contains,
            pattern: "MYSTERY".to_string(),
            category_id: "other".to_string(),
            priority: 1,
            active: true,
            stop_processing: false,
        }]);
    assert_eq!(host.categorize(&t), CategorizationResult::None);

    // A new transaction id misses the cache and sees the new rule
    assert!(host.categorize(&tx("t2", "MYSTERY PAYEE")).is_match());
}

#[test]
fn test_host_learn_invalidates_cache_and_persists() {
    let mut host = EngineHost::attach(seeded_store()).unwrap();
    let mut t = tx("t1", "irrelevant");
    t.counterparty = Some("ACME".to_string());

    assert_eq!(host.categorize(&t), CategorizationResult::None);

    host.learn(Some("ACME"), None, "groceries", None).unwrap();

    // Cache was dropped, so the same transaction id re-runs the waterfall
    assert_eq!(host.categorize(&t).category_id(), Some("groceries"));
    assert_eq!(host.store().learned_count().unwrap(), 1);
}

#[test]
fn test_host_learn_rejects_unknown_category() {
    let mut host = EngineHost::attach(seeded_store()).unwrap();
    assert!(host.learn(Some("ACME"), None, "not-a-category", None).is_err());
}

#[test]
fn test_host_batch_uses_cache_and_preserves_order() {
    let mut host = EngineHost::attach(seeded_store()).unwrap();
    host.learn(Some("ACME"), None, "groceries", None).unwrap();

    let mut a = tx("a", "something");
    a.counterparty = Some("ACME".to_string());
    let b = tx("b", "unknown");

    // Prime the cache with one of the two
    assert!(host.categorize(&a).is_match());

    let results = host.categorize_batch(&[a, b]);
    assert_eq!(results.len(), 2);
    assert!(results[0].is_match());
    assert_eq!(results[1], CategorizationResult::None);
}

#[test]
fn test_host_forget_round_trip() {
    let mut host = EngineHost::attach(seeded_store()).unwrap();
    host.learn(Some("ACME"), None, "groceries", None).unwrap();

    assert!(host.forget("acme").unwrap());
    assert_eq!(host.store().learned_count().unwrap(), 0);
    assert!(!host.forget("acme").unwrap());
}

#[test]
fn test_host_retrain_from_history() {
    let store = seeded_store();
    store.record_history("ALBERT SUPERMARKET PRAHA", "groceries").unwrap();
    store.record_history("ALBERT MARKET BRNO", "groceries").unwrap();

    let mut host = EngineHost::attach(store).unwrap();
    assert_eq!(host.retrain().unwrap(), 2);
    assert_eq!(host.stats().ml_classes, 1);

    let result = host.categorize(&tx("t1", "ALBERT PRAHA"));
    assert_eq!(result.category_id(), Some("groceries"));
}

#[test]
fn test_host_correction_text_reaches_history_and_queue() {
    let mut host = EngineHost::attach(seeded_store()).unwrap();
    host.learn(
        Some("Rohlik.cz"),
        None,
        "groceries",
        Some("ROHLIK.CZ objednavka 8812"),
    )
    .unwrap();

    assert_eq!(host.store().history_count().unwrap(), 1);
    // The queued text trains on demand
    assert_eq!(host.train_pending(), 1);
    assert_eq!(host.stats().ml_classes, 1);
}

#[test]
fn test_host_payee_export_import_round_trip() {
    let mut host = EngineHost::attach(seeded_store()).unwrap();
    host.learn(Some("ACME"), Some("CZ1234"), "groceries", None).unwrap();

    let exported = host.export_payees();
    let before = host.stats().learned_payees;

    let applied = host.import_payees(&exported).unwrap();
    assert_eq!(applied, exported.len());
    assert_eq!(host.stats().learned_payees, before);
}

// ========== Command Tests ==========

#[test]
fn test_cmd_init_and_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("sift.db");

    commands::cmd_init(&db).unwrap();
    let store = commands::open_store(&db).unwrap();
    assert!(store.contains("groceries").unwrap());
}

#[test]
fn test_open_store_requires_init() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.db");
    assert!(commands::open_store(&missing).is_err());
}

#[test]
fn test_cmd_rules_add_rejects_bad_input() {
    let store = seeded_store();
    // Unknown category
    assert!(commands::cmd_rules_add(
        &store, "r", "contains", "X", "nope", 10, false
    )
    .is_err());
    // Invalid regex caught at add time
    assert!(commands::cmd_rules_add(
        &store, "r", "regex", "(unclosed", "groceries", 10, false
    )
    .is_err());
    // Valid rule lands
    assert!(commands::cmd_rules_add(
        &store, "r", "contains", "NETFLIX", "subscriptions", 10, false
    )
    .is_ok());
    assert_eq!(store.list_rules().unwrap().len(), 1);
}

#[test]
fn test_cmd_rules_list_and_test() {
    let store = seeded_store();
    commands::cmd_rules_add(&store, "netflix", "contains", "NETFLIX", "subscriptions", 10, true)
        .unwrap();
    commands::cmd_rules_list(&store).unwrap();
    commands::cmd_rules_test(store, "NETFLIX.COM").unwrap();
}

#[test]
fn test_cmd_learn_and_categorize_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("sift.db");
    commands::cmd_init(&db).unwrap();

    let store = commands::open_store(&db).unwrap();
    commands::cmd_learn(store, Some("ACME"), None, "groceries", None).unwrap();

    // A separate process-style reopen still sees the learned entry
    let store = commands::open_store(&db).unwrap();
    let mut host = EngineHost::attach(store).unwrap();
    let mut t = tx("t1", "payment");
    t.counterparty = Some("ACME".to_string());
    assert_eq!(host.categorize(&t).category_id(), Some("groceries"));
}

#[test]
fn test_cmd_categorize_batch_file() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("sift.db");
    commands::cmd_init(&db).unwrap();

    let store = commands::open_store(&db).unwrap();
    commands::cmd_rules_add(&store, "netflix", "contains", "NETFLIX", "subscriptions", 10, true)
        .unwrap();

    let batch = dir.path().join("batch.json");
    std::fs::write(
        &batch,
        serde_json::to_string(&vec![tx("t1", "NETFLIX.COM"), tx("t2", "UNKNOWN")]).unwrap(),
    )
    .unwrap();

    commands::cmd_categorize(store, None, Some(&batch), true).unwrap();
}

#[test]
fn test_cmd_payees_export_import_files() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("sift.db");
    commands::cmd_init(&db).unwrap();

    let store = commands::open_store(&db).unwrap();
    commands::cmd_learn(store, None, Some("CZ6508000000192000145399"), "groceries", None)
        .unwrap();

    let backup = dir.path().join("payees.json");
    commands::cmd_payees_export(commands::open_store(&db).unwrap(), Some(&backup)).unwrap();
    commands::cmd_payees_import(commands::open_store(&db).unwrap(), &backup).unwrap();

    let store = commands::open_store(&db).unwrap();
    assert_eq!(store.learned_count().unwrap(), 1);
}

#[test]
fn test_cmd_model_bootstrap_from_history() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("sift.db");
    commands::cmd_init(&db).unwrap();

    let store = commands::open_store(&db).unwrap();
    store.record_history("ALBERT SUPERMARKET", "groceries").unwrap();
    commands::cmd_model_bootstrap(store).unwrap();
}

#[test]
fn test_truncate() {
    assert_eq!(commands::truncate("short", 10), "short");
    assert_eq!(commands::truncate("a very long string", 10), "a very ...");
}
