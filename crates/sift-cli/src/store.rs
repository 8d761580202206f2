//! SQLite host store
//!
//! Owns everything the engine refuses to own: the category catalogue, the
//! user's rules, the persisted learned-payee entries and the categorized
//! history the classifier bootstraps from. Implements the engine's
//! collaborator traits so the engine can consume it without ever holding the
//! connection itself.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use sift_core::{
    CategorizationRule, CategoryLookup, LearnedPayeeEntry, LearnedPayeeSource, LearnedTier,
    RuleKind, TrainingSample, TrainingSource,
};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS categories (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS rules (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    kind TEXT NOT NULL,
    pattern TEXT NOT NULL,
    category_id TEXT NOT NULL REFERENCES categories(id),
    priority INTEGER NOT NULL DEFAULT 100,
    active INTEGER NOT NULL DEFAULT 1,
    stop_processing INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS learned_payees (
    payee TEXT,
    iban TEXT,
    tier TEXT NOT NULL,
    category_id TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    UNIQUE(tier, payee, iban)
);

CREATE TABLE IF NOT EXISTS history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    text TEXT NOT NULL,
    category_id TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);
"#;

/// Seed categories for a fresh store. The user can extend the table; the
/// engine only ever sees the ids.
const DEFAULT_CATEGORIES: &[(&str, &str)] = &[
    ("income", "Income"),
    ("housing", "Housing"),
    ("utilities", "Utilities"),
    ("groceries", "Groceries"),
    ("dining", "Dining"),
    ("transport", "Transport"),
    ("healthcare", "Healthcare"),
    ("shopping", "Shopping"),
    ("entertainment", "Entertainment"),
    ("subscriptions", "Subscriptions"),
    ("travel", "Travel"),
    ("fees", "Fees"),
    ("other", "Other"),
];

pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open (or create) the store at the given path and apply the schema.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open store at {}", path.display()))?;
        conn.execute_batch(SCHEMA).context("Failed to apply schema")?;
        Ok(Self { conn })
    }

    /// In-memory store for tests.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    pub fn seed_default_categories(&self) -> Result<usize> {
        let mut seeded = 0;
        for (id, name) in DEFAULT_CATEGORIES {
            seeded += self.conn.execute(
                "INSERT OR IGNORE INTO categories (id, name) VALUES (?1, ?2)",
                params![id, name],
            )?;
        }
        Ok(seeded)
    }

    pub fn list_categories(&self) -> Result<Vec<(String, String)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM categories ORDER BY id")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    // ============================================
    // Rules
    // ============================================

    pub fn add_rule(
        &self,
        name: &str,
        kind: RuleKind,
        pattern: &str,
        category_id: &str,
        priority: i32,
        stop_processing: bool,
    ) -> Result<i64> {
        self.conn.execute(
            r#"
            INSERT INTO rules (name, kind, pattern, category_id, priority, stop_processing)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                name,
                kind.as_str(),
                pattern,
                category_id,
                priority,
                stop_processing
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn delete_rule(&self, id: i64) -> Result<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM rules WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }

    /// All rules in creation order; the engine re-sorts by priority when it
    /// compiles its cache.
    pub fn list_rules(&self) -> Result<Vec<CategorizationRule>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, name, kind, pattern, category_id, priority, active, stop_processing
            FROM rules
            ORDER BY id
            "#,
        )?;
        let rows = stmt
            .query_map([], |row| {
                let kind_str: String = row.get(2)?;
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    kind_str,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, i32>(5)?,
                    row.get::<_, bool>(6)?,
                    row.get::<_, bool>(7)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut rules = Vec::with_capacity(rows.len());
        for (id, name, kind_str, pattern, category_id, priority, active, stop) in rows {
            let kind: RuleKind = kind_str
                .parse()
                .map_err(|e: String| anyhow::anyhow!(e))
                .with_context(|| format!("Corrupt rule kind for rule {}", id))?;
            rules.push(CategorizationRule {
                id,
                name,
                kind,
                pattern,
                category_id,
                priority,
                active,
                stop_processing: stop,
            });
        }
        Ok(rules)
    }

    // ============================================
    // Learned payees
    // ============================================

    /// Replace the persisted learned entries with the engine's current
    /// snapshot. Runs in one transaction so a crash cannot leave half the
    /// tiers behind.
    pub fn replace_learned(&mut self, entries: &[LearnedPayeeEntry]) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM learned_payees", [])?;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO learned_payees (payee, iban, tier, category_id, updated_at)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )?;
            for entry in entries {
                stmt.execute(params![
                    entry.payee,
                    entry.iban,
                    entry.tier.as_str(),
                    entry.category_id,
                    entry.updated_at.to_rfc3339(),
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn learned_count(&self) -> Result<i64> {
        let count =
            self.conn
                .query_row("SELECT COUNT(*) FROM learned_payees", [], |row| row.get(0))?;
        Ok(count)
    }

    // ============================================
    // Categorized history
    // ============================================

    /// Record a categorized text for future classifier training.
    pub fn record_history(&self, text: &str, category_id: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO history (text, category_id) VALUES (?1, ?2)",
            params![text, category_id],
        )?;
        Ok(())
    }

    pub fn history_count(&self) -> Result<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM history", [], |row| row.get(0))?;
        Ok(count)
    }
}

// Collaborator trait implementations. Failures surface as Error::Host so
// the engine can distinguish a storage problem from a bad call.

impl CategoryLookup for Store {
    fn contains(&self, category_id: &str) -> sift_core::Result<bool> {
        self.conn
            .query_row(
                "SELECT COUNT(*) FROM categories WHERE id = ?1",
                params![category_id],
                |row| row.get::<_, i64>(0),
            )
            .map(|n| n > 0)
            .map_err(|e| sift_core::Error::Host(e.to_string()))
    }
}

impl TrainingSource for Store {
    fn samples(&self) -> sift_core::Result<Vec<TrainingSample>> {
        let mut stmt = self
            .conn
            .prepare("SELECT text, category_id FROM history ORDER BY id")
            .map_err(|e| sift_core::Error::Host(e.to_string()))?;
        let rows = stmt
            .query_map([], |row| {
                Ok(TrainingSample {
                    text: row.get(0)?,
                    category_id: row.get(1)?,
                })
            })
            .and_then(|rows| rows.collect::<std::result::Result<Vec<_>, _>>())
            .map_err(|e| sift_core::Error::Host(e.to_string()))?;
        Ok(rows)
    }
}

impl LearnedPayeeSource for Store {
    fn entries(&self) -> sift_core::Result<Vec<LearnedPayeeEntry>> {
        let mut stmt = self
            .conn
            .prepare("SELECT payee, iban, tier, category_id, updated_at FROM learned_payees")
            .map_err(|e| sift_core::Error::Host(e.to_string()))?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, Option<String>>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })
            .and_then(|rows| rows.collect::<std::result::Result<Vec<_>, _>>())
            .map_err(|e| sift_core::Error::Host(e.to_string()))?;

        let mut entries = Vec::with_capacity(rows.len());
        for (payee, iban, tier_str, category_id, updated_at) in rows {
            let tier: LearnedTier = tier_str
                .parse()
                .map_err(|e: String| sift_core::Error::Host(e))?;
            let updated_at: DateTime<Utc> = updated_at
                .parse()
                .map_err(|e| sift_core::Error::Host(format!("bad timestamp: {}", e)))?;
            entries.push(LearnedPayeeEntry {
                payee,
                iban,
                tier,
                category_id,
                updated_at,
            });
        }
        Ok(entries)
    }
}
