//! Learned payee memory
//!
//! Every user correction teaches the engine a payee→category association.
//! The key space is a shallow hierarchy over (normalized payee, IBAN): a full
//! correction writes the combined key and both partial keys, so a later
//! transaction that carries only one of the two still resolves. Lookup walks
//! the tiers from most to least specific and returns the first hit.
//!
//! The store is plain in-memory maps; the host rehydrates it at startup via
//! `load` and persists corrections through its own store.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::{LearnedPayeeEntry, LearnedTier};
use crate::normalize::normalize_payee;

#[derive(Debug, Clone)]
struct StoredEntry {
    category_id: String,
    updated_at: DateTime<Utc>,
}

/// A tiered lookup hit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LearnedMatch {
    pub category_id: String,
    pub tier: LearnedTier,
    /// Normalized payee key, when the hit involved one
    pub payee: Option<String>,
}

/// Hierarchical (payee, IBAN) → category memory with three lookup tiers
#[derive(Debug, Default)]
pub struct LearnedPayeeStore {
    by_payee_iban: HashMap<(String, String), StoredEntry>,
    by_iban: HashMap<String, StoredEntry>,
    by_payee: HashMap<String, StoredEntry>,
}

impl LearnedPayeeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Distinct learned keys across all tiers
    pub fn len(&self) -> usize {
        self.by_payee_iban.len() + self.by_iban.len() + self.by_payee.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Tiered lookup: (payee, IBAN) exact, then IBAN-only, then payee-only.
    pub fn lookup(&self, payee: Option<&str>, iban: Option<&str>) -> Option<LearnedMatch> {
        let payee_key = payee.and_then(normalize_payee);
        let iban_key = clean_iban(iban);

        if let (Some(p), Some(i)) = (payee_key.as_deref(), iban_key.as_deref()) {
            if let Some(entry) = self.by_payee_iban.get(&(p.to_string(), i.to_string())) {
                debug!("Learned hit for ({}, {}) on combined tier", p, i);
                return Some(LearnedMatch {
                    category_id: entry.category_id.clone(),
                    tier: LearnedTier::PayeeIban,
                    payee: Some(p.to_string()),
                });
            }
        }

        if let Some(i) = iban_key.as_deref() {
            if let Some(entry) = self.by_iban.get(i) {
                debug!("Learned hit for IBAN {} on iban-only tier", i);
                return Some(LearnedMatch {
                    category_id: entry.category_id.clone(),
                    tier: LearnedTier::IbanOnly,
                    payee: None,
                });
            }
        }

        if let Some(p) = payee_key {
            if let Some(entry) = self.by_payee.get(&p) {
                debug!("Learned hit for payee {} on payee-only tier", p);
                return Some(LearnedMatch {
                    category_id: entry.category_id.clone(),
                    tier: LearnedTier::PayeeOnly,
                    payee: Some(p),
                });
            }
        }

        None
    }

    /// Record a correction. Writes every tier whose key is present, so later
    /// partial-key lookups benefit from the same correction.
    pub fn learn(
        &mut self,
        payee: Option<&str>,
        iban: Option<&str>,
        category_id: &str,
    ) -> Result<()> {
        let payee_key = payee.and_then(normalize_payee);
        let iban_key = clean_iban(iban);

        if payee_key.is_none() && iban_key.is_none() {
            return Err(Error::InvalidLearnInput);
        }

        let entry = StoredEntry {
            category_id: category_id.to_string(),
            updated_at: Utc::now(),
        };

        if let (Some(p), Some(i)) = (payee_key.as_ref(), iban_key.as_ref()) {
            self.by_payee_iban
                .insert((p.clone(), i.clone()), entry.clone());
        }
        if let Some(i) = iban_key {
            self.by_iban.insert(i, entry.clone());
        }
        if let Some(p) = payee_key {
            self.by_payee.insert(p, entry);
        }

        Ok(())
    }

    /// Drop everything keyed by this payee: the payee-only entry and every
    /// combined entry for it. IBAN-only entries are not payee-keyed and stay.
    pub fn forget(&mut self, payee: &str) -> bool {
        let key = match normalize_payee(payee) {
            Some(k) => k,
            None => return false,
        };

        let had_payee = self.by_payee.remove(&key).is_some();
        let before = self.by_payee_iban.len();
        self.by_payee_iban.retain(|(p, _), _| *p != key);
        let had_combined = self.by_payee_iban.len() != before;

        had_payee || had_combined
    }

    pub fn clear(&mut self) {
        self.by_payee_iban.clear();
        self.by_iban.clear();
        self.by_payee.clear();
    }

    /// Flatten the store to `composite key → category id` for backup.
    ///
    /// Keys are `<tier>:<key>`, with the combined key written as
    /// `<payee>|<iban>`. `import(export())` leaves the store unchanged.
    pub fn export(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        for ((payee, iban), entry) in &self.by_payee_iban {
            map.insert(
                format!("{}:{}|{}", LearnedTier::PayeeIban.as_str(), payee, iban),
                entry.category_id.clone(),
            );
        }
        for (iban, entry) in &self.by_iban {
            map.insert(
                format!("{}:{}", LearnedTier::IbanOnly.as_str(), iban),
                entry.category_id.clone(),
            );
        }
        for (payee, entry) in &self.by_payee {
            map.insert(
                format!("{}:{}", LearnedTier::PayeeOnly.as_str(), payee),
                entry.category_id.clone(),
            );
        }
        map
    }

    /// Restore entries from an exported map. Malformed keys are logged and
    /// skipped. Returns the number of entries applied.
    pub fn import(&mut self, map: &BTreeMap<String, String>) -> usize {
        let mut applied = 0;
        for (key, category_id) in map {
            let (tier_str, rest) = match key.split_once(':') {
                Some(parts) => parts,
                None => {
                    warn!("Skipping malformed learned-payee key '{}'", key);
                    continue;
                }
            };
            let tier: LearnedTier = match tier_str.parse() {
                Ok(t) => t,
                Err(_) => {
                    warn!("Skipping learned-payee key '{}' with unknown tier", key);
                    continue;
                }
            };
            let entry = StoredEntry {
                category_id: category_id.clone(),
                updated_at: Utc::now(),
            };
            match tier {
                LearnedTier::PayeeIban => {
                    // Right split: the IBAN never contains '|', the payee might
                    match rest.rsplit_once('|') {
                        Some((payee, iban)) => {
                            self.by_payee_iban
                                .insert((payee.to_string(), iban.to_string()), entry);
                        }
                        None => {
                            warn!("Skipping combined learned key without separator: '{}'", key);
                            continue;
                        }
                    }
                }
                LearnedTier::IbanOnly => {
                    self.by_iban.insert(rest.to_string(), entry);
                }
                LearnedTier::PayeeOnly => {
                    self.by_payee.insert(rest.to_string(), entry);
                }
            }
            applied += 1;
        }
        applied
    }

    /// Rehydrate from host-persisted entries, preserving their timestamps.
    /// Returns the number of entries loaded.
    pub fn load(&mut self, entries: Vec<LearnedPayeeEntry>) -> usize {
        let mut loaded = 0;
        for entry in entries {
            let stored = StoredEntry {
                category_id: entry.category_id,
                updated_at: entry.updated_at,
            };
            match entry.tier {
                LearnedTier::PayeeIban => match (entry.payee, entry.iban) {
                    (Some(p), Some(i)) => {
                        self.by_payee_iban.insert((p, i), stored);
                    }
                    _ => {
                        warn!("Skipping combined learned entry missing a key part");
                        continue;
                    }
                },
                LearnedTier::IbanOnly => match entry.iban {
                    Some(i) => {
                        self.by_iban.insert(i, stored);
                    }
                    None => {
                        warn!("Skipping iban-only learned entry without an IBAN");
                        continue;
                    }
                },
                LearnedTier::PayeeOnly => match entry.payee {
                    Some(p) => {
                        self.by_payee.insert(p, stored);
                    }
                    None => {
                        warn!("Skipping payee-only learned entry without a payee");
                        continue;
                    }
                },
            }
            loaded += 1;
        }
        loaded
    }

    /// Snapshot of every entry, for host persistence.
    pub fn entries(&self) -> Vec<LearnedPayeeEntry> {
        let mut out = Vec::with_capacity(self.len());
        for ((payee, iban), entry) in &self.by_payee_iban {
            out.push(LearnedPayeeEntry {
                payee: Some(payee.clone()),
                iban: Some(iban.clone()),
                tier: LearnedTier::PayeeIban,
                category_id: entry.category_id.clone(),
                updated_at: entry.updated_at,
            });
        }
        for (iban, entry) in &self.by_iban {
            out.push(LearnedPayeeEntry {
                payee: None,
                iban: Some(iban.clone()),
                tier: LearnedTier::IbanOnly,
                category_id: entry.category_id.clone(),
                updated_at: entry.updated_at,
            });
        }
        for (payee, entry) in &self.by_payee {
            out.push(LearnedPayeeEntry {
                payee: Some(payee.clone()),
                iban: None,
                tier: LearnedTier::PayeeOnly,
                category_id: entry.category_id.clone(),
                updated_at: entry.updated_at,
            });
        }
        out
    }
}

/// Treat blank IBANs as absent; strip interior spaces from paper formatting.
fn clean_iban(iban: Option<&str>) -> Option<String> {
    let raw = iban?.trim();
    if raw.is_empty() {
        return None;
    }
    Some(raw.chars().filter(|c| !c.is_whitespace()).collect())
}
