//! Rule matching stage
//!
//! User-defined rules are the highest-priority stage of the waterfall. The
//! engine holds a read-only, priority-sorted copy of the host's rule store,
//! compiled once per `update_rules` call so regex patterns are not re-parsed
//! on every transaction. Matching is a pure function of the rule set and the
//! transaction, which is what makes batch evaluation safe to parallelize.

use regex::Regex;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::{CategorizationRule, RuleKind, TransactionInput};

/// Check a pattern before it enters the host's rule store. Only regex
/// patterns can be malformed; everything else is a literal.
pub fn validate_pattern(kind: RuleKind, pattern: &str) -> Result<()> {
    if kind == RuleKind::Regex {
        Regex::new(pattern).map_err(|source| Error::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
    }
    Ok(())
}

/// A rule with its pattern prepared for repeated evaluation
#[derive(Debug, Clone)]
struct CompiledRule {
    rule: CategorizationRule,
    /// Compiled pattern for `RuleKind::Regex` rules
    regex: Option<Regex>,
}

/// Priority-sorted, active-only snapshot of the host's rules
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<CompiledRule>,
    /// Rules dropped at compile time because their regex did not parse
    invalid: usize,
}

impl RuleSet {
    /// Build a rule set from the host's rule list.
    ///
    /// Inactive rules are dropped. Malformed regex patterns are logged and
    /// dropped; they must never fail the pass. The sort is stable, so rules
    /// with equal priority keep their insertion order.
    pub fn compile(rules: Vec<CategorizationRule>) -> Self {
        let mut compiled = Vec::with_capacity(rules.len());
        let mut invalid = 0;

        for rule in rules {
            if !rule.active {
                continue;
            }
            let regex = if rule.kind == RuleKind::Regex {
                match Regex::new(&rule.pattern) {
                    Ok(re) => Some(re),
                    Err(err) => {
                        warn!(
                            "Skipping rule '{}' (id {}): invalid pattern '{}': {}",
                            rule.name, rule.id, rule.pattern, err
                        );
                        invalid += 1;
                        continue;
                    }
                }
            } else {
                None
            };
            compiled.push(CompiledRule { rule, regex });
        }

        compiled.sort_by_key(|c| c.rule.priority);

        Self {
            rules: compiled,
            invalid,
        }
    }

    /// Number of active, well-formed rules in the set
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rules dropped for malformed patterns in the last compile
    pub fn invalid_count(&self) -> usize {
        self.invalid
    }

    /// First rule that matches the transaction, in ascending priority order.
    pub fn first_match(&self, tx: &TransactionInput) -> Option<&CategorizationRule> {
        for compiled in &self.rules {
            if compiled.matches(tx) {
                debug!(
                    "Rule '{}' matched transaction {}",
                    compiled.rule.name, tx.id
                );
                return Some(&compiled.rule);
            }
        }
        None
    }

    /// All rules that match, in priority order, for rule-editor dry runs.
    ///
    /// A matching stop-processing rule ends the list: rules behind it would
    /// never be reached in a real pass.
    pub fn matches(&self, tx: &TransactionInput) -> Vec<&CategorizationRule> {
        let mut hits = Vec::new();
        for compiled in &self.rules {
            if compiled.matches(tx) {
                hits.push(&compiled.rule);
                if compiled.rule.stop_processing {
                    break;
                }
            }
        }
        hits
    }
}

impl CompiledRule {
    fn matches(&self, tx: &TransactionInput) -> bool {
        match self.rule.kind {
            RuleKind::Regex => {
                let desc = match tx.description.as_deref() {
                    Some(d) => d,
                    None => return false,
                };
                match &self.regex {
                    Some(re) => re.is_match(desc) || re.is_match(&desc.to_uppercase()),
                    None => false,
                }
            }
            RuleKind::Contains | RuleKind::StartsWith | RuleKind::EndsWith => {
                let desc = match tx.description.as_deref() {
                    Some(d) => d.to_uppercase(),
                    None => return false,
                };
                let pattern = self.rule.pattern.to_uppercase();
                match self.rule.kind {
                    RuleKind::Contains => desc.contains(&pattern),
                    RuleKind::StartsWith => desc.starts_with(&pattern),
                    RuleKind::EndsWith => desc.ends_with(&pattern),
                    _ => unreachable!(),
                }
            }
            // Symbols compare as exact numeric strings, no normalization
            RuleKind::VariableSymbol => tx.variable_symbol.as_deref() == Some(&self.rule.pattern),
            RuleKind::ConstantSymbol => tx.constant_symbol.as_deref() == Some(&self.rule.pattern),
            RuleKind::SpecificSymbol => tx.specific_symbol.as_deref() == Some(&self.rule.pattern),
        }
    }
}
