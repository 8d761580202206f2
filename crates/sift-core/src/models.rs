//! Domain models for Sift

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Transaction attributes the engine classifies on.
///
/// This is a per-call value: the engine never stores it and never mutates the
/// caller's transaction records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionInput {
    pub id: String,
    pub description: Option<String>,
    /// Counterparty (payee) display name as it appears on the statement
    pub counterparty: Option<String>,
    /// Counterparty account IBAN
    pub counterparty_iban: Option<String>,
    pub variable_symbol: Option<String>,
    pub constant_symbol: Option<String>,
    pub specific_symbol: Option<String>,
    /// Negative = expense, positive = income
    pub amount: f64,
    pub is_credit: bool,
}

impl TransactionInput {
    /// Text the classifier scores on: description and counterparty, joined.
    pub fn classification_text(&self) -> String {
        let mut parts = Vec::with_capacity(2);
        if let Some(desc) = self.description.as_deref() {
            if !desc.trim().is_empty() {
                parts.push(desc.trim());
            }
        }
        if let Some(cp) = self.counterparty.as_deref() {
            if !cp.trim().is_empty() {
                parts.push(cp.trim());
            }
        }
        parts.join(" ")
    }
}

/// Pattern semantics of a categorization rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    /// Regular expression over the description
    Regex,
    /// Case-insensitive substring of the description
    Contains,
    /// Case-insensitive prefix of the description
    StartsWith,
    /// Case-insensitive suffix of the description
    EndsWith,
    /// Exact match on the variable symbol
    VariableSymbol,
    /// Exact match on the constant symbol
    ConstantSymbol,
    /// Exact match on the specific symbol
    SpecificSymbol,
}

impl RuleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Regex => "regex",
            Self::Contains => "contains",
            Self::StartsWith => "starts_with",
            Self::EndsWith => "ends_with",
            Self::VariableSymbol => "variable_symbol",
            Self::ConstantSymbol => "constant_symbol",
            Self::SpecificSymbol => "specific_symbol",
        }
    }
}

impl std::str::FromStr for RuleKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "regex" => Ok(Self::Regex),
            "contains" => Ok(Self::Contains),
            "starts_with" | "startswith" | "prefix" => Ok(Self::StartsWith),
            "ends_with" | "endswith" | "suffix" => Ok(Self::EndsWith),
            "variable_symbol" | "vs" => Ok(Self::VariableSymbol),
            "constant_symbol" | "ks" => Ok(Self::ConstantSymbol),
            "specific_symbol" | "ss" => Ok(Self::SpecificSymbol),
            _ => Err(format!("Unknown rule kind: {}", s)),
        }
    }
}

impl std::fmt::Display for RuleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A user-defined categorization rule
///
/// Rules are owned by the host's rule store; the engine holds a read-only,
/// priority-sorted copy for the duration of a categorization pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorizationRule {
    pub id: i64,
    pub name: String,
    pub kind: RuleKind,
    pub pattern: String,
    pub category_id: String,
    /// Lower evaluates first; ties broken by insertion order
    pub priority: i32,
    pub active: bool,
    /// A matching stop rule terminates the rule phase immediately
    pub stop_processing: bool,
}

/// Lookup granularity of a learned-payee entry
///
/// Serialized names match the stored rule-type tags, so exports and the host
/// store share one vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LearnedTier {
    /// Combined (normalized payee, IBAN) key
    #[serde(rename = "iban_default")]
    PayeeIban,
    /// IBAN-only key
    #[serde(rename = "iban_only_default")]
    IbanOnly,
    /// Normalized-payee-only key
    #[serde(rename = "payee_default")]
    PayeeOnly,
}

impl LearnedTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PayeeIban => "iban_default",
            Self::IbanOnly => "iban_only_default",
            Self::PayeeOnly => "payee_default",
        }
    }
}

impl std::str::FromStr for LearnedTier {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "iban_default" => Ok(Self::PayeeIban),
            "iban_only_default" => Ok(Self::IbanOnly),
            "payee_default" => Ok(Self::PayeeOnly),
            _ => Err(format!("Unknown learned tier: {}", s)),
        }
    }
}

impl std::fmt::Display for LearnedTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One learned payee→category association
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearnedPayeeEntry {
    /// Normalized payee name (absent for IBAN-only entries)
    pub payee: Option<String>,
    /// Counterparty IBAN (absent for payee-only entries)
    pub iban: Option<String>,
    pub tier: LearnedTier,
    pub category_id: String,
    pub updated_at: DateTime<Utc>,
}

/// A categorized text the classifier trains on
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingSample {
    pub text: String,
    pub category_id: String,
}

impl TrainingSample {
    pub fn new(text: impl Into<String>, category_id: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            category_id: category_id.into(),
        }
    }
}

/// Which stage of the waterfall produced a match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum MatchSource {
    /// A user-defined rule matched
    Rule { rule_id: i64, rule_name: String },
    /// The learned payee store had an entry for this payee/IBAN
    ExactMatch {
        payee: Option<String>,
        tier: LearnedTier,
    },
    /// The text classifier cleared the accept threshold
    MachineLearning { confidence: f64 },
    /// Assigned directly by the user
    Manual,
}

/// The engine's only output value.
///
/// The caller decides whether to apply it; the engine never writes back to
/// transaction records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum CategorizationResult {
    /// Confident match (implicit confidence 1.0)
    Match {
        category_id: String,
        source: MatchSource,
    },
    /// Below-threshold classifier signal, offered for user confirmation
    Suggestion { category_id: String, confidence: f64 },
    /// No signal from any stage
    None,
}

impl CategorizationResult {
    pub fn category_id(&self) -> Option<&str> {
        match self {
            Self::Match { category_id, .. } | Self::Suggestion { category_id, .. } => {
                Some(category_id)
            }
            Self::None => None,
        }
    }

    pub fn is_match(&self) -> bool {
        matches!(self, Self::Match { .. })
    }
}

/// Derived, read-only engine statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStats {
    /// Active rules in the current rule cache
    pub active_rules: usize,
    /// Distinct learned-payee keys across all tiers
    pub learned_payees: usize,
    /// Categories the classifier has seen at least one document for
    pub ml_classes: usize,
    /// Classifier vocabulary size
    pub ml_vocabulary: usize,
}
