//! Sift Core Library
//!
//! Offline transaction categorization for the Sift personal finance tool:
//! - Rule matching for user-defined patterns (regex, substring, symbols)
//! - Hierarchical learned-payee memory built from user corrections
//! - Incremental statistical text classifier with confidence gating
//! - Waterfall engine composing the three into one decision per transaction
//! - Collaborator traits for the host's category, transaction and
//!   learned-payee stores
//!
//! The engine never performs network I/O and never holds a file or database
//! handle; persistence and UI belong to the host application.

pub mod classifier;
pub mod engine;
pub mod error;
pub mod learned;
pub mod models;
pub mod normalize;
pub mod repo;
pub mod rules;

pub use classifier::{tokenize, Classification, TextClassifier};
pub use engine::{CategorizationEngine, EngineConfig};
pub use error::{Error, Result};
pub use learned::{LearnedMatch, LearnedPayeeStore};
pub use models::{
    CategorizationResult, CategorizationRule, EngineStats, LearnedPayeeEntry, LearnedTier,
    MatchSource, RuleKind, TrainingSample, TransactionInput,
};
pub use normalize::normalize_payee;
pub use repo::{validate_category, CategoryLookup, LearnedPayeeSource, TrainingSource};
pub use rules::{validate_pattern, RuleSet};
