//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Store initialization, stats, and shared utilities (open_store)
//! - `rules` - Rule management commands (add, list, delete, test)
//! - `categorize` - Waterfall evaluation for a description or a batch file
//! - `payees` - Learned-payee commands (learn, forget, list, export, import)
//! - `model` - Classifier training commands (retrain, bootstrap, pending)

pub mod categorize;
pub mod core;
pub mod model;
pub mod payees;
pub mod rules;

// Re-export command functions for main.rs
pub use categorize::*;
pub use core::*;
pub use model::*;
pub use payees::*;
pub use rules::*;

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        format!("{}...", &s[..max.saturating_sub(3)])
    }
}
