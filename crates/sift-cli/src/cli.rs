//! CLI argument definitions using clap
//!
//! This module contains the clap structs and enums for parsing CLI
//! arguments. The actual command implementations are in the `commands`
//! module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Sift - Offline transaction categorization that learns from you
#[derive(Parser)]
#[command(name = "sift")]
#[command(about = "Categorize bank transactions locally, no cloud required", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Host store path
    #[arg(long, default_value = "sift.db", global = true)]
    pub db: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the host store with the default category set
    Init,

    /// Manage categorization rules
    Rules {
        #[command(subcommand)]
        action: Option<RulesAction>,
    },

    /// Categorize a single description or a JSON batch file
    Categorize {
        /// Transaction description to categorize
        #[arg(short, long, conflicts_with = "file")]
        description: Option<String>,

        /// JSON file containing an array of transactions
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Emit machine-readable JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Record a correction: payee and/or IBAN → category
    Learn {
        /// Counterparty name
        #[arg(short, long)]
        payee: Option<String>,

        /// Counterparty IBAN
        #[arg(short, long)]
        iban: Option<String>,

        /// Category id to associate
        #[arg(short, long)]
        category: String,

        /// Transaction text to queue for classifier training
        #[arg(short, long)]
        text: Option<String>,
    },

    /// Remove everything learned for a payee
    Forget {
        /// Counterparty name
        #[arg(short, long)]
        payee: String,
    },

    /// Inspect and back up learned payees
    Payees {
        #[command(subcommand)]
        action: Option<PayeesAction>,
    },

    /// Classifier training operations
    Model {
        #[command(subcommand)]
        action: ModelAction,
    },

    /// Show engine statistics
    Stats,
}

#[derive(Subcommand)]
pub enum RulesAction {
    /// Add a rule
    Add {
        /// Rule name
        #[arg(long)]
        name: String,

        /// Pattern semantics: regex, contains, starts_with, ends_with,
        /// variable_symbol, constant_symbol, specific_symbol
        #[arg(long, default_value = "contains")]
        kind: String,

        /// Pattern to match
        #[arg(long)]
        pattern: String,

        /// Target category id
        #[arg(long)]
        category: String,

        /// Lower evaluates first
        #[arg(long, default_value = "100")]
        priority: i32,

        /// Stop the rule phase on match
        #[arg(long)]
        stop: bool,
    },

    /// List rules
    List,

    /// Delete a rule by id
    Delete { id: i64 },

    /// Show which rules would match a description
    Test { description: String },
}

#[derive(Subcommand)]
pub enum PayeesAction {
    /// List learned payee entries
    List,

    /// Export learned payees as JSON (stdout or file)
    Export {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Import learned payees from a JSON export
    Import { file: PathBuf },
}

#[derive(Subcommand)]
pub enum ModelAction {
    /// Rebuild the classifier from categorized history
    Retrain,

    /// Additively train from categorized history (first run)
    Bootstrap,
}
