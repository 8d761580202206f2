//! Sift CLI - local transaction categorization host
//!
//! Usage:
//!   sift init                          Initialize the host store
//!   sift rules add --pattern NETFLIX --category subscriptions
//!   sift categorize --file batch.json  Run the waterfall over a batch
//!   sift learn --payee ACME --category groceries
//!   sift stats                         Show engine statistics

mod cli;
mod commands;
mod host;
mod store;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Init => commands::cmd_init(&cli.db),
        Commands::Rules { action } => {
            let store = commands::open_store(&cli.db)?;
            match action {
                None | Some(RulesAction::List) => commands::cmd_rules_list(&store),
                Some(RulesAction::Add {
                    name,
                    kind,
                    pattern,
                    category,
                    priority,
                    stop,
                }) => commands::cmd_rules_add(
                    &store, &name, &kind, &pattern, &category, priority, stop,
                ),
                Some(RulesAction::Delete { id }) => commands::cmd_rules_delete(&store, id),
                Some(RulesAction::Test { description }) => {
                    commands::cmd_rules_test(store, &description)
                }
            }
        }
        Commands::Categorize {
            description,
            file,
            json,
        } => {
            let store = commands::open_store(&cli.db)?;
            commands::cmd_categorize(store, description.as_deref(), file.as_deref(), json)
        }
        Commands::Learn {
            payee,
            iban,
            category,
            text,
        } => {
            let store = commands::open_store(&cli.db)?;
            commands::cmd_learn(
                store,
                payee.as_deref(),
                iban.as_deref(),
                &category,
                text.as_deref(),
            )
        }
        Commands::Forget { payee } => {
            let store = commands::open_store(&cli.db)?;
            commands::cmd_forget(store, &payee)
        }
        Commands::Payees { action } => {
            let store = commands::open_store(&cli.db)?;
            match action {
                None | Some(PayeesAction::List) => commands::cmd_payees_list(store),
                Some(PayeesAction::Export { output }) => {
                    commands::cmd_payees_export(store, output.as_deref())
                }
                Some(PayeesAction::Import { file }) => commands::cmd_payees_import(store, &file),
            }
        }
        Commands::Model { action } => {
            let store = commands::open_store(&cli.db)?;
            match action {
                ModelAction::Retrain => commands::cmd_model_retrain(store),
                ModelAction::Bootstrap => commands::cmd_model_bootstrap(store),
            }
        }
        Commands::Stats => {
            let store = commands::open_store(&cli.db)?;
            commands::cmd_stats(store)
        }
    }
}
