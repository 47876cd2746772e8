// SPDX-FileCopyrightText: 2026 Tixbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tixbot - a Telegram bot that sells, gifts, and checks in event tickets.
//!
//! This is the binary entry point: the bot server plus operator commands that
//! edit the store directly.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod admin;
mod catalog;
mod export;
mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Tixbot - event ticketing over Telegram.
#[derive(Parser, Debug)]
#[command(name = "tixbot", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the bot: poll Telegram and handle events until interrupted.
    Serve,
    /// Write every purchase as CSV to a file.
    Export {
        /// Destination CSV file.
        path: PathBuf,
    },
    /// Manage the ticket catalog.
    Catalog {
        #[command(subcommand)]
        action: CatalogCommands,
    },
    /// Grant or revoke admin rights.
    Admin {
        #[command(subcommand)]
        action: AdminCommands,
    },
}

#[derive(Subcommand, Debug)]
enum CatalogCommands {
    /// Insert or update catalog items from a TOML file of `[[tickets]]`.
    Load {
        /// Catalog file.
        file: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
enum AdminCommands {
    /// Make a registered user an admin.
    Grant {
        /// Telegram user id.
        user_id: i64,
    },
    /// Remove admin rights from a user.
    Revoke {
        /// Telegram user id.
        user_id: i64,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match tixbot_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            tixbot_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Export { path }) => export::run_export(&config, &path).await,
        Some(Commands::Catalog {
            action: CatalogCommands::Load { file },
        }) => catalog::run_load(&config, &file).await,
        Some(Commands::Admin {
            action: AdminCommands::Grant { user_id },
        }) => admin::run_admin(&config, user_id, true).await,
        Some(Commands::Admin {
            action: AdminCommands::Revoke { user_id },
        }) => admin::run_admin(&config, user_id, false).await,
        None => {
            println!("tixbot: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
