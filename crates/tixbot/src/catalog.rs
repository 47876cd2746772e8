// SPDX-FileCopyrightText: 2026 Tixbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `tixbot catalog load` command implementation.
//!
//! The catalog file is TOML with one `[[tickets]]` table per item:
//!
//! ```toml
//! [[tickets]]
//! id = "standard"
//! price = 10
//! description = "Entry for all days"
//! type = "paid"
//! order = 1
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;
use tixbot_agent::entities::MAX_PRICE;
use tixbot_agent::{Ticket, operator};
use tixbot_config::model::TixbotConfig;
use tixbot_core::{StorageAdapter, TixbotError};

use crate::serve::open_storage;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogFile {
    #[serde(default)]
    tickets: Vec<Ticket>,
}

/// Parse and sanity-check a catalog document.
fn parse_catalog(content: &str) -> Result<Vec<Ticket>, TixbotError> {
    let file: CatalogFile = toml::from_str(content)
        .map_err(|e| TixbotError::Validation(format!("invalid catalog file: {e}")))?;

    let mut seen = HashSet::new();
    for ticket in &file.tickets {
        if ticket.id().trim().is_empty() {
            return Err(TixbotError::Validation("ticket id cannot be empty".into()));
        }
        if ticket.price() < 0 {
            return Err(TixbotError::Validation(format!(
                "ticket {} has a negative price",
                ticket.id()
            )));
        }
        if ticket.price() > MAX_PRICE {
            return Err(TixbotError::Validation(format!(
                "ticket {} price exceeds {MAX_PRICE}",
                ticket.id()
            )));
        }
        if !seen.insert(ticket.id()) {
            return Err(TixbotError::Validation(format!(
                "ticket {} is listed twice",
                ticket.id()
            )));
        }
    }
    Ok(file.tickets)
}

/// Runs `tixbot catalog load <file>`.
pub async fn run_load(config: &TixbotConfig, file: &Path) -> Result<(), TixbotError> {
    let content = tokio::fs::read_to_string(file)
        .await
        .map_err(|e| TixbotError::Validation(format!("cannot read {}: {e}", file.display())))?;
    let tickets = parse_catalog(&content)?;

    let storage = open_storage(&config.storage).await?;
    let summary = operator::load_catalog(&storage, &tickets).await;
    storage.close().await?;
    let summary = summary?;

    eprintln!(
        "Catalog loaded: {} created, {} updated",
        summary.created, summary.updated
    );
    Ok(())
}
