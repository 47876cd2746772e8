// SPDX-FileCopyrightText: 2026 Tixbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Out-of-band operator edits: catalog provisioning, admin flags, and export.
//!
//! These bypass the read-only field rules of the entity layer and write the
//! store directly.

use std::sync::Arc;

use serde_json::{Map, Value};
use tixbot_core::{StorageAdapter, TixbotError};
use tracing::info;

use crate::entities::{Purchase, Ticket, User};
use crate::report;
use crate::store::{Collection, Document};

/// Counts from a catalog load.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CatalogSummary {
    pub created: usize,
    pub updated: usize,
}

/// Insert or overwrite every catalog item.
pub async fn load_catalog(
    storage: &Arc<dyn StorageAdapter>,
    tickets: &[Ticket],
) -> Result<CatalogSummary, TixbotError> {
    let mut summary = CatalogSummary::default();
    for ticket in tickets {
        let body = match serde_json::to_value(ticket).map_err(TixbotError::storage)? {
            Value::Object(map) => map,
            _ => return Err(TixbotError::Internal("ticket did not serialize to an object".into())),
        };
        let id = ticket.key();
        match storage.insert_document(Ticket::COLLECTION, &id, &body).await {
            Ok(()) => summary.created += 1,
            Err(TixbotError::AlreadyExists { .. }) => {
                storage
                    .merge_document(Ticket::COLLECTION, &id, &body)
                    .await?;
                summary.updated += 1;
            }
            Err(e) => return Err(e),
        }
        info!(ticket = id.as_str(), kind = %ticket.kind(), price = ticket.price(), "catalog item loaded");
    }
    Ok(summary)
}

/// Grant or revoke the admin flag of an existing user.
pub async fn set_admin(
    storage: &Arc<dyn StorageAdapter>,
    user_id: i64,
    admin: bool,
) -> Result<(), TixbotError> {
    let mut patch = Map::new();
    patch.insert("admin".into(), Value::Bool(admin));
    storage
        .merge_document(User::COLLECTION, &user_id.to_string(), &patch)
        .await?;
    info!(user_id, admin, "admin flag changed");
    Ok(())
}

/// Every purchase as CSV, oldest first.
pub async fn export_purchases(storage: &Arc<dyn StorageAdapter>) -> Result<Vec<u8>, TixbotError> {
    let purchases = Collection::<Purchase>::new(storage.clone())
        .list(Some("created"), false)
        .await?;
    report::purchases_csv(&purchases)
}
