// SPDX-FileCopyrightText: 2026 Tixbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ticket artifact generation and retrieval.

use async_trait::async_trait;

use crate::error::TixbotError;
use crate::traits::adapter::PluginAdapter;
use crate::types::TicketCard;

/// Produces and keeps the scannable image for a purchase.
#[async_trait]
pub trait ArtifactStore: PluginAdapter {
    /// Renders the artifact for `card`, persists it, and returns the image bytes.
    async fn generate(&self, card: &TicketCard) -> Result<Vec<u8>, TixbotError>;

    /// Returns a previously generated artifact, if one is kept.
    async fn fetch(&self, purchase_id: &str) -> Result<Option<Vec<u8>>, TixbotError>;
}
