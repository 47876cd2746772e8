// SPDX-FileCopyrightText: 2026 Tixbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Decoding of scanned ticket images.

use async_trait::async_trait;

use crate::error::TixbotError;
use crate::traits::adapter::PluginAdapter;

/// Turns a photo of a ticket into the code it encodes.
#[async_trait]
pub trait CodeDecoder: PluginAdapter {
    /// Returns the decoded string, or `Validation` if no code could be read.
    async fn decode(&self, image: &[u8]) -> Result<String, TixbotError>;
}
