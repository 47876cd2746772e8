// SPDX-FileCopyrightText: 2026 Tixbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory artifact store and scripted code decoder.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use tixbot_core::types::{AdapterType, HealthStatus, TicketCard};
use tixbot_core::{ArtifactStore, CodeDecoder, PluginAdapter, TixbotError};

/// Keeps generated "images" in memory. The bytes are the purchase id.
#[derive(Default)]
pub struct MockArtifacts {
    stored: Mutex<HashMap<String, Vec<u8>>>,
    cards: Mutex<Vec<TicketCard>>,
    failing: AtomicBool,
}

impl MockArtifacts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `generate` fail.
    pub fn fail_generation(&self, fail: bool) {
        self.failing.store(fail, Ordering::SeqCst);
    }

    /// Cards rendered so far, in order.
    pub async fn generated(&self) -> Vec<TicketCard> {
        self.cards.lock().await.clone()
    }

    /// Forget a stored artifact, as if its file were deleted.
    pub async fn forget(&self, purchase_id: &str) {
        self.stored.lock().await.remove(purchase_id);
    }
}

#[async_trait]
impl PluginAdapter for MockArtifacts {
    fn name(&self) -> &str {
        "mock-artifacts"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Artifact
    }

    async fn health_check(&self) -> Result<HealthStatus, TixbotError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), TixbotError> {
        Ok(())
    }
}

#[async_trait]
impl ArtifactStore for MockArtifacts {
    async fn generate(&self, card: &TicketCard) -> Result<Vec<u8>, TixbotError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(TixbotError::DeliveryFailed {
                message: "mock renderer is failing".into(),
                source: None,
            });
        }
        let bytes = card.purchase_id.as_bytes().to_vec();
        self.stored
            .lock()
            .await
            .insert(card.purchase_id.clone(), bytes.clone());
        self.cards.lock().await.push(card.clone());
        Ok(bytes)
    }

    async fn fetch(&self, purchase_id: &str) -> Result<Option<Vec<u8>>, TixbotError> {
        Ok(self.stored.lock().await.get(purchase_id).cloned())
    }
}

/// What the next `decode` call should return.
#[derive(Debug, Clone)]
pub enum DecodeOutcome {
    Code(String),
    /// The image held no readable code; carries the decoder's detail.
    Unreadable(String),
    /// The decoding service is down.
    Unavailable,
}

/// Decoder answering from a script. Without a script, the image bytes are
/// read back as UTF-8, matching what [`MockArtifacts`] produces.
#[derive(Default)]
pub struct MockDecoder {
    script: Mutex<VecDeque<DecodeOutcome>>,
}

impl MockDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn push(&self, outcome: DecodeOutcome) {
        self.script.lock().await.push_back(outcome);
    }
}

#[async_trait]
impl PluginAdapter for MockDecoder {
    fn name(&self) -> &str {
        "mock-decoder"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Decoder
    }

    async fn health_check(&self) -> Result<HealthStatus, TixbotError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), TixbotError> {
        Ok(())
    }
}

#[async_trait]
impl CodeDecoder for MockDecoder {
    async fn decode(&self, image: &[u8]) -> Result<String, TixbotError> {
        match self.script.lock().await.pop_front() {
            Some(DecodeOutcome::Code(code)) => Ok(code),
            Some(DecodeOutcome::Unreadable(detail)) => Err(TixbotError::Validation(detail)),
            Some(DecodeOutcome::Unavailable) => {
                Err(TixbotError::Internal("mock decoder unavailable".into()))
            }
            None => String::from_utf8(image.to_vec())
                .map_err(|_| TixbotError::Validation("not a code".into())),
        }
    }
}
