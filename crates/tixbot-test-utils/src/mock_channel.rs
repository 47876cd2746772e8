// SPDX-FileCopyrightText: 2026 Tixbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock channel adapter for deterministic testing.
//!
//! `MockChannel` implements `ChannelAdapter` with injectable inbound events
//! and every outbound effect captured in order for assertions.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};

use tixbot_core::types::{
    AdapterType, Attachment, HealthStatus, Invoice, Keyboard, OutboundMessage, PreCheckoutVerdict,
};
use tixbot_core::{ChannelAdapter, InboundEvent, MessageId, PluginAdapter, TixbotError};

/// One outbound effect, as the bot produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Message(OutboundMessage),
    Image { chat_id: i64, image: Attachment },
    Document { chat_id: i64, document: Attachment },
    Edit { chat_id: i64, message_id: MessageId, text: String },
    CallbackAnswer(String),
    PreCheckoutAnswer { query_id: String, verdict: PreCheckoutVerdict },
    Invoice { chat_id: i64, invoice: Invoice },
}

/// A mock messaging channel for testing.
pub struct MockChannel {
    inbound: Arc<Mutex<VecDeque<InboundEvent>>>,
    effects: Arc<Mutex<Vec<Effect>>>,
    notify: Arc<Notify>,
    next_id: AtomicI32,
    closed: AtomicBool,
}

impl MockChannel {
    pub fn new() -> Self {
        Self {
            inbound: Arc::new(Mutex::new(VecDeque::new())),
            effects: Arc::new(Mutex::new(Vec::new())),
            notify: Arc::new(Notify::new()),
            next_id: AtomicI32::new(1),
            closed: AtomicBool::new(false),
        }
    }

    /// Queue an event for the next `receive()`.
    pub async fn inject(&self, event: InboundEvent) {
        self.inbound.lock().await.push_back(event);
        self.notify.notify_one();
    }

    /// Make `receive()` report a closed channel once the queue is empty.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.notify.notify_one();
    }

    pub async fn effects(&self) -> Vec<Effect> {
        self.effects.lock().await.clone()
    }

    pub async fn clear(&self) {
        self.effects.lock().await.clear();
    }

    /// Text messages sent to `chat_id`, in order.
    pub async fn texts_to(&self, chat_id: i64) -> Vec<String> {
        self.effects
            .lock()
            .await
            .iter()
            .filter_map(|e| match e {
                Effect::Message(m) if m.chat_id == chat_id => Some(m.text.clone()),
                _ => None,
            })
            .collect()
    }

    /// The keyboard of the last message sent to `chat_id` that carried one.
    pub async fn last_keyboard(&self, chat_id: i64) -> Option<Keyboard> {
        self.effects.lock().await.iter().rev().find_map(|e| match e {
            Effect::Message(m) if m.chat_id == chat_id => m.keyboard.clone(),
            _ => None,
        })
    }

    pub async fn images_to(&self, chat_id: i64) -> Vec<Attachment> {
        self.effects
            .lock()
            .await
            .iter()
            .filter_map(|e| match e {
                Effect::Image { chat_id: c, image } if *c == chat_id => Some(image.clone()),
                _ => None,
            })
            .collect()
    }

    pub async fn documents_to(&self, chat_id: i64) -> Vec<Attachment> {
        self.effects
            .lock()
            .await
            .iter()
            .filter_map(|e| match e {
                Effect::Document { chat_id: c, document } if *c == chat_id => Some(document.clone()),
                _ => None,
            })
            .collect()
    }

    pub async fn invoices_to(&self, chat_id: i64) -> Vec<Invoice> {
        self.effects
            .lock()
            .await
            .iter()
            .filter_map(|e| match e {
                Effect::Invoice { chat_id: c, invoice } if *c == chat_id => Some(invoice.clone()),
                _ => None,
            })
            .collect()
    }

    pub async fn edits_to(&self, chat_id: i64) -> Vec<String> {
        self.effects
            .lock()
            .await
            .iter()
            .filter_map(|e| match e {
                Effect::Edit { chat_id: c, text, .. } if *c == chat_id => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    /// The verdict given to `query_id`, if answered.
    pub async fn verdict_for(&self, query_id: &str) -> Option<PreCheckoutVerdict> {
        self.effects.lock().await.iter().find_map(|e| match e {
            Effect::PreCheckoutAnswer { query_id: q, verdict } if q == query_id => {
                Some(verdict.clone())
            }
            _ => None,
        })
    }

    pub async fn answered_callbacks(&self) -> Vec<String> {
        self.effects
            .lock()
            .await
            .iter()
            .filter_map(|e| match e {
                Effect::CallbackAnswer(id) => Some(id.clone()),
                _ => None,
            })
            .collect()
    }

    async fn record(&self, effect: Effect) -> MessageId {
        self.effects.lock().await.push(effect);
        MessageId(self.next_id.fetch_add(1, Ordering::SeqCst))
    }
}

impl Default for MockChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockChannel {
    fn name(&self) -> &str {
        "mock-channel"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, TixbotError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), TixbotError> {
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for MockChannel {
    async fn connect(&mut self) -> Result<(), TixbotError> {
        Ok(())
    }

    async fn receive(&self) -> Result<InboundEvent, TixbotError> {
        loop {
            {
                let mut queue = self.inbound.lock().await;
                if let Some(event) = queue.pop_front() {
                    return Ok(event);
                }
                if self.closed.load(Ordering::SeqCst) {
                    return Err(TixbotError::channel_closed());
                }
            }
            self.notify.notified().await;
        }
    }

    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, TixbotError> {
        Ok(self.record(Effect::Message(msg)).await)
    }

    async fn send_image(&self, chat_id: i64, image: Attachment) -> Result<MessageId, TixbotError> {
        Ok(self.record(Effect::Image { chat_id, image }).await)
    }

    async fn send_document(
        &self,
        chat_id: i64,
        document: Attachment,
    ) -> Result<MessageId, TixbotError> {
        Ok(self.record(Effect::Document { chat_id, document }).await)
    }

    async fn edit_message(
        &self,
        chat_id: i64,
        message_id: MessageId,
        text: &str,
    ) -> Result<(), TixbotError> {
        self.record(Effect::Edit {
            chat_id,
            message_id,
            text: text.to_string(),
        })
        .await;
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str) -> Result<(), TixbotError> {
        self.record(Effect::CallbackAnswer(callback_id.to_string()))
            .await;
        Ok(())
    }

    async fn answer_pre_checkout(
        &self,
        query_id: &str,
        verdict: PreCheckoutVerdict,
    ) -> Result<(), TixbotError> {
        self.record(Effect::PreCheckoutAnswer {
            query_id: query_id.to_string(),
            verdict,
        })
        .await;
        Ok(())
    }

    async fn send_invoice(&self, chat_id: i64, invoice: Invoice) -> Result<MessageId, TixbotError> {
        Ok(self.record(Effect::Invoice { chat_id, invoice }).await)
    }
}
