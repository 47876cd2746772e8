// SPDX-FileCopyrightText: 2026 Tixbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel adapter trait for the messaging platform.

use async_trait::async_trait;

use crate::error::TixbotError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{
    Attachment, InboundEvent, Invoice, MessageId, OutboundMessage, PreCheckoutVerdict,
};

/// Adapter for the bidirectional messaging platform.
///
/// Inbound traffic is a stream of [`InboundEvent`]s; every outbound effect the
/// bot can produce is one method here.
#[async_trait]
pub trait ChannelAdapter: PluginAdapter {
    /// Establishes a connection to the messaging platform.
    async fn connect(&mut self) -> Result<(), TixbotError>;

    /// Receives the next inbound event from the channel.
    async fn receive(&self) -> Result<InboundEvent, TixbotError>;

    /// Sends a text message, optionally with a keyboard.
    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, TixbotError>;

    /// Sends an image with an optional caption.
    async fn send_image(&self, chat_id: i64, image: Attachment)
    -> Result<MessageId, TixbotError>;

    /// Sends a file as a document.
    async fn send_document(
        &self,
        chat_id: i64,
        document: Attachment,
    ) -> Result<MessageId, TixbotError>;

    /// Replaces the text of a previously sent message.
    async fn edit_message(
        &self,
        chat_id: i64,
        message_id: MessageId,
        text: &str,
    ) -> Result<(), TixbotError>;

    /// Acknowledges an inline button press.
    async fn answer_callback(&self, callback_id: &str) -> Result<(), TixbotError>;

    /// Accepts or rejects a payment pre-authorization.
    async fn answer_pre_checkout(
        &self,
        query_id: &str,
        verdict: PreCheckoutVerdict,
    ) -> Result<(), TixbotError>;

    /// Sends a payable invoice.
    async fn send_invoice(&self, chat_id: i64, invoice: Invoice)
    -> Result<MessageId, TixbotError>;
}
