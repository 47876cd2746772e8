// SPDX-FileCopyrightText: 2026 Tixbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telegram channel adapter for tixbot.
//!
//! Implements [`ChannelAdapter`] over the Telegram Bot API via teloxide:
//! long polling of messages, inline button presses, and payment queries, plus
//! every outbound effect the bot needs (keyboards, photos, documents,
//! invoices).

pub mod handler;
pub mod markup;
pub mod media;

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use teloxide::prelude::*;
use teloxide::types::{CallbackQuery, ChatId, InputFile, LabeledPrice, PreCheckoutQuery};
use tixbot_config::model::TelegramConfig;
use tixbot_core::types::{
    AdapterType, Attachment, HealthStatus, InboundEvent, Invoice, MessageId, OutboundMessage,
    PreCheckoutVerdict,
};
use tixbot_core::{ChannelAdapter, PluginAdapter, TixbotError};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Queries waiting for an answer, keyed by their id.
type Pending<T> = Arc<DashMap<String, T>>;

/// Telegram channel adapter implementing [`ChannelAdapter`].
pub struct TelegramChannel {
    bot: Bot,
    config: TelegramConfig,
    inbound_rx: tokio::sync::Mutex<mpsc::Receiver<InboundEvent>>,
    inbound_tx: mpsc::Sender<InboundEvent>,
    polling_handle: Option<tokio::task::JoinHandle<()>>,
    callbacks: Pending<CallbackQuery>,
    pre_checkouts: Pending<PreCheckoutQuery>,
}

impl TelegramChannel {
    /// Creates a new Telegram channel adapter.
    ///
    /// Requires `config.bot_token` to be set.
    pub fn new(config: TelegramConfig) -> Result<Self, TixbotError> {
        let token = config.bot_token.as_deref().ok_or_else(|| {
            TixbotError::Config("telegram.bot_token is required for Telegram adapter".into())
        })?;

        if token.is_empty() {
            return Err(TixbotError::Config("telegram.bot_token cannot be empty".into()));
        }

        let bot = Bot::new(token);
        let (inbound_tx, inbound_rx) = mpsc::channel(100);

        Ok(Self {
            bot,
            config,
            inbound_rx: tokio::sync::Mutex::new(inbound_rx),
            inbound_tx,
            polling_handle: None,
            callbacks: Arc::new(DashMap::new()),
            pre_checkouts: Arc::new(DashMap::new()),
        })
    }

    /// Returns a reference to the underlying teloxide Bot.
    pub fn bot(&self) -> &Bot {
        &self.bot
    }
}

fn channel_err(what: &str, e: teloxide::RequestError) -> TixbotError {
    TixbotError::Channel {
        message: format!("failed to {what}: {e}"),
        source: Some(Box::new(e)),
    }
}

async fn forward(tx: &mpsc::Sender<InboundEvent>, event: InboundEvent) {
    if tx.send(event).await.is_err() {
        warn!("inbound channel closed, dropping event");
    }
}

#[async_trait]
impl PluginAdapter for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, TixbotError> {
        match self.bot.get_me().await {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(format!("Telegram bot unreachable: {e}"))),
        }
    }

    async fn shutdown(&self) -> Result<(), TixbotError> {
        debug!("Telegram channel shutting down");
        if let Some(handle) = &self.polling_handle {
            handle.abort();
        }
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for TelegramChannel {
    async fn connect(&mut self) -> Result<(), TixbotError> {
        if self.polling_handle.is_some() {
            return Ok(());
        }

        let bot = self.bot.clone();
        let message_tx = self.inbound_tx.clone();
        let callback_tx = self.inbound_tx.clone();
        let checkout_tx = self.inbound_tx.clone();
        let callbacks = self.callbacks.clone();
        let pre_checkouts = self.pre_checkouts.clone();

        info!("starting Telegram long polling");

        let handle = tokio::spawn(async move {
            let handler = dptree::entry()
                .branch(Update::filter_message().endpoint(move |bot: Bot, msg: Message| {
                    let tx = message_tx.clone();
                    async move {
                        if !handler::is_dm(&msg) {
                            debug!(chat_id = msg.chat.id.0, "ignoring non-DM message");
                            return respond(());
                        }
                        let event = match msg.photo() {
                            Some(photos) => match media::download_largest_photo(&bot, photos).await {
                                Ok(image) => handler::photo_event(&msg, image),
                                Err(e) => {
                                    error!(error = %e, "failed to download photo");
                                    None
                                }
                            },
                            None => handler::message_event(&msg),
                        };
                        if let Some(event) = event {
                            forward(&tx, event).await;
                        }
                        respond(())
                    }
                }))
                .branch(Update::filter_callback_query().endpoint(move |query: CallbackQuery| {
                    let tx = callback_tx.clone();
                    let callbacks = callbacks.clone();
                    async move {
                        if let Some(event) = handler::callback_event(&query) {
                            if let InboundEvent::Callback { callback_id, .. } = &event {
                                callbacks.insert(callback_id.clone(), query);
                            }
                            forward(&tx, event).await;
                        }
                        respond(())
                    }
                }))
                .branch(Update::filter_pre_checkout_query().endpoint(
                    move |query: PreCheckoutQuery| {
                        let tx = checkout_tx.clone();
                        let pre_checkouts = pre_checkouts.clone();
                        async move {
                            if let Some(event) = handler::pre_checkout_event(&query) {
                                if let InboundEvent::PreCheckout { query_id, .. } = &event {
                                    pre_checkouts.insert(query_id.clone(), query);
                                }
                                forward(&tx, event).await;
                            }
                            respond(())
                        }
                    },
                ));

            Dispatcher::builder(bot, handler)
                .default_handler(|_| async {})
                .build()
                .dispatch()
                .await;
        });

        self.polling_handle = Some(handle);
        Ok(())
    }

    async fn receive(&self) -> Result<InboundEvent, TixbotError> {
        let mut rx = self.inbound_rx.lock().await;
        rx.recv().await.ok_or_else(TixbotError::channel_closed)
    }

    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, TixbotError> {
        let mut request = self.bot.send_message(ChatId(msg.chat_id), msg.text);
        if let Some(keyboard) = &msg.keyboard {
            request = request.reply_markup(markup::to_reply_markup(keyboard));
        }
        let sent = request
            .await
            .map_err(|e| channel_err("send message", e))?;
        Ok(MessageId(sent.id.0))
    }

    async fn send_image(&self, chat_id: i64, image: Attachment) -> Result<MessageId, TixbotError> {
        let file = InputFile::memory(image.data).file_name(image.file_name);
        let mut request = self.bot.send_photo(ChatId(chat_id), file);
        if let Some(caption) = image.caption {
            request = request.caption(caption);
        }
        let sent = request.await.map_err(|e| channel_err("send photo", e))?;
        Ok(MessageId(sent.id.0))
    }

    async fn send_document(
        &self,
        chat_id: i64,
        document: Attachment,
    ) -> Result<MessageId, TixbotError> {
        let file = InputFile::memory(document.data).file_name(document.file_name);
        let mut request = self.bot.send_document(ChatId(chat_id), file);
        if let Some(caption) = document.caption {
            request = request.caption(caption);
        }
        let sent = request
            .await
            .map_err(|e| channel_err("send document", e))?;
        Ok(MessageId(sent.id.0))
    }

    async fn edit_message(
        &self,
        chat_id: i64,
        message_id: MessageId,
        text: &str,
    ) -> Result<(), TixbotError> {
        match self
            .bot
            .edit_message_text(ChatId(chat_id), teloxide::types::MessageId(message_id.0), text)
            .await
        {
            Ok(_) => Ok(()),
            Err(e) if e.to_string().contains("message is not modified") => Ok(()),
            Err(e) => Err(channel_err("edit message", e)),
        }
    }

    async fn answer_callback(&self, callback_id: &str) -> Result<(), TixbotError> {
        let (_, query) = self.callbacks.remove(callback_id).ok_or_else(|| TixbotError::Channel {
            message: format!("unknown callback query {callback_id}"),
            source: None,
        })?;
        self.bot
            .answer_callback_query(query.id)
            .await
            .map_err(|e| channel_err("answer callback", e))?;
        Ok(())
    }

    async fn answer_pre_checkout(
        &self,
        query_id: &str,
        verdict: PreCheckoutVerdict,
    ) -> Result<(), TixbotError> {
        let (_, query) = self
            .pre_checkouts
            .remove(query_id)
            .ok_or_else(|| TixbotError::Channel {
                message: format!("unknown pre-checkout query {query_id}"),
                source: None,
            })?;
        let request = match verdict {
            PreCheckoutVerdict::Accept => self.bot.answer_pre_checkout_query(query.id, true),
            PreCheckoutVerdict::Reject(reason) => self
                .bot
                .answer_pre_checkout_query(query.id, false)
                .error_message(reason),
        };
        request
            .await
            .map_err(|e| channel_err("answer pre-checkout query", e))?;
        Ok(())
    }

    async fn send_invoice(&self, chat_id: i64, invoice: Invoice) -> Result<MessageId, TixbotError> {
        let amount = u32::try_from(invoice.amount).map_err(|_| {
            TixbotError::Validation(format!("invoice amount {} out of range", invoice.amount))
        })?;
        let prices = vec![LabeledPrice::new(invoice.title.clone(), amount)];
        let tips: Vec<u32> = invoice
            .suggested_tips
            .iter()
            .filter_map(|t| u32::try_from(*t).ok())
            .collect();

        let mut request = self
            .bot
            .send_invoice(
                ChatId(chat_id),
                invoice.title,
                invoice.description,
                invoice.payload,
                invoice.currency,
                prices,
            )
            .need_name(true)
            .need_phone_number(true)
            .need_email(true);
        if let Some(token) = &self.config.payment_provider_token {
            request = request.provider_token(token.clone());
        }
        if let Ok(max_tip) = u32::try_from(invoice.max_tip_amount)
            && max_tip > 0
        {
            request = request.max_tip_amount(max_tip).suggested_tip_amounts(tips);
        }
        if let Some(url) = invoice.photo_url.as_deref() {
            match reqwest::Url::parse(url) {
                Ok(url) => request = request.photo_url(url),
                Err(e) => warn!(url, error = %e, "ignoring invalid invoice photo url"),
            }
        }

        let sent = request.await.map_err(|e| channel_err("send invoice", e))?;
        Ok(MessageId(sent.id.0))
    }
}
