// SPDX-FileCopyrightText: 2026 Tixbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end scenario testing.
//!
//! `TestHarness` assembles a [`Bot`] over a temp SQLite database, a seeded
//! catalog, and mock adapters. Events are handled directly with
//! [`TestHarness::send`], or through a [`BotLoop`] with [`TestHarness::bot_loop`].

use std::sync::Arc;
use std::time::Duration;

use tixbot_agent::{Bot, BotLoop, BotSettings, Purchase, Ticket, TicketType, User, operator};
use tixbot_config::model::StorageConfig;
use tixbot_core::types::{ConfirmedPayment, OrderInfo, Sender};
use tixbot_core::{
    ChannelAdapter, ConversationState, InboundEvent, MessageId, Namespace, SessionKey,
    StorageAdapter, TixbotError,
};
use tixbot_storage::SqliteStorage;

use crate::mock_artifacts::{MockArtifacts, MockDecoder};
use crate::mock_channel::MockChannel;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    catalog: Vec<Ticket>,
    settings: BotSettings,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            catalog: default_catalog(),
            settings: BotSettings {
                event_title: "Summer Fest".into(),
                info_text: "Gates open at noon.".into(),
                ..BotSettings::default()
            },
        }
    }

    /// Replace the seeded catalog.
    pub fn with_catalog(mut self, catalog: Vec<Ticket>) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_settings(mut self, settings: BotSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Build the harness: temp database, migrated schema, loaded catalog.
    pub async fn build(self) -> Result<TestHarness, TixbotError> {
        let temp_dir = tempfile::TempDir::new().map_err(TixbotError::storage)?;
        let storage = SqliteStorage::new(StorageConfig {
            database_path: temp_dir.path().join("test.db").to_string_lossy().into_owned(),
            wal_mode: true,
        });
        storage.initialize().await?;
        let storage: Arc<dyn StorageAdapter> = Arc::new(storage);
        operator::load_catalog(&storage, &self.catalog).await?;

        let channel = Arc::new(MockChannel::new());
        let artifacts = Arc::new(MockArtifacts::new());
        let decoder = Arc::new(MockDecoder::new());
        let bot = Arc::new(Bot::new(
            self.settings,
            storage.clone(),
            channel.clone(),
            artifacts.clone(),
            decoder.clone(),
        ));

        Ok(TestHarness {
            bot,
            channel,
            artifacts,
            decoder,
            storage,
            _temp_dir: temp_dir,
        })
    }
}

/// `standard` (paid, 10), `vip` (paid, 50), and `guest` (free).
pub fn default_catalog() -> Vec<Ticket> {
    vec![
        Ticket::new("standard", 10, "Entry for all days", None, TicketType::Paid, 1),
        Ticket::new(
            "vip",
            50,
            "Entry and backstage",
            Some("https://example.org/vip.png".into()),
            TicketType::Paid,
            2,
        ),
        Ticket::new("guest", 0, "Complimentary entry", None, TicketType::Free, 3),
    ]
}

/// A complete test environment with mock adapters and temp storage.
pub struct TestHarness {
    pub bot: Arc<Bot>,
    pub channel: Arc<MockChannel>,
    pub artifacts: Arc<MockArtifacts>,
    pub decoder: Arc<MockDecoder>,
    /// SQLite storage adapter (temp DB, cleaned up on drop).
    pub storage: Arc<dyn StorageAdapter>,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Harness with the default catalog and settings.
    pub async fn new() -> Result<Self, TixbotError> {
        Self::builder().build().await
    }

    /// Handle one event to completion.
    pub async fn send(&self, event: InboundEvent) -> Result<(), TixbotError> {
        self.bot.handle(event).await
    }

    /// A loop over the mock channel sharing this harness's bot.
    pub fn bot_loop(&self, drain_timeout: Duration) -> BotLoop {
        let channel: Arc<dyn ChannelAdapter> = self.channel.clone();
        BotLoop::new(self.bot.clone(), channel, self.storage.clone(), drain_timeout)
    }

    /// Drive `user_id` through `/start`, name, and profile link to APPROVED.
    pub async fn register(&self, user_id: i64, name: &str) -> Result<User, TixbotError> {
        self.send(text(user_id, "/start")).await?;
        self.send(text(user_id, name)).await?;
        self.send(text(user_id, &format!("vk.com/user{user_id}")))
            .await?;
        self.user(user_id).await
    }

    /// Register `user_id` and flag them as admin.
    pub async fn register_admin(&self, user_id: i64) -> Result<User, TixbotError> {
        self.register(user_id, &format!("Admin {user_id}")).await?;
        operator::set_admin(&self.storage, user_id, true).await?;
        self.user(user_id).await
    }

    pub async fn user(&self, user_id: i64) -> Result<User, TixbotError> {
        self.bot.users().load(&user_id.to_string()).await
    }

    pub async fn purchases(&self) -> Result<Vec<Purchase>, TixbotError> {
        self.bot.purchases().list(Some("created"), false).await
    }

    pub async fn user_state(&self, user_id: i64) -> Result<Option<ConversationState>, TixbotError> {
        self.bot
            .sessions()
            .resolve(Namespace::User, SessionKey::user(user_id))
            .await
    }

    pub async fn admin_state(&self, user_id: i64) -> Result<Option<ConversationState>, TixbotError> {
        self.bot
            .sessions()
            .resolve(Namespace::Admin, SessionKey::user(user_id))
            .await
    }
}

// --- Event builders ---

pub fn sender(user_id: i64) -> Sender {
    Sender {
        id: user_id,
        first_name: format!("First{user_id}"),
        last_name: Some("Last".into()),
        username: Some(format!("user{user_id}")),
    }
}

pub fn text(user_id: i64, body: &str) -> InboundEvent {
    InboundEvent::Text {
        sender: sender(user_id),
        chat_id: user_id,
        text: body.to_string(),
    }
}

pub fn callback(user_id: i64, data: &str) -> InboundEvent {
    InboundEvent::Callback {
        sender: sender(user_id),
        chat_id: user_id,
        callback_id: format!("cb-{user_id}-{data}"),
        message_id: Some(MessageId(100)),
        data: data.to_string(),
    }
}

pub fn photo(user_id: i64, image: &[u8]) -> InboundEvent {
    InboundEvent::Photo {
        sender: sender(user_id),
        chat_id: user_id,
        image: image.to_vec(),
    }
}

pub fn pre_checkout(user_id: i64, query_id: &str, payload: &str) -> InboundEvent {
    InboundEvent::PreCheckout {
        sender: sender(user_id),
        query_id: query_id.to_string(),
        payload: payload.to_string(),
        currency: "RUB".into(),
        total_amount: 1000,
    }
}

pub fn payment(user_id: i64, payload: &str, charge: &str, total_amount: i64) -> InboundEvent {
    InboundEvent::PaymentConfirmed {
        sender: sender(user_id),
        chat_id: user_id,
        payment: ConfirmedPayment {
            payload: payload.to_string(),
            currency: "RUB".into(),
            total_amount,
            provider_payment_charge_id: charge.to_string(),
            telegram_payment_charge_id: format!("tg_{charge}"),
            order: OrderInfo {
                name: Some(format!("Buyer {user_id}")),
                phone_number: Some("+70000000000".into()),
                email: Some(format!("user{user_id}@example.org")),
            },
        },
    }
}
