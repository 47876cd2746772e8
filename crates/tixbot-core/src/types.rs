// SPDX-FileCopyrightText: 2026 Tixbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the tixbot domain.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Identifier of a message sent through a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub i32);

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the type of adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Channel,
    Storage,
    Artifact,
    Decoder,
}

// --- Conversation types ---

/// Key of a persisted conversation: the user plus an optional chat scope.
///
/// Encoded as `"<user_id>"` or `"<user_id>:<chat_id>"` when stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey {
    pub user_id: i64,
    pub chat_id: Option<i64>,
}

impl SessionKey {
    /// A key scoped to the user only, regardless of chat.
    pub fn user(user_id: i64) -> Self {
        Self {
            user_id,
            chat_id: None,
        }
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.chat_id {
            Some(chat) => write!(f, "{}:{chat}", self.user_id),
            None => write!(f, "{}", self.user_id),
        }
    }
}

impl FromStr for SessionKey {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((user, chat)) => Ok(Self {
                user_id: user.parse()?,
                chat_id: Some(chat.parse()?),
            }),
            None => Ok(Self::user(s.parse()?)),
        }
    }
}

/// Independent conversation namespaces. Each holds its own session map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
pub enum Namespace {
    #[strum(serialize = "user_states_conversation")]
    User,
    #[strum(serialize = "admin_states_conversation")]
    Admin,
}

/// Every state label either conversation flow can be in.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConversationState {
    Starting,
    WaitingName,
    WaitingVk,
    WaitingPayment,
    ReadyDashboard,
    AdminDashboard,
    AdminCheckin,
}

impl ConversationState {
    /// The namespace this state lives in.
    pub fn namespace(&self) -> Namespace {
        match self {
            Self::AdminDashboard | Self::AdminCheckin => Namespace::Admin,
            _ => Namespace::User,
        }
    }
}

// --- Inbound events ---

/// Profile of the remote user who produced an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sender {
    pub id: i64,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

impl Sender {
    /// First and last name joined by a space.
    pub fn full_name(&self) -> String {
        match &self.last_name {
            Some(last) if !last.is_empty() => format!("{} {last}", self.first_name),
            _ => self.first_name.clone(),
        }
    }
}

/// Contact details collected by the payment form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderInfo {
    pub name: Option<String>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
}

/// A payment the platform reports as completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmedPayment {
    /// Catalog item id echoed back from the invoice.
    pub payload: String,
    pub currency: String,
    /// Charged amount in minor currency units.
    pub total_amount: i64,
    pub provider_payment_charge_id: String,
    pub telegram_payment_charge_id: String,
    pub order: OrderInfo,
}

/// A single stateless inbound event from the messaging platform.
#[derive(Debug, Clone)]
pub enum InboundEvent {
    /// Free text, including commands and reply-keyboard buttons.
    Text {
        sender: Sender,
        chat_id: i64,
        text: String,
    },
    /// An inline button press carrying `action:payload` data.
    Callback {
        sender: Sender,
        chat_id: i64,
        callback_id: String,
        message_id: Option<MessageId>,
        data: String,
    },
    /// An image, already downloaded.
    Photo {
        sender: Sender,
        chat_id: i64,
        image: Vec<u8>,
    },
    /// A payment pre-authorization that must be answered before money moves.
    PreCheckout {
        sender: Sender,
        query_id: String,
        payload: String,
        currency: String,
        total_amount: i64,
    },
    /// A completed payment.
    PaymentConfirmed {
        sender: Sender,
        chat_id: i64,
        payment: ConfirmedPayment,
    },
}

impl InboundEvent {
    /// The user who produced the event.
    pub fn sender(&self) -> &Sender {
        match self {
            Self::Text { sender, .. }
            | Self::Callback { sender, .. }
            | Self::Photo { sender, .. }
            | Self::PreCheckout { sender, .. }
            | Self::PaymentConfirmed { sender, .. } => sender,
        }
    }

    /// Chat to reply into. Pre-checkout queries carry no chat, so the private chat is used.
    pub fn chat_id(&self) -> i64 {
        match self {
            Self::Text { chat_id, .. }
            | Self::Callback { chat_id, .. }
            | Self::Photo { chat_id, .. }
            | Self::PaymentConfirmed { chat_id, .. } => *chat_id,
            Self::PreCheckout { sender, .. } => sender.id,
        }
    }

    /// Conversations are keyed per user, not per chat.
    pub fn session_key(&self) -> SessionKey {
        SessionKey::user(self.sender().id)
    }

    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::Callback { .. } => "callback",
            Self::Photo { .. } => "photo",
            Self::PreCheckout { .. } => "pre_checkout",
            Self::PaymentConfirmed { .. } => "payment_confirmed",
        }
    }
}

// --- Outbound effects ---

/// An inline button that sends `data` back as a callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineButton {
    pub label: String,
    pub data: String,
}

impl InlineButton {
    pub fn new(label: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            data: data.into(),
        }
    }
}

/// Keyboard attached to an outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Keyboard {
    /// Persistent reply keyboard; rows of button labels.
    Reply(Vec<Vec<String>>),
    /// Buttons attached to the message itself.
    Inline(Vec<Vec<InlineButton>>),
    /// Hide any reply keyboard.
    Remove,
}

/// A text message to be sent via a channel adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub chat_id: i64,
    pub text: String,
    pub keyboard: Option<Keyboard>,
}

impl OutboundMessage {
    pub fn text(chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            keyboard: None,
        }
    }

    pub fn with_keyboard(mut self, keyboard: Keyboard) -> Self {
        self.keyboard = Some(keyboard);
        self
    }
}

/// A binary file delivered as a photo or document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub data: Vec<u8>,
    pub caption: Option<String>,
}

/// A payable invoice for one catalog item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invoice {
    pub title: String,
    pub description: String,
    /// Echoed back in pre-checkout and payment events; the catalog item id.
    pub payload: String,
    pub currency: String,
    /// Price in minor currency units.
    pub amount: i64,
    pub photo_url: Option<String>,
    pub max_tip_amount: i64,
    pub suggested_tips: Vec<i64>,
}

/// Answer to a payment pre-authorization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreCheckoutVerdict {
    Accept,
    Reject(String),
}

/// Everything printed on a generated ticket artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketCard {
    /// Encoded into the QR code; redeemed at check-in.
    pub purchase_id: String,
    pub event_title: String,
    pub holder_name: String,
    pub ticket_name: String,
    pub total_amount: i64,
    pub currency: String,
    pub created: String,
}

impl TicketCard {
    /// Human-readable summary, used as the artifact caption.
    pub fn summary(&self) -> String {
        format!(
            "{}\n{}: {}\nPaid: {}.{:02} {}\nIssued: {}\nCode: {}",
            self.event_title,
            self.ticket_name,
            self.holder_name,
            self.total_amount / 100,
            self.total_amount % 100,
            self.currency,
            self.created,
            self.purchase_id,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_key_encoding_roundtrips() {
        let key = SessionKey::user(42);
        assert_eq!(key.to_string(), "42");
        assert_eq!("42".parse::<SessionKey>().unwrap(), key);

        let scoped = SessionKey {
            user_id: 42,
            chat_id: Some(-100),
        };
        assert_eq!(scoped.to_string(), "42:-100");
        assert_eq!("42:-100".parse::<SessionKey>().unwrap(), scoped);
    }

    #[test]
    fn namespace_names_are_stable() {
        assert_eq!(Namespace::User.to_string(), "user_states_conversation");
        assert_eq!(
            "admin_states_conversation".parse::<Namespace>().unwrap(),
            Namespace::Admin
        );
    }

    #[test]
    fn state_labels_roundtrip() {
        for state in [
            ConversationState::Starting,
            ConversationState::WaitingName,
            ConversationState::WaitingVk,
            ConversationState::WaitingPayment,
            ConversationState::ReadyDashboard,
            ConversationState::AdminDashboard,
            ConversationState::AdminCheckin,
        ] {
            let label = state.to_string();
            assert_eq!(label.parse::<ConversationState>().unwrap(), state);
        }
        assert_eq!(ConversationState::WaitingVk.to_string(), "WAITING_VK");
        assert_eq!(
            ConversationState::AdminCheckin.namespace(),
            Namespace::Admin
        );
    }

    #[test]
    fn sender_full_name_skips_missing_last_name() {
        let mut sender = Sender {
            id: 1,
            first_name: "Ivan".into(),
            last_name: None,
            username: None,
        };
        assert_eq!(sender.full_name(), "Ivan");
        sender.last_name = Some("Petrov".into());
        assert_eq!(sender.full_name(), "Ivan Petrov");
    }

    #[test]
    fn pre_checkout_replies_into_private_chat() {
        let event = InboundEvent::PreCheckout {
            sender: Sender {
                id: 77,
                first_name: "A".into(),
                last_name: None,
                username: None,
            },
            query_id: "q1".into(),
            payload: "standard".into(),
            currency: "RUB".into(),
            total_amount: 1000,
        };
        assert_eq!(event.chat_id(), 77);
        assert_eq!(event.session_key(), SessionKey::user(77));
        assert_eq!(event.kind(), "pre_checkout");
    }

    #[test]
    fn ticket_card_summary_formats_minor_units() {
        let card = TicketCard {
            purchase_id: "ch_1".into(),
            event_title: "Summer Fest".into(),
            holder_name: "Ivan".into(),
            ticket_name: "standard".into(),
            total_amount: 150050,
            currency: "RUB".into(),
            created: "2026-06-01".into(),
        };
        let summary = card.summary();
        assert!(summary.contains("1500.50 RUB"));
        assert!(summary.contains("Code: ch_1"));
    }
}
