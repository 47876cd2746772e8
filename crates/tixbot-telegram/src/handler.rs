// SPDX-FileCopyrightText: 2026 Tixbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversion of Telegram updates into [`InboundEvent`]s.
//!
//! Payment and query identifiers are read from the serialized update so the
//! conversion does not depend on teloxide's wrapper types for them.

use serde::Serialize;
use serde_json::Value;
use teloxide::types::{CallbackQuery, ChatKind, Message, PreCheckoutQuery, User};
use tixbot_core::types::{ConfirmedPayment, OrderInfo, Sender};
use tixbot_core::{InboundEvent, MessageId};
use tracing::debug;

/// Only private chats take part in the conversation.
pub fn is_dm(msg: &Message) -> bool {
    matches!(msg.chat.kind, ChatKind::Private(_))
}

pub fn to_sender(user: &User) -> Sender {
    Sender {
        id: user.id.0 as i64,
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        username: user.username.clone(),
    }
}

/// The `id` field of a serialized query.
pub fn query_id<T: Serialize>(query: &T) -> Option<String> {
    let value = serde_json::to_value(query).ok()?;
    match value.get("id")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Text and payment messages. Photos need a download and are built by
/// [`photo_event`].
pub fn message_event(msg: &Message) -> Option<InboundEvent> {
    let sender = to_sender(msg.from.as_ref()?);
    let chat_id = msg.chat.id.0;

    if let Some(payment) = msg.successful_payment() {
        let payment = serde_json::to_value(payment).ok()?;
        return Some(InboundEvent::PaymentConfirmed {
            sender,
            chat_id,
            payment: confirmed_payment(&payment)?,
        });
    }

    if let Some(text) = msg.text() {
        return Some(InboundEvent::Text {
            sender,
            chat_id,
            text: text.to_string(),
        });
    }

    debug!(msg_id = msg.id.0, "ignoring unsupported message type");
    None
}

pub fn photo_event(msg: &Message, image: Vec<u8>) -> Option<InboundEvent> {
    Some(InboundEvent::Photo {
        sender: to_sender(msg.from.as_ref()?),
        chat_id: msg.chat.id.0,
        image,
    })
}

/// An inline button press. Presses on messages the bot can no longer see
/// are answered in the presser's private chat.
pub fn callback_event(query: &CallbackQuery) -> Option<InboundEvent> {
    let sender = to_sender(&query.from);
    let (chat_id, message_id) = match &query.message {
        Some(message) => (message.chat().id.0, Some(MessageId(message.id().0))),
        None => (sender.id, None),
    };
    Some(InboundEvent::Callback {
        callback_id: query_id(query)?,
        chat_id,
        message_id,
        data: query.data.clone().unwrap_or_default(),
        sender,
    })
}

pub fn pre_checkout_event(query: &PreCheckoutQuery) -> Option<InboundEvent> {
    let value = serde_json::to_value(query).ok()?;
    Some(InboundEvent::PreCheckout {
        sender: to_sender(&query.from),
        query_id: str_field(&value, "id")?,
        payload: str_field(&value, "invoice_payload").unwrap_or_default(),
        currency: str_field(&value, "currency").unwrap_or_default(),
        total_amount: value.get("total_amount")?.as_i64()?,
    })
}

/// A `successful_payment` object as a [`ConfirmedPayment`].
pub fn confirmed_payment(value: &Value) -> Option<ConfirmedPayment> {
    let order = value.get("order_info");
    let order_field = |name: &str| order.and_then(|o| str_field(o, name));
    Some(ConfirmedPayment {
        payload: str_field(value, "invoice_payload").unwrap_or_default(),
        currency: str_field(value, "currency")?,
        total_amount: value.get("total_amount")?.as_i64()?,
        provider_payment_charge_id: str_field(value, "provider_payment_charge_id")?,
        telegram_payment_charge_id: str_field(value, "telegram_payment_charge_id")
            .unwrap_or_default(),
        order: OrderInfo {
            name: order_field("name"),
            phone_number: order_field("phone_number"),
            email: order_field("email"),
        },
    })
}

fn str_field(value: &Value, name: &str) -> Option<String> {
    value.get(name)?.as_str().map(str::to_string)
}
