// SPDX-FileCopyrightText: 2026 Tixbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation routing.
//!
//! [`route`] decides which action an inbound event triggers given the freshly
//! resolved user and admin states. It is pure: handlers perform the action and
//! persist the resulting transition.
//!
//! Precedence follows the order handlers are consulted:
//! 1. payment events, which are accepted in any state
//! 2. the informational buttons
//! 3. the admin conversation
//! 4. `/start`, then the user conversation state
//! 5. a reminder of the current prompt

use std::sync::LazyLock;

use regex::Regex;
use tixbot_core::{ConversationState, InboundEvent};

use crate::texts::{
    BUTTON_ADMIN, BUTTON_ADMIN_ALL, BUTTON_ADMIN_CHECKIN, BUTTON_ADMIN_CSV, BUTTON_ADMIN_STATS,
    BUTTON_BACK, BUTTON_INFO, BUTTON_MY_TICKET, BUTTON_STATUS, BUTTON_TICKETS, CALLBACK_GIFT,
    CALLBACK_REALNAME,
};

static USER_CARD_COMMAND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/([0-9]+)$").expect("valid user card pattern"));

/// What an inbound event asks the bot to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    ShowStatus,
    ShowInfo,
    Admin(AdminAction),
    /// `/start`: (re)create the user and ask for a name.
    Start,
    /// Display name typed in WAITING_NAME.
    SetName(String),
    /// Display name picked from the suggestion button.
    SetNameFromButton(String),
    /// Profile link typed in WAITING_VK.
    SetProfileLink(String),
    ShowTickets,
    ShowMyTicket,
    PreCheckout,
    PaymentConfirmed,
    /// Re-send the prompt of the current user state, if any.
    Remind(Option<ConversationState>),
    /// Nothing to do; callbacks are still acknowledged.
    Ignore,
}

/// Actions of the admin conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminAction {
    Enter,
    Stats,
    Csv,
    AllUsers,
    Checkin,
    ShowUser(i64),
    Gift(i64),
    /// Leave the admin conversation.
    Exit,
    /// From check-in back to the dashboard.
    BackToDashboard,
    RedeemPhoto,
    RedeemText(String),
}

/// Pick the action for `event`.
pub fn route(
    event: &InboundEvent,
    user_state: Option<ConversationState>,
    admin_state: Option<ConversationState>,
) -> Action {
    match event {
        InboundEvent::PreCheckout { .. } => Action::PreCheckout,
        InboundEvent::PaymentConfirmed { .. } => Action::PaymentConfirmed,
        InboundEvent::Text { text, .. } => route_text(text.trim(), user_state, admin_state),
        InboundEvent::Callback { data, .. } => route_callback(data, user_state, admin_state),
        InboundEvent::Photo { .. } => match admin_state {
            Some(ConversationState::AdminCheckin) => Action::Admin(AdminAction::RedeemPhoto),
            _ => Action::Ignore,
        },
    }
}

fn route_text(
    text: &str,
    user_state: Option<ConversationState>,
    admin_state: Option<ConversationState>,
) -> Action {
    if text == BUTTON_STATUS {
        return Action::ShowStatus;
    }
    if text == BUTTON_INFO {
        return Action::ShowInfo;
    }
    if let Some(action) = route_admin_text(text, admin_state) {
        return Action::Admin(action);
    }
    if is_start_command(text) {
        return Action::Start;
    }
    match user_state {
        Some(ConversationState::WaitingName) if !text.is_empty() => {
            Action::SetName(text.to_string())
        }
        Some(ConversationState::WaitingVk) => Action::SetProfileLink(text.to_string()),
        Some(ConversationState::WaitingPayment) if text == BUTTON_TICKETS => Action::ShowTickets,
        Some(ConversationState::ReadyDashboard) if text == BUTTON_MY_TICKET => {
            Action::ShowMyTicket
        }
        state => Action::Remind(state),
    }
}

fn route_admin_text(text: &str, admin_state: Option<ConversationState>) -> Option<AdminAction> {
    match admin_state {
        None => (text == BUTTON_ADMIN).then_some(AdminAction::Enter),
        Some(ConversationState::AdminDashboard) => match text {
            BUTTON_ADMIN_ALL => Some(AdminAction::AllUsers),
            BUTTON_ADMIN_CSV => Some(AdminAction::Csv),
            BUTTON_ADMIN_STATS => Some(AdminAction::Stats),
            BUTTON_ADMIN_CHECKIN => Some(AdminAction::Checkin),
            BUTTON_BACK => Some(AdminAction::Exit),
            _ => parse_user_card_command(text).map(AdminAction::ShowUser),
        },
        Some(ConversationState::AdminCheckin) if text == BUTTON_BACK => {
            Some(AdminAction::BackToDashboard)
        }
        Some(ConversationState::AdminCheckin) => Some(AdminAction::RedeemText(text.to_string())),
        Some(_) => None,
    }
}

fn route_callback(
    data: &str,
    user_state: Option<ConversationState>,
    admin_state: Option<ConversationState>,
) -> Action {
    let Some((tag, payload)) = data.split_once(':') else {
        return Action::Ignore;
    };
    match (tag, user_state, admin_state) {
        (CALLBACK_REALNAME, Some(ConversationState::WaitingName), _) if !payload.trim().is_empty() => {
            Action::SetNameFromButton(payload.trim().to_string())
        }
        (CALLBACK_GIFT, _, Some(ConversationState::AdminDashboard)) => payload
            .parse()
            .map(|id| Action::Admin(AdminAction::Gift(id)))
            .unwrap_or(Action::Ignore),
        _ => Action::Ignore,
    }
}

fn is_start_command(text: &str) -> bool {
    let command = text.split_whitespace().next().unwrap_or_default();
    command == "/start" || command.starts_with("/start@")
}

/// `/<user_id>` as typed from the user list.
pub fn parse_user_card_command(text: &str) -> Option<i64> {
    USER_CARD_COMMAND
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}
