// SPDX-FileCopyrightText: 2026 Tixbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Button labels and reply texts.

use tixbot_core::ConversationState;

use crate::entities::{Purchase, User, format_amount};

pub const BUTTON_TICKETS: &str = "Tickets";
pub const BUTTON_MY_TICKET: &str = "My ticket";
pub const BUTTON_STATUS: &str = "How am I doing";
pub const BUTTON_INFO: &str = "About the event";
pub const BUTTON_ADMIN: &str = "Admin";
pub const BUTTON_BACK: &str = "Back";
pub const BUTTON_ADMIN_STATS: &str = "Stats";
pub const BUTTON_ADMIN_CSV: &str = "Purchases CSV";
pub const BUTTON_ADMIN_ALL: &str = "All users";
pub const BUTTON_ADMIN_CHECKIN: &str = "Check-in";
pub const BUTTON_GIFT: &str = "Issue ticket";

/// Callback action tag for the suggested-name button.
pub const CALLBACK_REALNAME: &str = "Realname";
/// Callback action tag for the gift button on a user card.
pub const CALLBACK_GIFT: &str = "Gift";

pub const UNAUTHORIZED: &str = "Hey! Where do you think you're going?";
pub const NO_SESSION: &str = "Press /start";
pub const USE_BUTTONS: &str = "Use the buttons below if you need something.";
pub const NOT_A_PROFILE_LINK: &str = "Hmm, that is not a VK profile! Send your VK handle or a link, \
    for example https://vk.com/durov\nMake sure your profile is public!";
pub const SUGGEST_NAME: &str = "Or just pick the name from your profile:";
pub const TOO_EARLY: &str = "Too early for that!";
pub const TICKETS_INTRO: &str = "Pick a ticket and pay right here in the chat. \
    By continuing you accept the event rules and privacy policy.";
pub const NO_TICKET_YET: &str = "You don't have a ticket yet.";
pub const ADMIN_WELCOME: &str = "My lord!";
pub const ADMIN_BACK_TO_DASHBOARD: &str = "OK";
pub const ADMIN_BYE: &str = "Come back soon, the admin panel awaits its master!";
pub const CHECKIN_PROMPT: &str =
    "Send a photo of the ticket or the code itself if your camera can read it.";
pub const CHECKIN_DECODING: &str = "Decoding...";
pub const CHECKIN_CHECKING: &str = "Checking the ticket...";
pub const CHECKIN_UNREADABLE: &str =
    "Could not find a QR code in that photo, please try another shot.";
pub const CHECKIN_UNKNOWN: &str = "Hmm... no such ticket.";
pub const UNKNOWN_COMMAND: &str = "Unknown command";
pub const PAYMENT_PROBLEM: &str =
    "Your payment was received, but something went wrong. The organizers have been notified.";

/// Prompt shown on entering, or being reminded of, a state.
pub fn state_prompt(state: ConversationState, event_title: &str) -> String {
    match state {
        ConversationState::Starting => format!(
            "Hi! This is the {event_title} bot. First we get to know each other, \
             then you can buy your ticket right here!\n\nWhat is your name?"
        ),
        ConversationState::WaitingName => {
            "Let's get acquainted! A couple of questions so we know who you are.\nWhat is your name?"
                .to_string()
        }
        ConversationState::WaitingVk => "Now send a link to your VK profile".to_string(),
        ConversationState::WaitingPayment => {
            "Great! Now you can buy a ticket, press the button".to_string()
        }
        ConversationState::ReadyDashboard => {
            format!("Success! You have a ticket to {event_title}!")
        }
        ConversationState::AdminDashboard => ADMIN_WELCOME.to_string(),
        ConversationState::AdminCheckin => CHECKIN_PROMPT.to_string(),
    }
}

/// Reply after the display name is captured.
pub fn ask_profile_link(name: &str) -> String {
    format!(
        "Hi, {name}! Now send us how to find you on VK.\nMake sure your profile is public!"
    )
}

/// One-paragraph user card for staff and for the user's own status.
pub fn user_card(user: &User, index: Option<&str>) -> String {
    let prefix = index.map(|i| format!("{i}. ")).unwrap_or_default();
    format!(
        "{prefix}{} => {}\nData: {} ({}) / {}\n{}\n",
        user.real_name().unwrap_or("-"),
        user.status().describe(),
        user.profile_name(),
        user.id(),
        user.handle(),
        user.vk().unwrap_or("no vk"),
    )
}

pub fn status_reply(user: &User) -> String {
    format!("Everything we know about you\n\n{}", user_card(user, None))
}

pub fn new_registration(user: &User) -> String {
    format!("New registration: {}", user_card(user, None))
}

pub fn purchase_notice(user: &User, purchase: &Purchase) -> String {
    format!(
        "\u{1F4B0} {} ({}) bought ticket '{}' for {}",
        user.display_name(),
        user.handle(),
        purchase.ticket_name(),
        format_amount(purchase.total_amount(), purchase.currency()),
    )
}

pub fn gift_notice(issuer: &User, user: &User, purchase: &Purchase) -> String {
    format!(
        "\u{1F39F} {} issued ticket '{}' to {} ({})",
        issuer.display_name(),
        purchase.ticket_name(),
        user.display_name(),
        user.handle(),
    )
}

pub fn gift_issued(user: &User) -> String {
    format!("\u{1F39F} TICKET ISSUED {}", user_card(user, None))
}

pub fn gift_already_owned(user: &User) -> String {
    format!(
        "\u{1F575} Maybe another admin already issued a ticket {}",
        user_card(user, None)
    )
}

pub fn gift_not_allowed(user: &User) -> String {
    format!(
        "User status {} does not allow issuing a ticket.",
        user.status()
    )
}

pub fn refund_alert(user_id: i64, purchase: &Purchase, owned: &str) -> String {
    format!(
        "\u{26A0} User {user_id} paid for '{}' ({}, charge {}) but already owns purchase {owned}. Refund needed.",
        purchase.ticket_name(),
        format_amount(purchase.total_amount(), purchase.currency()),
        purchase.id(),
    )
}

pub fn integrity_alert(user_id: i64, payload: &str, charge: &str) -> String {
    format!(
        "\u{203C} Payment {charge} from user {user_id} references unknown item '{payload}'. Investigate now."
    )
}

pub fn fulfillment_failed(user_id: i64, charge: &str, error: &dyn std::fmt::Display) -> String {
    format!("\u{203C} Payment {charge} from user {user_id} was not fulfilled: {error}")
}

pub fn checkin_success(purchase: &Purchase) -> String {
    format!("Checked in successfully!\n\n{}", purchase.detail())
}

pub fn checkin_repeat(purchase: &Purchase) -> String {
    format!(
        "ALREADY CHECKED IN! DO NOT FALL FOR STORIES FROM FRAUDSTERS!\n\n{}",
        purchase.detail()
    )
}

pub fn checkin_unreadable_detail(detail: &str) -> String {
    format!("{CHECKIN_UNREADABLE} Details: {detail}")
}

pub fn users_total(count: usize) -> String {
    format!("Total users: {count}")
}
