// SPDX-FileCopyrightText: 2026 Tixbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reply keyboards derived from conversation state.

use tixbot_core::ConversationState;
use tixbot_core::types::{InlineButton, Keyboard};

use crate::entities::{User, UserStatus};
use crate::texts::{
    BUTTON_ADMIN, BUTTON_ADMIN_ALL, BUTTON_ADMIN_CHECKIN, BUTTON_ADMIN_CSV, BUTTON_ADMIN_STATS,
    BUTTON_BACK, BUTTON_GIFT, BUTTON_INFO, BUTTON_MY_TICKET, BUTTON_STATUS, BUTTON_TICKETS,
    CALLBACK_GIFT, CALLBACK_REALNAME,
};

fn row(labels: &[&str]) -> Vec<String> {
    labels.iter().map(|l| l.to_string()).collect()
}

fn admin_rows() -> Vec<Vec<String>> {
    vec![
        row(&[BUTTON_ADMIN_CSV, BUTTON_ADMIN_STATS, BUTTON_ADMIN_CHECKIN]),
        row(&[BUTTON_ADMIN_ALL, BUTTON_BACK]),
    ]
}

/// The admin dashboard keyboard.
pub fn admin_menu() -> Keyboard {
    Keyboard::Reply(admin_rows())
}

/// Single Back button shown during check-in.
pub fn checkin_menu() -> Keyboard {
    Keyboard::Reply(vec![row(&[BUTTON_BACK])])
}

/// The user's menu for the given states.
///
/// An admin with an open admin conversation sees the admin rows instead of
/// the informational row.
pub fn user_menu(
    user: &User,
    user_state: Option<ConversationState>,
    admin_state: Option<ConversationState>,
) -> Keyboard {
    let mut rows = Vec::new();
    match user_state {
        Some(ConversationState::WaitingPayment) => rows.push(row(&[BUTTON_TICKETS])),
        Some(ConversationState::ReadyDashboard) => rows.push(row(&[BUTTON_MY_TICKET])),
        _ => {}
    }

    let mut bottom = row(&[BUTTON_STATUS, BUTTON_INFO]);
    if user.is_admin() {
        match admin_state {
            Some(ConversationState::AdminCheckin) => return checkin_menu(),
            Some(_) => {
                rows.extend(admin_rows());
                return Keyboard::Reply(rows);
            }
            None => bottom.push(BUTTON_ADMIN.to_string()),
        }
    }
    rows.push(bottom);
    Keyboard::Reply(rows)
}

/// Inline suggestion of the transport profile name.
pub fn suggested_name(name: &str) -> Option<Keyboard> {
    let name = name.trim();
    // Callback data is capped at 64 bytes by the platform.
    let data = format!("{CALLBACK_REALNAME}:{name}");
    (!name.is_empty() && data.len() <= 64)
        .then(|| Keyboard::Inline(vec![vec![InlineButton::new(name, data)]]))
}

/// Gift button for a user card, when the user may receive one.
pub fn gift_button(user: &User) -> Option<Keyboard> {
    (user.purchase_id().is_none() && user.status() == UserStatus::Approved).then(|| {
        Keyboard::Inline(vec![vec![InlineButton::new(
            BUTTON_GIFT,
            format!("{CALLBACK_GIFT}:{}", user.id()),
        )]])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tixbot_core::types::Sender;

    fn user() -> User {
        User::new(
            &Sender {
                id: 5,
                first_name: "Ivan".into(),
                last_name: None,
                username: None,
            },
            "t".into(),
        )
    }

    fn rows(k: Keyboard) -> Vec<Vec<String>> {
        match k {
            Keyboard::Reply(rows) => rows,
            other => panic!("expected reply keyboard, got {other:?}"),
        }
    }

    #[test]
    fn menu_follows_user_state() {
        let u = user();
        assert_eq!(
            rows(user_menu(&u, Some(ConversationState::WaitingPayment), None))[0],
            vec![BUTTON_TICKETS]
        );
        assert_eq!(
            rows(user_menu(&u, Some(ConversationState::ReadyDashboard), None))[0],
            vec![BUTTON_MY_TICKET]
        );
        assert_eq!(
            rows(user_menu(&u, None, None)),
            vec![vec![BUTTON_STATUS, BUTTON_INFO]]
        );
    }

    #[test]
    fn suggested_name_respects_callback_limit() {
        assert!(suggested_name("Ivan").is_some());
        assert!(suggested_name("   ").is_none());
        assert!(suggested_name(&"x".repeat(80)).is_none());
    }

    #[test]
    fn gift_button_only_for_approved_without_purchase() {
        let mut u = user();
        assert!(gift_button(&u).is_none());
        u.approve();
        match gift_button(&u) {
            Some(Keyboard::Inline(buttons)) => assert_eq!(buttons[0][0].data, "Gift:5"),
            other => panic!("unexpected {other:?}"),
        }
        u.link_purchase("p1");
        assert!(gift_button(&u).is_none());
    }
}
