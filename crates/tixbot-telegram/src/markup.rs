// SPDX-FileCopyrightText: 2026 Tixbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Keyboards as Telegram reply markup.

use teloxide::types::{
    InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup, KeyboardRemove,
    ReplyMarkup,
};
use tixbot_core::types::Keyboard;

pub fn to_reply_markup(keyboard: &Keyboard) -> ReplyMarkup {
    match keyboard {
        Keyboard::Reply(rows) => {
            let rows = rows
                .iter()
                .map(|row| row.iter().map(|label| KeyboardButton::new(label.clone())).collect::<Vec<_>>());
            ReplyMarkup::Keyboard(KeyboardMarkup {
                resize_keyboard: true,
                ..KeyboardMarkup::new(rows)
            })
        }
        Keyboard::Inline(rows) => {
            let rows = rows.iter().map(|row| {
                row.iter()
                    .map(|b| InlineKeyboardButton::callback(b.label.clone(), b.data.clone()))
                    .collect::<Vec<_>>()
            });
            ReplyMarkup::InlineKeyboard(InlineKeyboardMarkup::new(rows))
        }
        Keyboard::Remove => ReplyMarkup::KeyboardRemove(KeyboardRemove::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use teloxide::types::InlineKeyboardButtonKind;
    use tixbot_core::types::InlineButton;

    #[test]
    fn reply_keyboard_keeps_rows_and_resizes() {
        let markup = to_reply_markup(&Keyboard::Reply(vec![
            vec!["Tickets".into(), "My ticket".into()],
            vec!["Admin".into()],
        ]));
        match markup {
            ReplyMarkup::Keyboard(k) => {
                assert!(k.resize_keyboard);
                assert_eq!(k.keyboard.len(), 2);
                assert_eq!(k.keyboard[0][1].text, "My ticket");
                assert_eq!(k.keyboard[1][0].text, "Admin");
            }
            other => panic!("expected reply keyboard, got {other:?}"),
        }
    }

    #[test]
    fn inline_buttons_carry_callback_data() {
        let markup = to_reply_markup(&Keyboard::Inline(vec![vec![InlineButton::new(
            "Issue ticket",
            "Gift:5",
        )]]));
        match markup {
            ReplyMarkup::InlineKeyboard(k) => {
                let button = &k.inline_keyboard[0][0];
                assert_eq!(button.text, "Issue ticket");
                assert!(matches!(
                    &button.kind,
                    InlineKeyboardButtonKind::CallbackData(data) if data == "Gift:5"
                ));
            }
            other => panic!("expected inline keyboard, got {other:?}"),
        }
    }

    #[test]
    fn remove_hides_keyboard() {
        assert!(matches!(
            to_reply_markup(&Keyboard::Remove),
            ReplyMarkup::KeyboardRemove(_)
        ));
    }
}
