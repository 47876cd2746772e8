// SPDX-FileCopyrightText: 2026 Tixbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Handlers of the admin conversation.
//!
//! Every event re-checks the admin flag from the store, so revoking the flag
//! takes effect on the next button press.

use tixbot_core::types::{Attachment, MessageId};
use tixbot_core::{ConversationState, InboundEvent, Namespace, SessionKey, TixbotError};
use tracing::{info, warn};

use crate::bot::Bot;
use crate::entities::User;
use crate::keyboard;
use crate::machine::AdminAction;
use crate::redemption::{CheckinOutcome, redeem};
use crate::report;
use crate::texts;

impl Bot {
    pub(crate) async fn handle_admin(
        &self,
        action: AdminAction,
        event: &InboundEvent,
    ) -> Result<(), TixbotError> {
        let sender = event.sender();
        let chat_id = event.chat_id();
        let callback_message = match event {
            InboundEvent::Callback { message_id, .. } => *message_id,
            _ => None,
        };

        let admin = match self.users.find(&sender.id.to_string()).await? {
            Some(user) if user.is_admin() => user,
            _ => {
                warn!(user_id = sender.id, action = ?action, "unauthorized admin request");
                self.reply_or_edit(chat_id, callback_message, texts::UNAUTHORIZED)
                    .await;
                return Ok(());
            }
        };

        match action {
            AdminAction::Enter | AdminAction::BackToDashboard => {
                self.set_admin_state(admin.id(), Some(ConversationState::AdminDashboard))
                    .await?;
                let text = if action == AdminAction::Enter {
                    texts::ADMIN_WELCOME
                } else {
                    texts::ADMIN_BACK_TO_DASHBOARD
                };
                self.say(chat_id, text, Some(keyboard::admin_menu())).await;
            }
            AdminAction::Stats => {
                let users = self.users.list(Some("created"), false).await?;
                let purchases = self.purchases.list(Some("created"), false).await?;
                let text = format!(
                    "{}\n{}",
                    report::user_statistics(&users),
                    report::purchase_statistics(&purchases, &self.settings.currency)
                );
                self.say(chat_id, text, Some(keyboard::admin_menu())).await;
            }
            AdminAction::Csv => {
                let purchases = self.purchases.list(Some("created"), false).await?;
                let data = report::purchases_csv(&purchases)?;
                info!(user_id = admin.id(), rows = purchases.len(), "purchases exported");
                let document = Attachment {
                    file_name: "purchases.csv".to_string(),
                    data,
                    caption: None,
                };
                if let Err(e) = self.channel.send_document(chat_id, document).await {
                    warn!(error = %e, "failed to deliver purchases export");
                }
            }
            AdminAction::AllUsers => {
                let users = self.users.list(Some("created"), false).await?;
                let chunks = report::user_list(&users, report::MESSAGE_LIMIT);
                let last = chunks.len().saturating_sub(1);
                for (i, chunk) in chunks.into_iter().enumerate() {
                    let menu = (i == last).then(keyboard::admin_menu);
                    self.say(chat_id, chunk, menu).await;
                }
            }
            AdminAction::Checkin => {
                self.set_admin_state(admin.id(), Some(ConversationState::AdminCheckin))
                    .await?;
                self.say(chat_id, texts::CHECKIN_PROMPT, Some(keyboard::checkin_menu()))
                    .await;
            }
            AdminAction::ShowUser(user_id) => self.show_user_card(chat_id, user_id).await?,
            AdminAction::Gift(user_id) => {
                self.gift(&admin, chat_id, callback_message, user_id).await?
            }
            AdminAction::Exit => {
                self.set_admin_state(admin.id(), None).await?;
                let menu = self.menu(&admin).await?;
                self.say(chat_id, texts::ADMIN_BYE, Some(menu)).await;
            }
            AdminAction::RedeemPhoto => {
                let InboundEvent::Photo { image, .. } = event else {
                    return Ok(());
                };
                self.say(chat_id, texts::CHECKIN_DECODING, None).await;
                match self.decoder.decode(image).await {
                    Ok(code) => self.check_in(chat_id, &code).await?,
                    Err(TixbotError::Validation(detail)) => {
                        info!(user_id = admin.id(), detail = detail.as_str(), "unreadable ticket photo");
                        self.say(
                            chat_id,
                            texts::checkin_unreadable_detail(&detail),
                            Some(keyboard::checkin_menu()),
                        )
                        .await;
                    }
                    Err(e) => {
                        warn!(error = %e, "code decoder unavailable");
                        self.say(chat_id, texts::CHECKIN_UNREADABLE, Some(keyboard::checkin_menu()))
                            .await;
                    }
                }
            }
            AdminAction::RedeemText(code) => self.check_in(chat_id, &code).await?,
        }
        Ok(())
    }

    async fn set_admin_state(
        &self,
        user_id: i64,
        state: Option<ConversationState>,
    ) -> Result<(), TixbotError> {
        self.sessions
            .set_state(Namespace::Admin, SessionKey::user(user_id), state)
            .await
    }

    async fn show_user_card(&self, chat_id: i64, user_id: i64) -> Result<(), TixbotError> {
        let Some(user) = self.users.find(&user_id.to_string()).await? else {
            self.say(chat_id, texts::UNKNOWN_COMMAND, Some(keyboard::admin_menu()))
                .await;
            return Ok(());
        };
        let mut text = texts::user_card(&user, None);
        if let Some(purchase_id) = user.purchase_id() {
            match self.purchases.find(purchase_id).await? {
                Some(purchase) => {
                    text.push('\n');
                    text.push_str(&purchase.detail());
                }
                None => warn!(user_id, purchase_id, "user links a missing purchase"),
            }
        }
        self.say(chat_id, text, keyboard::gift_button(&user)).await;
        Ok(())
    }

    async fn gift(
        &self,
        admin: &User,
        chat_id: i64,
        message_id: Option<MessageId>,
        user_id: i64,
    ) -> Result<(), TixbotError> {
        let text = match self.issue_gift(admin, user_id).await {
            Ok(_) => texts::gift_issued(&self.users.load(&user_id.to_string()).await?),
            Err(TixbotError::AlreadyOwned { .. }) => {
                texts::gift_already_owned(&self.users.load(&user_id.to_string()).await?)
            }
            Err(TixbotError::Validation(_)) => {
                texts::gift_not_allowed(&self.users.load(&user_id.to_string()).await?)
            }
            Err(e) => return Err(e),
        };
        self.reply_or_edit(chat_id, message_id, &text).await;
        Ok(())
    }

    /// Redeem `code` and report the outcome to the operator.
    async fn check_in(&self, chat_id: i64, code: &str) -> Result<(), TixbotError> {
        self.say(chat_id, texts::CHECKIN_CHECKING, None).await;
        let text = match redeem(&self.purchases, code).await? {
            CheckinOutcome::Redeemed(purchase) => texts::checkin_success(&purchase),
            CheckinOutcome::AlreadyRedeemed(purchase) => texts::checkin_repeat(&purchase),
            CheckinOutcome::Unknown => texts::CHECKIN_UNKNOWN.to_string(),
        };
        self.say(chat_id, text, Some(keyboard::checkin_menu())).await;
        Ok(())
    }

    /// Edit the pressed message when there is one, otherwise send a new one.
    async fn reply_or_edit(&self, chat_id: i64, message_id: Option<MessageId>, text: &str) {
        if let Some(message_id) = message_id {
            match self.channel.edit_message(chat_id, message_id, text).await {
                Ok(()) => return,
                Err(e) => warn!(error = %e, "failed to edit message, sending instead"),
            }
        }
        self.say(chat_id, text, None).await;
    }
}
