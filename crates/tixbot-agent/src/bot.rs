// SPDX-FileCopyrightText: 2026 Tixbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The event handler shared by all in-flight events.
//!
//! [`Bot::handle`] resolves both conversation states, routes the event, and
//! runs the matching handler. Handlers live in [`crate::handlers`] and
//! [`crate::fulfillment`].

use std::sync::Arc;

use tixbot_config::model::TixbotConfig;
use tixbot_core::types::{Keyboard, OutboundMessage};
use tixbot_core::{
    ArtifactStore, ChannelAdapter, CodeDecoder, ConversationState, InboundEvent, Namespace,
    SessionKey, StorageAdapter, TixbotError,
};
use tracing::{debug, warn};

use crate::entities::{Purchase, Ticket, User};
use crate::keyboard;
use crate::locks::KeyedLocks;
use crate::machine::{self, Action};
use crate::recording;
use crate::session::SessionTracker;
use crate::store::Collection;

/// Bot settings taken from configuration.
#[derive(Debug, Clone)]
pub struct BotSettings {
    pub event_title: String,
    pub info_text: String,
    pub currency: String,
    pub max_tip_amount: i64,
    pub suggested_tips: Vec<i64>,
}

impl BotSettings {
    pub fn from_config(config: &TixbotConfig) -> Self {
        Self {
            event_title: config.bot.event_title.clone(),
            info_text: config.bot.info_text.clone(),
            currency: config.bot.currency.clone(),
            max_tip_amount: config.telegram.max_tip_amount,
            suggested_tips: config.telegram.suggested_tips.clone(),
        }
    }
}

impl Default for BotSettings {
    fn default() -> Self {
        Self::from_config(&TixbotConfig::default())
    }
}

/// Conversation handler with every collaborator it needs.
pub struct Bot {
    pub(crate) settings: BotSettings,
    pub(crate) channel: Arc<dyn ChannelAdapter>,
    pub(crate) artifacts: Arc<dyn ArtifactStore>,
    pub(crate) decoder: Arc<dyn CodeDecoder>,
    pub(crate) users: Collection<User>,
    pub(crate) tickets: Collection<Ticket>,
    pub(crate) purchases: Collection<Purchase>,
    pub(crate) sessions: SessionTracker,
    /// Serializes ownership changes per target user.
    pub(crate) ownership: KeyedLocks<i64>,
}

impl Bot {
    pub fn new(
        settings: BotSettings,
        storage: Arc<dyn StorageAdapter>,
        channel: Arc<dyn ChannelAdapter>,
        artifacts: Arc<dyn ArtifactStore>,
        decoder: Arc<dyn CodeDecoder>,
    ) -> Self {
        Self {
            settings,
            channel,
            artifacts,
            decoder,
            users: Collection::new(storage.clone()),
            tickets: Collection::new(storage.clone()),
            purchases: Collection::new(storage.clone()),
            sessions: SessionTracker::new(storage),
            ownership: KeyedLocks::new(),
        }
    }

    pub fn settings(&self) -> &BotSettings {
        &self.settings
    }

    pub fn users(&self) -> &Collection<User> {
        &self.users
    }

    pub fn tickets(&self) -> &Collection<Ticket> {
        &self.tickets
    }

    pub fn purchases(&self) -> &Collection<Purchase> {
        &self.purchases
    }

    pub fn sessions(&self) -> &SessionTracker {
        &self.sessions
    }

    /// Handle one inbound event to completion.
    ///
    /// Callers must serialize events of the same session key.
    pub async fn handle(&self, event: InboundEvent) -> Result<(), TixbotError> {
        let key = event.session_key();
        let user_state = self.sessions.resolve(Namespace::User, key).await?;
        let admin_state = self.sessions.resolve(Namespace::Admin, key).await?;
        let action = machine::route(&event, user_state, admin_state);
        recording::record_event(event.kind());
        debug!(
            user_id = key.user_id,
            kind = event.kind(),
            user_state = ?user_state,
            admin_state = ?admin_state,
            action = ?action,
            "routing event"
        );

        let chat_id = event.chat_id();
        let result = self.dispatch(action, &event, user_state).await;

        if let InboundEvent::Callback { callback_id, .. } = &event
            && let Err(e) = self.channel.answer_callback(callback_id).await
        {
            debug!(error = %e, "failed to answer callback");
        }

        match result {
            Err(e) if e.is_user_facing() => {
                debug!(user_id = key.user_id, error = %e, "recoverable error, re-prompting");
                self.remind(chat_id, key).await
            }
            other => other,
        }
    }

    async fn dispatch(
        &self,
        action: Action,
        event: &InboundEvent,
        user_state: Option<ConversationState>,
    ) -> Result<(), TixbotError> {
        let sender = event.sender();
        let chat_id = event.chat_id();
        match action {
            Action::ShowStatus => self.show_status(sender, chat_id).await,
            Action::ShowInfo => self.show_info(chat_id).await,
            Action::Admin(admin) => self.handle_admin(admin, event).await,
            Action::Start => self.start(sender, chat_id).await,
            Action::SetName(name) | Action::SetNameFromButton(name) => {
                self.set_name(sender, chat_id, &name).await
            }
            Action::SetProfileLink(text) => self.set_profile_link(sender, chat_id, &text).await,
            Action::ShowTickets => self.show_tickets(sender, chat_id).await,
            Action::ShowMyTicket => self.show_my_ticket(sender, chat_id).await,
            Action::PreCheckout => match event {
                InboundEvent::PreCheckout {
                    query_id, payload, ..
                } => self.pre_checkout(sender, query_id, payload).await,
                _ => Ok(()),
            },
            Action::PaymentConfirmed => match event {
                InboundEvent::PaymentConfirmed { payment, .. } => {
                    self.payment_confirmed(sender, chat_id, payment).await
                }
                _ => Ok(()),
            },
            Action::Remind(_) => self.remind_state(chat_id, sender.id, user_state).await,
            Action::Ignore => Ok(()),
        }
    }

    // --- Shared helpers ---

    /// Send a message. Failures are logged and swallowed: state is already persisted.
    pub(crate) async fn say(&self, chat_id: i64, text: impl Into<String>, keyboard: Option<Keyboard>) {
        let mut msg = OutboundMessage::text(chat_id, text);
        msg.keyboard = keyboard;
        if let Err(e) = self.channel.send(msg).await {
            warn!(chat_id, error = %e, "failed to deliver message");
        }
    }

    /// The user's menu from freshly resolved states.
    pub(crate) async fn menu(&self, user: &User) -> Result<Keyboard, TixbotError> {
        let key = SessionKey::user(user.id());
        let user_state = self.sessions.resolve(Namespace::User, key).await?;
        let admin_state = self.sessions.resolve(Namespace::Admin, key).await?;
        Ok(keyboard::user_menu(user, user_state, admin_state))
    }

    /// Menu for `user_id`, or none if the user is unknown or the store fails.
    pub(crate) async fn menu_for(&self, user_id: i64) -> Option<Keyboard> {
        let user = match self.users.find(&user_id.to_string()).await {
            Ok(user) => user?,
            Err(e) => {
                warn!(user_id, error = %e, "could not load user for menu");
                return None;
            }
        };
        match self.menu(&user).await {
            Ok(menu) => Some(menu),
            Err(e) => {
                warn!(user_id, error = %e, "could not resolve menu");
                None
            }
        }
    }

    /// Every user flagged as admin.
    pub(crate) async fn admins(&self) -> Result<Vec<User>, TixbotError> {
        Ok(self
            .users
            .list(Some("created"), false)
            .await?
            .into_iter()
            .filter(User::is_admin)
            .collect())
    }

    /// Best-effort message to every admin.
    pub(crate) async fn notify_admins(&self, text: &str) {
        match self.admins().await {
            Ok(admins) => {
                for admin in admins {
                    self.say(admin.id(), text, None).await;
                }
            }
            Err(e) => warn!(error = %e, "could not list admins for notification"),
        }
    }

    async fn remind(&self, chat_id: i64, key: SessionKey) -> Result<(), TixbotError> {
        let state = self.sessions.resolve(Namespace::User, key).await?;
        self.remind_state(chat_id, key.user_id, state).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_follow_config_defaults() {
        let settings = BotSettings::default();
        assert_eq!(settings.currency, "RUB");
        assert!(!settings.event_title.is_empty());
        assert!(settings.suggested_tips.len() <= 4);
    }
}
