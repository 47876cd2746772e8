// SPDX-FileCopyrightText: 2026 Tixbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Handlers of the user conversation.

use tixbot_core::types::{Attachment, ConfirmedPayment, Invoice, PreCheckoutVerdict, Sender};
use tixbot_core::{ConversationState, Namespace, SessionKey, TixbotError};
use tracing::{error, info, warn};

use crate::bot::Bot;
use crate::entities::{Purchase, TicketType, User, UserStatus, timestamp};
use crate::fulfillment::validate_pre_checkout;
use crate::keyboard;
use crate::profile_link::canonical_profile_link;
use crate::recording;
use crate::texts;

impl Bot {
    /// `/start`: (re)create the user and ask for a name.
    ///
    /// Re-entering overwrites the collected profile and resets the status, except
    /// for ticket owners, whose record and dashboard are kept. The read and the
    /// reset happen under the user's ownership lock so a concurrent claim is
    /// either seen here or applied after the reset.
    pub(crate) async fn start(&self, sender: &Sender, chat_id: i64) -> Result<(), TixbotError> {
        let key = SessionKey::user(sender.id);
        let id = sender.id.to_string();

        let guard = self.ownership.lock(sender.id).await;
        let user = match self.users.find(&id).await? {
            Some(mut user) if user.purchase_id().is_some() => {
                user.refresh_profile(sender);
                self.users.save(&mut user).await?;
                self.sessions
                    .set_state(Namespace::User, key, Some(ConversationState::ReadyDashboard))
                    .await?;
                drop(guard);
                info!(user_id = sender.id, "ticket owner restarted, keeping dashboard");
                let menu = self.menu(&user).await?;
                self.say(
                    chat_id,
                    texts::state_prompt(ConversationState::ReadyDashboard, &self.settings.event_title),
                    Some(menu),
                )
                .await;
                return Ok(());
            }
            Some(mut user) => {
                user.reset(sender);
                self.users.save(&mut user).await?;
                user
            }
            None => match self.users.create(User::new(sender, timestamp())).await {
                Ok(user) => user,
                Err(TixbotError::AlreadyExists { .. }) => {
                    let mut user = self.users.load(&id).await?;
                    user.reset(sender);
                    self.users.save(&mut user).await?;
                    user
                }
                Err(e) => return Err(e),
            },
        };

        self.sessions
            .set_state(Namespace::User, key, Some(ConversationState::WaitingName))
            .await?;
        drop(guard);
        info!(user_id = sender.id, "registration started");

        let menu = self.menu(&user).await?;
        self.say(
            chat_id,
            texts::state_prompt(ConversationState::Starting, &self.settings.event_title),
            Some(menu),
        )
        .await;
        if let Some(suggestion) = keyboard::suggested_name(&sender.full_name()) {
            self.say(chat_id, texts::SUGGEST_NAME, Some(suggestion)).await;
        }
        Ok(())
    }

    /// WAITING_NAME: store the display name, ask for the profile link.
    pub(crate) async fn set_name(
        &self,
        sender: &Sender,
        chat_id: i64,
        name: &str,
    ) -> Result<(), TixbotError> {
        let mut user = self.users.load(&sender.id.to_string()).await?;
        user.set_real_name(name);
        self.users.save(&mut user).await?;
        self.sessions
            .set_state(
                Namespace::User,
                SessionKey::user(sender.id),
                Some(ConversationState::WaitingVk),
            )
            .await?;

        let menu = self.menu(&user).await?;
        self.say(
            chat_id,
            texts::ask_profile_link(user.real_name().unwrap_or_default()),
            Some(menu),
        )
        .await;
        Ok(())
    }

    /// WAITING_VK: validate the link, approve, and open the catalog.
    pub(crate) async fn set_profile_link(
        &self,
        sender: &Sender,
        chat_id: i64,
        text: &str,
    ) -> Result<(), TixbotError> {
        let Some(link) = canonical_profile_link(text) else {
            info!(user_id = sender.id, "rejected profile link");
            let user = self.users.load(&sender.id.to_string()).await?;
            let menu = self.menu(&user).await?;
            self.say(chat_id, texts::NOT_A_PROFILE_LINK, Some(menu)).await;
            return Ok(());
        };

        let guard = self.ownership.lock(sender.id).await;
        let mut user = self.users.load(&sender.id.to_string()).await?;
        if user.purchase_id().is_some() {
            drop(guard);
            return self.show_status(sender, chat_id).await;
        }
        user.set_vk(link);
        user.approve();
        self.users.save(&mut user).await?;
        self.sessions
            .set_state(
                Namespace::User,
                SessionKey::user(sender.id),
                Some(ConversationState::WaitingPayment),
            )
            .await?;
        drop(guard);
        info!(user_id = sender.id, status = %user.status(), "profile complete");

        let menu = self.menu(&user).await?;
        self.say(
            chat_id,
            texts::state_prompt(ConversationState::WaitingPayment, &self.settings.event_title),
            Some(menu),
        )
        .await;
        self.notify_admins(&texts::new_registration(&user)).await;
        Ok(())
    }

    /// WAITING_PAYMENT: one invoice per paid catalog item.
    pub(crate) async fn show_tickets(&self, sender: &Sender, chat_id: i64) -> Result<(), TixbotError> {
        let user = self.users.load(&sender.id.to_string()).await?;
        if user.status() != UserStatus::Approved {
            self.say(chat_id, texts::TOO_EARLY, None).await;
            return Ok(());
        }

        self.say(chat_id, texts::TICKETS_INTRO, None).await;
        for ticket in self.tickets.list(Some("order"), false).await? {
            if ticket.kind() != TicketType::Paid {
                continue;
            }
            let invoice = Invoice {
                title: format!("\u{1F39F} {}", ticket.id()),
                description: ticket.description().to_string(),
                payload: ticket.id().to_string(),
                currency: self.settings.currency.clone(),
                amount: ticket.price_minor(),
                photo_url: ticket.photo().map(str::to_string),
                max_tip_amount: self.settings.max_tip_amount,
                suggested_tips: self.settings.suggested_tips.clone(),
            };
            if let Err(e) = self.channel.send_invoice(chat_id, invoice).await {
                warn!(ticket = ticket.id(), error = %e, "failed to send invoice");
            }
        }
        Ok(())
    }

    /// READY_DASHBOARD: re-send the owned ticket, regenerating its image if missing.
    pub(crate) async fn show_my_ticket(&self, sender: &Sender, chat_id: i64) -> Result<(), TixbotError> {
        let user = self.users.load(&sender.id.to_string()).await?;
        let Some(purchase_id) = user.purchase_id() else {
            self.say(chat_id, texts::NO_TICKET_YET, None).await;
            return Ok(());
        };
        let purchase = self.purchases.load(purchase_id).await?;
        let menu = self.menu(&user).await?;
        self.say(chat_id, purchase.summary(), Some(menu)).await;

        let image = match self.artifacts.fetch(purchase.id()).await {
            Ok(Some(bytes)) => Some(bytes),
            Ok(None) => self.render_artifact(&purchase).await,
            Err(e) => {
                warn!(purchase_id = purchase.id(), error = %e, "artifact lookup failed, regenerating");
                self.render_artifact(&purchase).await
            }
        };
        if let Some(data) = image {
            self.send_artifact(chat_id, &purchase, data).await;
        }
        Ok(())
    }

    pub(crate) async fn show_status(&self, sender: &Sender, chat_id: i64) -> Result<(), TixbotError> {
        match self.users.find(&sender.id.to_string()).await? {
            Some(user) => {
                let menu = self.menu(&user).await?;
                self.say(chat_id, texts::status_reply(&user), Some(menu)).await;
            }
            None => self.say(chat_id, texts::NO_SESSION, None).await,
        }
        Ok(())
    }

    pub(crate) async fn show_info(&self, chat_id: i64) -> Result<(), TixbotError> {
        self.say(chat_id, self.settings.info_text.clone(), None).await;
        Ok(())
    }

    /// Repeat the current prompt, or point to `/start` without a session.
    pub(crate) async fn remind_state(
        &self,
        chat_id: i64,
        user_id: i64,
        state: Option<ConversationState>,
    ) -> Result<(), TixbotError> {
        match state {
            Some(state) => {
                let text = format!(
                    "{}\n{}",
                    texts::state_prompt(state, &self.settings.event_title),
                    texts::USE_BUTTONS
                );
                let menu = self.menu_for(user_id).await;
                self.say(chat_id, text, menu).await;
            }
            None => self.say(chat_id, texts::NO_SESSION, None).await,
        }
        Ok(())
    }

    /// Answer a payment pre-authorization. No side effects beyond the answer.
    pub(crate) async fn pre_checkout(
        &self,
        sender: &Sender,
        query_id: &str,
        payload: &str,
    ) -> Result<(), TixbotError> {
        let verdict = match validate_pre_checkout(&self.tickets, &self.users, payload, sender.id).await {
            Ok(ticket) => {
                info!(user_id = sender.id, ticket = ticket.id(), "pre-checkout accepted");
                PreCheckoutVerdict::Accept
            }
            Err(rejection) => {
                info!(user_id = sender.id, payload, reason = rejection.code(), "pre-checkout rejected");
                recording::record_rejection(rejection.code());
                PreCheckoutVerdict::Reject(rejection.to_string())
            }
        };
        self.channel.answer_pre_checkout(query_id, verdict).await
    }

    /// A completed payment: fulfill, and tell the buyer if money could not be matched.
    pub(crate) async fn payment_confirmed(
        &self,
        sender: &Sender,
        chat_id: i64,
        payment: &ConfirmedPayment,
    ) -> Result<(), TixbotError> {
        match self.fulfill_payment(sender, chat_id, payment).await {
            Ok(_) => Ok(()),
            Err(TixbotError::AlreadyExists { id, .. }) => {
                info!(charge = id, "duplicate payment confirmation ignored");
                Ok(())
            }
            Err(e @ (TixbotError::AlreadyOwned { .. } | TixbotError::Integrity(_))) => {
                self.say(chat_id, texts::PAYMENT_PROBLEM, None).await;
                Err(e)
            }
            Err(e) => {
                error!(user_id = sender.id, error = %e, "payment fulfillment failed");
                self.notify_admins(&texts::fulfillment_failed(
                    sender.id,
                    &payment.provider_payment_charge_id,
                    &e,
                ))
                .await;
                Err(e)
            }
        }
    }

    pub(crate) async fn send_artifact(&self, chat_id: i64, purchase: &Purchase, data: Vec<u8>) {
        let attachment = Attachment {
            file_name: format!("{}.png", purchase.id()),
            data,
            caption: Some(purchase.card(&self.settings.event_title).summary()),
        };
        if let Err(e) = self.channel.send_image(chat_id, attachment).await {
            warn!(purchase_id = purchase.id(), error = %e, "failed to deliver ticket image");
        }
    }
}
