// SPDX-FileCopyrightText: 2026 Tixbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Payment eligibility and purchase fulfillment.
//!
//! A purchase is created exactly once per charge reference (create-if-absent),
//! and linked to its owner with a conditional write on `purchase_id`, under a
//! per-user lock. Artifact generation and delivery happen after the commit and
//! never roll it back.

use thiserror::Error;
use tixbot_core::types::{ConfirmedPayment, Sender};
use tixbot_core::{ConversationState, Namespace, SessionKey, TixbotError};
use tracing::{error, info, warn};

use crate::bot::Bot;
use crate::entities::{Purchase, Ticket, TicketType, User, UserStatus, timestamp};
use crate::recording;
use crate::store::Collection;
use crate::texts;

/// Why a payment pre-authorization was refused. `Display` is shown to the payer.
#[derive(Debug, Error)]
pub enum Rejection {
    #[error("The invoice payload is empty")]
    EmptyPayload,

    #[error("There is no ticket with id {0}")]
    UnknownTicket(String),

    #[error("This ticket is no longer on sale")]
    NotForSale,

    #[error("There is no user with id {0}, send /start first")]
    UnknownUser(i64),

    #[error("You already have a ticket. If you just want to support us, write to the organizers!")]
    AlreadyPurchased,

    #[error("User {name} with id {id} and status {status} is not approved for purchase")]
    NotApproved {
        name: String,
        id: i64,
        status: UserStatus,
    },

    #[error("Payments are temporarily unavailable, please try again later")]
    Unavailable(#[source] TixbotError),
}

impl Rejection {
    /// Stable label for logs and metrics.
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyPayload => "empty_payload",
            Self::UnknownTicket(_) => "unknown_ticket",
            Self::NotForSale => "not_for_sale",
            Self::UnknownUser(_) => "unknown_user",
            Self::AlreadyPurchased => "already_purchased",
            Self::NotApproved { .. } => "not_approved",
            Self::Unavailable(_) => "unavailable",
        }
    }
}

/// Decide whether `requester` may pay for the item named by `payload`.
///
/// Checks run in a fixed order so that existence errors come before
/// eligibility errors. Reads only.
pub async fn validate_pre_checkout(
    tickets: &Collection<Ticket>,
    users: &Collection<User>,
    payload: &str,
    requester: i64,
) -> Result<Ticket, Rejection> {
    if payload.trim().is_empty() {
        return Err(Rejection::EmptyPayload);
    }
    let ticket = tickets
        .find(payload)
        .await
        .map_err(Rejection::Unavailable)?
        .ok_or_else(|| Rejection::UnknownTicket(payload.to_string()))?;
    if ticket.kind() != TicketType::Paid {
        return Err(Rejection::NotForSale);
    }
    let user = users
        .find(&requester.to_string())
        .await
        .map_err(Rejection::Unavailable)?
        .ok_or(Rejection::UnknownUser(requester))?;
    if user.status() == UserStatus::Ready || user.purchase_id().is_some() {
        return Err(Rejection::AlreadyPurchased);
    }
    if user.status() != UserStatus::Approved {
        return Err(Rejection::NotApproved {
            name: user.display_name(),
            id: user.id(),
            status: user.status(),
        });
    }
    Ok(ticket)
}

impl Bot {
    /// Turn a confirmed payment into a purchase owned by the payer.
    ///
    /// Errors:
    /// - `Integrity` when the payload names no catalog item (operators are alerted)
    /// - `AlreadyExists` when this charge was already fulfilled
    /// - `AlreadyOwned` when the payer owns another purchase; the payment stays
    ///   recorded and operators are alerted to refund
    pub async fn fulfill_payment(
        &self,
        sender: &Sender,
        chat_id: i64,
        payment: &ConfirmedPayment,
    ) -> Result<Purchase, TixbotError> {
        let charge = payment.provider_payment_charge_id.as_str();
        let Some(ticket) = self.tickets.find(&payment.payload).await? else {
            error!(
                user_id = sender.id,
                payload = payment.payload.as_str(),
                charge,
                total_amount = payment.total_amount,
                "confirmed payment references an unknown item"
            );
            self.notify_admins(&texts::integrity_alert(sender.id, &payment.payload, charge))
                .await;
            return Err(TixbotError::Integrity(format!(
                "payment {charge} references unknown item '{}'",
                payment.payload
            )));
        };

        let _guard = self.ownership.lock(sender.id).await;
        let mut buyer = self.buyer(sender).await?;

        let purchase = self
            .purchases
            .create(Purchase::paid(&ticket, &buyer, payment, timestamp()))
            .await?;
        info!(
            purchase_id = purchase.id(),
            user_id = sender.id,
            ticket = purchase.ticket_name(),
            total_amount = purchase.total_amount(),
            "purchase recorded"
        );
        recording::record_purchase("paid");

        let artifact = self.render_artifact(&purchase).await;

        if !self.claim_ownership(&mut buyer, &purchase).await? {
            let owned = self
                .users
                .load(&sender.id.to_string())
                .await?
                .purchase_id()
                .unwrap_or_default()
                .to_string();
            error!(
                user_id = sender.id,
                purchase_id = purchase.id(),
                owned = owned.as_str(),
                "payment from a user who already owns a ticket"
            );
            self.notify_admins(&texts::refund_alert(sender.id, &purchase, &owned))
                .await;
            return Err(TixbotError::AlreadyOwned {
                user_id: sender.id,
                purchase_id: owned,
            });
        }

        self.deliver(chat_id, &buyer, &purchase, artifact).await;
        self.notify_admins(&texts::purchase_notice(&buyer, &purchase))
            .await;
        Ok(purchase)
    }

    /// Issue a complimentary ticket to `target_id` on behalf of `issuer`.
    ///
    /// Eligibility is re-checked under the target's ownership lock. Errors:
    /// `AlreadyOwned` when the target owns a ticket, `Validation` when the
    /// target is not APPROVED, `NotFound` when the target or a free catalog
    /// item is missing.
    pub async fn issue_gift(&self, issuer: &User, target_id: i64) -> Result<Purchase, TixbotError> {
        if !issuer.is_admin() {
            return Err(TixbotError::Unauthorized {
                user_id: issuer.id(),
            });
        }

        let _guard = self.ownership.lock(target_id).await;
        let mut target = self.users.load(&target_id.to_string()).await?;
        if let Some(owned) = target.purchase_id() {
            return Err(TixbotError::AlreadyOwned {
                user_id: target_id,
                purchase_id: owned.to_string(),
            });
        }
        if target.status() != UserStatus::Approved {
            return Err(TixbotError::Validation(format!(
                "user {target_id} has status {} and cannot receive a ticket",
                target.status()
            )));
        }

        let ticket = self
            .tickets
            .list(Some("order"), false)
            .await?
            .into_iter()
            .find(|t| t.kind() == TicketType::Free)
            .ok_or_else(|| TixbotError::not_found("tickets", "<free>"))?;

        let purchase = self
            .purchases
            .create(Purchase::gift(
                uuid::Uuid::new_v4().to_string(),
                &ticket,
                &target,
                issuer,
                &self.settings.currency,
                timestamp(),
            ))
            .await?;
        info!(
            purchase_id = purchase.id(),
            user_id = target_id,
            issuer = issuer.id(),
            ticket = purchase.ticket_name(),
            "gift recorded"
        );
        recording::record_purchase("gift");

        let artifact = self.render_artifact(&purchase).await;

        if !self.claim_ownership(&mut target, &purchase).await? {
            warn!(
                user_id = target_id,
                purchase_id = purchase.id(),
                "gift lost the ownership race, left unlinked"
            );
            let owned = self.users.load(&target_id.to_string()).await?;
            return Err(TixbotError::AlreadyOwned {
                user_id: target_id,
                purchase_id: owned.purchase_id().unwrap_or_default().to_string(),
            });
        }

        self.deliver(target_id, &target, &purchase, artifact).await;
        self.notify_admins(&texts::gift_notice(issuer, &target, &purchase))
            .await;
        Ok(purchase)
    }

    /// The payer's record, created when a payment arrives from an unknown user.
    async fn buyer(&self, sender: &Sender) -> Result<User, TixbotError> {
        if let Some(user) = self.users.find(&sender.id.to_string()).await? {
            return Ok(user);
        }
        warn!(user_id = sender.id, "payment from unregistered user, creating record");
        match self.users.create(User::new(sender, timestamp())).await {
            Ok(user) => Ok(user),
            Err(TixbotError::AlreadyExists { .. }) => self.users.load(&sender.id.to_string()).await,
            Err(e) => Err(e),
        }
    }

    /// Link `purchase` to `user` only if the user owns nothing yet, then move
    /// the user to READY_DASHBOARD.
    async fn claim_ownership(&self, user: &mut User, purchase: &Purchase) -> Result<bool, TixbotError> {
        user.link_purchase(purchase.id());
        if !self.users.save_if_absent(user, "purchase_id").await? {
            return Ok(false);
        }
        self.sessions
            .set_state(
                Namespace::User,
                SessionKey::user(user.id()),
                Some(ConversationState::ReadyDashboard),
            )
            .await?;
        info!(user_id = user.id(), purchase_id = purchase.id(), "ticket linked");
        Ok(true)
    }

    /// Render the ticket image. Failure is logged; the image can be regenerated later.
    pub(crate) async fn render_artifact(&self, purchase: &Purchase) -> Option<Vec<u8>> {
        match self
            .artifacts
            .generate(&purchase.card(&self.settings.event_title))
            .await
        {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!(purchase_id = purchase.id(), error = %e, "artifact generation failed");
                None
            }
        }
    }

    /// Confirmation, summary, and ticket image for the owner. Best effort.
    async fn deliver(&self, chat_id: i64, owner: &User, purchase: &Purchase, artifact: Option<Vec<u8>>) {
        let menu = match self.menu(owner).await {
            Ok(menu) => Some(menu),
            Err(e) => {
                warn!(user_id = owner.id(), error = %e, "could not resolve menu for delivery");
                None
            }
        };
        self.say(
            chat_id,
            texts::state_prompt(ConversationState::ReadyDashboard, &self.settings.event_title),
            menu,
        )
        .await;
        self.say(chat_id, purchase.summary(), None).await;
        if let Some(data) = artifact {
            self.send_artifact(chat_id, purchase, data).await;
        }
    }
}
