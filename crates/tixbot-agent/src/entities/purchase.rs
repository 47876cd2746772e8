// SPDX-FileCopyrightText: 2026 Tixbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fulfilled acquisitions, paid or gifted.

use serde::{Deserialize, Serialize};
use tixbot_core::types::{ConfirmedPayment, TicketCard};

use super::{Ticket, User, format_amount};
use crate::store::{DirtyFields, Document};

/// A durable purchase record.
///
/// The ticket fields are a snapshot taken at purchase time and never follow
/// later catalog edits. Only `activated` can change after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Purchase {
    id: String,
    ticket_name: String,
    ticket_base_price: i64,
    #[serde(default)]
    ticket_description: String,
    currency: String,
    total_amount: i64,
    #[serde(default)]
    customer_name: Option<String>,
    #[serde(default)]
    phone_number: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    provider_payment_charge_id: Option<String>,
    #[serde(default)]
    telegram_payment_charge_id: Option<String>,
    user: i64,
    #[serde(default)]
    user_name: Option<String>,
    #[serde(default)]
    user_username: Option<String>,
    #[serde(default)]
    issuer: Option<i64>,
    #[serde(default)]
    issuer_name: Option<String>,
    #[serde(default)]
    issuer_username: Option<String>,
    created: String,
    #[serde(default)]
    activated: Option<String>,
    #[serde(skip)]
    dirty: DirtyFields,
}

impl Document for Purchase {
    const COLLECTION: &'static str = "purchases";
    const READ_ONLY: &'static [&'static str] = &[
        "id",
        "ticket_name",
        "ticket_base_price",
        "ticket_description",
        "currency",
        "total_amount",
        "customer_name",
        "phone_number",
        "email",
        "provider_payment_charge_id",
        "telegram_payment_charge_id",
        "user",
        "user_name",
        "user_username",
        "issuer",
        "issuer_name",
        "issuer_username",
        "created",
    ];

    fn key(&self) -> String {
        self.id.clone()
    }

    fn dirty(&self) -> &DirtyFields {
        &self.dirty
    }

    fn dirty_mut(&mut self) -> &mut DirtyFields {
        &mut self.dirty
    }
}

impl Purchase {
    fn snapshot(id: String, ticket: &Ticket, owner: &User, created: String) -> Self {
        Self {
            id,
            ticket_name: ticket.id().to_string(),
            ticket_base_price: ticket.price(),
            ticket_description: ticket.description().to_string(),
            currency: String::new(),
            total_amount: 0,
            customer_name: None,
            phone_number: None,
            email: None,
            provider_payment_charge_id: None,
            telegram_payment_charge_id: None,
            user: owner.id(),
            user_name: owner.real_name().map(str::to_string),
            user_username: Some(owner.handle()),
            issuer: None,
            issuer_name: None,
            issuer_username: None,
            created,
            activated: None,
            dirty: DirtyFields::default(),
        }
    }

    /// A purchase keyed by the provider's charge reference.
    pub fn paid(ticket: &Ticket, buyer: &User, payment: &ConfirmedPayment, created: String) -> Self {
        let mut purchase = Self::snapshot(
            payment.provider_payment_charge_id.clone(),
            ticket,
            buyer,
            created,
        );
        purchase.currency = payment.currency.clone();
        purchase.total_amount = payment.total_amount;
        purchase.customer_name = payment.order.name.clone();
        purchase.phone_number = payment.order.phone_number.clone();
        purchase.email = payment.order.email.clone();
        purchase.provider_payment_charge_id = Some(payment.provider_payment_charge_id.clone());
        purchase.telegram_payment_charge_id = Some(payment.telegram_payment_charge_id.clone());
        purchase
    }

    /// A complimentary purchase issued by an admin.
    pub fn gift(
        id: String,
        ticket: &Ticket,
        owner: &User,
        issuer: &User,
        currency: &str,
        created: String,
    ) -> Self {
        let mut purchase = Self::snapshot(id, ticket, owner, created);
        purchase.currency = currency.to_string();
        purchase.total_amount = ticket.price_minor();
        purchase.issuer = Some(issuer.id());
        purchase.issuer_name = issuer.real_name().map(str::to_string);
        purchase.issuer_username = Some(issuer.handle());
        purchase
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn ticket_name(&self) -> &str {
        &self.ticket_name
    }

    pub fn ticket_base_price(&self) -> i64 {
        self.ticket_base_price
    }

    pub fn ticket_description(&self) -> &str {
        &self.ticket_description
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn total_amount(&self) -> i64 {
        self.total_amount
    }

    pub fn customer_name(&self) -> Option<&str> {
        self.customer_name.as_deref()
    }

    pub fn phone_number(&self) -> Option<&str> {
        self.phone_number.as_deref()
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn provider_payment_charge_id(&self) -> Option<&str> {
        self.provider_payment_charge_id.as_deref()
    }

    pub fn telegram_payment_charge_id(&self) -> Option<&str> {
        self.telegram_payment_charge_id.as_deref()
    }

    pub fn user(&self) -> i64 {
        self.user
    }

    pub fn user_name(&self) -> Option<&str> {
        self.user_name.as_deref()
    }

    pub fn user_username(&self) -> Option<&str> {
        self.user_username.as_deref()
    }

    pub fn issuer(&self) -> Option<i64> {
        self.issuer
    }

    pub fn issuer_name(&self) -> Option<&str> {
        self.issuer_name.as_deref()
    }

    pub fn issuer_username(&self) -> Option<&str> {
        self.issuer_username.as_deref()
    }

    pub fn created(&self) -> &str {
        &self.created
    }

    pub fn activated(&self) -> Option<&str> {
        self.activated.as_deref()
    }

    /// Stamp the redemption time. Persist with a conditional save guarded on `activated`.
    pub fn activate(&mut self, at: String) {
        self.activated = Some(at);
        self.dirty.mark("activated");
    }

    /// Short buyer-facing description.
    pub fn summary(&self) -> String {
        format!(
            "{}!\nPrice: {}\nPurchased: {} (UTC)",
            self.ticket_name,
            format_amount(self.total_amount, &self.currency),
            self.created
        )
    }

    /// Full description shown to staff at check-in.
    pub fn detail(&self) -> String {
        format!(
            "Holder: {}\nTicket: {}\nIncludes: {}\nActivated: {}",
            self.user_name.as_deref().unwrap_or("-"),
            self.ticket_name,
            self.ticket_description,
            self.activated.as_deref().unwrap_or("no"),
        )
    }

    /// What gets printed on the ticket image.
    pub fn card(&self, event_title: &str) -> TicketCard {
        TicketCard {
            purchase_id: self.id.clone(),
            event_title: event_title.to_string(),
            holder_name: self
                .user_name
                .clone()
                .or_else(|| self.customer_name.clone())
                .unwrap_or_default(),
            ticket_name: self.ticket_name.clone(),
            total_amount: self.total_amount,
            currency: self.currency.clone(),
            created: self.created.clone(),
        }
    }
}
