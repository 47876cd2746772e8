// SPDX-FileCopyrightText: 2026 Tixbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Admin reports: statistics, user listings, and the purchases CSV.

use std::collections::BTreeMap;

use serde::Serialize;
use tixbot_core::TixbotError;

use crate::entities::{Purchase, User, UserStatus, format_amount};
use crate::texts::{user_card, users_total};

/// Largest text a single chat message may carry.
pub const MESSAGE_LIMIT: usize = 4000;

/// Users grouped by registration status.
pub fn user_statistics(users: &[User]) -> String {
    let mut groups: BTreeMap<UserStatus, usize> = BTreeMap::new();
    for user in users {
        *groups.entry(user.status()).or_default() += 1;
    }
    let mut out = String::from("Users:\n");
    for (status, count) in groups {
        let label = status.describe();
        let mut chars = label.chars();
        let label = match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
            None => String::new(),
        };
        out.push_str(&format!("{label}: {count}\n"));
    }
    out
}

/// Purchases grouped by ticket with counts and sums, plus the grand total.
pub fn purchase_statistics(purchases: &[Purchase], currency: &str) -> String {
    let mut groups: BTreeMap<&str, (usize, i64)> = BTreeMap::new();
    let mut total = 0;
    for purchase in purchases {
        let entry = groups.entry(purchase.ticket_name()).or_default();
        entry.0 += 1;
        entry.1 += purchase.total_amount();
        total += purchase.total_amount();
    }
    let mut out = String::from("Purchases:\n");
    for (name, (count, sum)) in groups {
        out.push_str(&format!("{name}: {count} / {}\n", format_amount(sum, currency)));
    }
    out.push_str(&format!("\nTotal: {}\n", format_amount(total, currency)));
    out
}

/// Every user as a numbered card, split into messages of at most `limit` characters.
///
/// Each card starts with `/<id>` so staff can tap it to open the user card.
/// The last message ends with the total count.
pub fn user_list(users: &[User], limit: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    for (i, user) in users.iter().enumerate() {
        let entry = format!("{}\n", user_card(user, Some(&format!("/{} {}", user.id(), i + 1))));
        if !current.is_empty() && current.chars().count() + entry.chars().count() > limit {
            chunks.push(std::mem::take(&mut current));
        }
        current.push_str(&entry);
    }
    let footer = users_total(users.len());
    if !current.is_empty() && current.chars().count() + 1 + footer.chars().count() > limit {
        chunks.push(std::mem::take(&mut current));
    }
    if !current.is_empty() {
        current.push('\n');
    }
    current.push_str(&footer);
    chunks.push(current);
    chunks
}

#[derive(Serialize)]
struct CsvRow<'a> {
    customer_name: Option<&'a str>,
    email: Option<&'a str>,
    ticket_name: &'a str,
    ticket_base_price: i64,
    total_amount: i64,
    phone_number: Option<&'a str>,
    user: i64,
    user_name: Option<&'a str>,
    user_username: Option<&'a str>,
    ticket_description: &'a str,
    id: &'a str,
    created: &'a str,
    provider_payment_charge_id: Option<&'a str>,
    telegram_payment_charge_id: Option<&'a str>,
    currency: &'a str,
    issuer_username: Option<&'a str>,
    issuer_name: Option<&'a str>,
    issuer: Option<i64>,
    activated: Option<&'a str>,
}

impl<'a> From<&'a Purchase> for CsvRow<'a> {
    fn from(p: &'a Purchase) -> Self {
        Self {
            customer_name: p.customer_name(),
            email: p.email(),
            ticket_name: p.ticket_name(),
            ticket_base_price: p.ticket_base_price(),
            total_amount: p.total_amount(),
            phone_number: p.phone_number(),
            user: p.user(),
            user_name: p.user_name(),
            user_username: p.user_username(),
            ticket_description: p.ticket_description(),
            id: p.id(),
            created: p.created(),
            provider_payment_charge_id: p.provider_payment_charge_id(),
            telegram_payment_charge_id: p.telegram_payment_charge_id(),
            currency: p.currency(),
            issuer_username: p.issuer_username(),
            issuer_name: p.issuer_name(),
            issuer: p.issuer(),
            activated: p.activated(),
        }
    }
}

/// All purchases as CSV with the fixed export column set.
pub fn purchases_csv(purchases: &[Purchase]) -> Result<Vec<u8>, TixbotError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    if purchases.is_empty() {
        // serde only emits the header alongside the first record.
        writer
            .write_record(CSV_COLUMNS)
            .map_err(|e| TixbotError::Internal(format!("csv export: {e}")))?;
    }
    for purchase in purchases {
        writer
            .serialize(CsvRow::from(purchase))
            .map_err(|e| TixbotError::Internal(format!("csv export: {e}")))?;
    }
    writer
        .into_inner()
        .map_err(|e| TixbotError::Internal(format!("csv export: {e}")))
}

/// Export column order.
pub const CSV_COLUMNS: [&str; 19] = [
    "customer_name",
    "email",
    "ticket_name",
    "ticket_base_price",
    "total_amount",
    "phone_number",
    "user",
    "user_name",
    "user_username",
    "ticket_description",
    "id",
    "created",
    "provider_payment_charge_id",
    "telegram_payment_charge_id",
    "currency",
    "issuer_username",
    "issuer_name",
    "issuer",
    "activated",
];
