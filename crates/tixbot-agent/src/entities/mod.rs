// SPDX-FileCopyrightText: 2026 Tixbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain entities stored as keyed documents.
//!
//! Each entity is a fixed struct with serde mapping. Fields without a setter
//! can only change through direct store edits.

pub mod purchase;
pub mod ticket;
pub mod user;

use chrono::{SecondsFormat, Utc};

pub use purchase::Purchase;
pub use ticket::{MAX_PRICE, Ticket, TicketType};
pub use user::{User, UserStatus};

/// Current UTC time in the format stored in `created`/`activated` fields.
///
/// Fixed width, so the text sorts chronologically.
pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Render minor currency units as `1500.50 RUB`.
pub fn format_amount(minor: i64, currency: &str) -> String {
    let sign = if minor < 0 { "-" } else { "" };
    let minor = minor.unsigned_abs();
    format!("{sign}{}.{:02} {currency}", minor / 100, minor % 100)
}
