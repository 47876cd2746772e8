// SPDX-FileCopyrightText: 2026 Tixbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ticket check-in.

use tixbot_core::TixbotError;
use tracing::{info, warn};

use crate::entities::{Purchase, timestamp};
use crate::recording;
use crate::store::Collection;

/// Result of redeeming a code.
#[derive(Debug, Clone)]
pub enum CheckinOutcome {
    /// First redemption; `activated` was just set.
    Redeemed(Purchase),
    /// Already redeemed earlier. Carries the stored record, first timestamp intact.
    AlreadyRedeemed(Purchase),
    /// No purchase has this code.
    Unknown,
}

/// Mark the purchase identified by `code` as used, exactly once.
///
/// Concurrent calls for one code produce a single `Redeemed`; the activation
/// stamp is written with a conditional update.
pub async fn redeem(
    purchases: &Collection<Purchase>,
    code: &str,
) -> Result<CheckinOutcome, TixbotError> {
    let code = code.trim();
    if code.is_empty() {
        recording::record_checkin("unknown");
        return Ok(CheckinOutcome::Unknown);
    }
    let Some(mut purchase) = purchases.find(code).await? else {
        info!(code, "check-in with unknown code");
        recording::record_checkin("unknown");
        return Ok(CheckinOutcome::Unknown);
    };

    if purchase.activated().is_some() {
        warn!(purchase_id = purchase.id(), "repeated check-in");
        recording::record_checkin("repeat");
        return Ok(CheckinOutcome::AlreadyRedeemed(purchase));
    }

    purchase.activate(timestamp());
    if purchases.save_if_absent(&mut purchase, "activated").await? {
        info!(purchase_id = purchase.id(), user_id = purchase.user(), "ticket checked in");
        recording::record_checkin("redeemed");
        return Ok(CheckinOutcome::Redeemed(purchase));
    }

    warn!(purchase_id = purchase.id(), "lost concurrent check-in");
    recording::record_checkin("repeat");
    Ok(CheckinOutcome::AlreadyRedeemed(purchases.load(code).await?))
}
