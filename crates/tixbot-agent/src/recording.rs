// SPDX-FileCopyrightText: 2026 Tixbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers.
//!
//! Uses the metrics-rs facade; without an installed recorder every call is a no-op.

use metrics::{describe_counter, describe_gauge};

/// Register all tixbot metric descriptions.
pub fn register_metrics() {
    describe_counter!("tixbot_events_total", "Inbound events handled");
    describe_counter!("tixbot_purchases_total", "Purchases fulfilled");
    describe_counter!("tixbot_checkins_total", "Check-in attempts by outcome");
    describe_counter!(
        "tixbot_pre_checkout_rejections_total",
        "Payment pre-authorizations rejected"
    );
    describe_gauge!("tixbot_events_in_flight", "Events currently being handled");
}

pub fn record_event(kind: &'static str) {
    metrics::counter!("tixbot_events_total", "kind" => kind).increment(1);
}

/// `kind` is `paid` or `gift`.
pub fn record_purchase(kind: &'static str) {
    metrics::counter!("tixbot_purchases_total", "kind" => kind).increment(1);
}

pub fn record_checkin(outcome: &'static str) {
    metrics::counter!("tixbot_checkins_total", "outcome" => outcome).increment(1);
}

pub fn record_rejection(reason: &'static str) {
    metrics::counter!("tixbot_pre_checkout_rejections_total", "reason" => reason).increment(1);
}

pub fn set_in_flight(count: usize) {
    metrics::gauge!("tixbot_events_in_flight").set(count as f64);
}
