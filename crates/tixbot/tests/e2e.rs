// SPDX-FileCopyrightText: 2026 Tixbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end scenario tests for the complete tixbot pipeline.
//!
//! Each test creates an isolated TestHarness with temp SQLite, a seeded
//! catalog, and mock adapters. Tests are independent and order-insensitive.

use std::sync::Arc;
use std::time::Duration;

use tixbot_agent::redemption::redeem;
use tixbot_agent::texts;
use tixbot_agent::{Bot, CheckinOutcome, Ticket, TicketType, UserStatus, operator};
use tixbot_core::types::{ConfirmedPayment, Keyboard, PreCheckoutVerdict};
use tixbot_core::{ConversationState, InboundEvent, Namespace, SessionKey, TixbotError};
use tixbot_test_utils::harness::{callback, payment, photo, pre_checkout, sender, text};
use tixbot_test_utils::{DecodeOutcome, TestHarness};
use tokio_util::sync::CancellationToken;

const ADMIN: i64 = 1;
const BUYER: i64 = 5;

fn confirmed(user_id: i64, payload: &str, charge: &str, amount: i64) -> ConfirmedPayment {
    match payment(user_id, payload, charge, amount) {
        InboundEvent::PaymentConfirmed { payment, .. } => payment,
        other => panic!("unexpected event {other:?}"),
    }
}

fn rejection(verdict: Option<PreCheckoutVerdict>) -> String {
    match verdict {
        Some(PreCheckoutVerdict::Reject(reason)) => reason,
        other => panic!("expected a rejection, got {other:?}"),
    }
}

async fn enter_checkin(harness: &TestHarness) {
    harness.send(text(ADMIN, texts::BUTTON_ADMIN)).await.unwrap();
    harness
        .send(text(ADMIN, texts::BUTTON_ADMIN_CHECKIN))
        .await
        .unwrap();
    assert_eq!(
        harness.admin_state(ADMIN).await.unwrap(),
        Some(ConversationState::AdminCheckin)
    );
}

// ---- Test 1: Registration through payment ----

#[tokio::test]
async fn test_full_registration_and_payment_scenario() {
    let harness = TestHarness::new().await.unwrap();
    harness.register_admin(ADMIN).await.unwrap();
    harness.channel.clear().await;

    harness.send(text(BUYER, "/start")).await.unwrap();
    assert_eq!(
        harness.user_state(BUYER).await.unwrap(),
        Some(ConversationState::WaitingName)
    );

    harness.send(text(BUYER, "Ivan")).await.unwrap();
    assert_eq!(
        harness.user_state(BUYER).await.unwrap(),
        Some(ConversationState::WaitingVk)
    );

    harness.send(text(BUYER, "vk.com/ivan")).await.unwrap();
    assert_eq!(
        harness.user_state(BUYER).await.unwrap(),
        Some(ConversationState::WaitingPayment)
    );
    let user = harness.user(BUYER).await.unwrap();
    assert_eq!(user.status(), UserStatus::Approved);
    assert_eq!(user.real_name(), Some("Ivan"));
    assert_eq!(user.vk(), Some("https://vk.com/ivan"));
    assert!(
        harness
            .channel
            .texts_to(ADMIN)
            .await
            .iter()
            .any(|t| t.starts_with("New registration"))
    );

    harness
        .send(payment(BUYER, "standard", "ch_1", 1000))
        .await
        .unwrap();

    let purchases = harness.purchases().await.unwrap();
    assert_eq!(purchases.len(), 1);
    assert_eq!(purchases[0].id(), "ch_1");
    assert_eq!(purchases[0].total_amount(), 1000);
    assert_eq!(purchases[0].ticket_name(), "standard");
    assert_eq!(purchases[0].user(), BUYER);

    let user = harness.user(BUYER).await.unwrap();
    assert_eq!(user.status(), UserStatus::Ready);
    assert_eq!(user.purchase_id(), Some("ch_1"));
    assert_eq!(
        harness.user_state(BUYER).await.unwrap(),
        Some(ConversationState::ReadyDashboard)
    );

    let images = harness.channel.images_to(BUYER).await;
    assert_eq!(images.len(), 1);
    assert_eq!(images[0].file_name, "ch_1.png");
    assert!(
        harness
            .channel
            .texts_to(ADMIN)
            .await
            .iter()
            .any(|t| t.contains("bought ticket 'standard'"))
    );
}

#[tokio::test]
async fn test_tickets_button_sends_one_invoice_per_paid_item() {
    let harness = TestHarness::new().await.unwrap();
    harness.register(BUYER, "Ivan").await.unwrap();

    harness
        .send(text(BUYER, texts::BUTTON_TICKETS))
        .await
        .unwrap();

    let invoices = harness.channel.invoices_to(BUYER).await;
    let payloads: Vec<&str> = invoices.iter().map(|i| i.payload.as_str()).collect();
    assert_eq!(payloads, vec!["standard", "vip"]);
    assert_eq!(invoices[0].amount, 1000);
    assert_eq!(invoices[1].amount, 5000);
    assert_eq!(invoices[0].currency, "RUB");
    assert_eq!(
        invoices[1].photo_url.as_deref(),
        Some("https://example.org/vip.png")
    );
}

#[tokio::test]
async fn test_rejected_profile_link_keeps_waiting() {
    let harness = TestHarness::new().await.unwrap();
    harness.send(text(BUYER, "/start")).await.unwrap();
    harness.send(text(BUYER, "Ivan")).await.unwrap();

    harness
        .send(text(BUYER, "my profile is secret"))
        .await
        .unwrap();

    assert_eq!(
        harness.user_state(BUYER).await.unwrap(),
        Some(ConversationState::WaitingVk)
    );
    let user = harness.user(BUYER).await.unwrap();
    assert_eq!(user.status(), UserStatus::Welcome);
    assert_eq!(user.vk(), None);
    assert_eq!(
        harness.channel.texts_to(BUYER).await.last().map(String::as_str),
        Some(texts::NOT_A_PROFILE_LINK)
    );
}

#[tokio::test]
async fn test_text_without_session_points_to_start() {
    let harness = TestHarness::new().await.unwrap();
    harness.send(text(7, "hello")).await.unwrap();
    assert_eq!(
        harness.channel.texts_to(7).await,
        vec![texts::NO_SESSION.to_string()]
    );
}

#[tokio::test]
async fn test_restart_by_owner_keeps_ticket() {
    let harness = TestHarness::new().await.unwrap();
    harness.register(BUYER, "Ivan").await.unwrap();
    harness
        .send(payment(BUYER, "standard", "ch_1", 1000))
        .await
        .unwrap();

    harness.send(text(BUYER, "/start")).await.unwrap();

    let user = harness.user(BUYER).await.unwrap();
    assert_eq!(user.status(), UserStatus::Ready);
    assert_eq!(user.purchase_id(), Some("ch_1"));
    assert_eq!(
        harness.user_state(BUYER).await.unwrap(),
        Some(ConversationState::ReadyDashboard)
    );
}

#[tokio::test]
async fn test_restart_before_purchase_overwrites_profile() {
    let harness = TestHarness::new().await.unwrap();
    harness.register(BUYER, "Ivan").await.unwrap();

    harness.send(text(BUYER, "/start")).await.unwrap();

    let user = harness.user(BUYER).await.unwrap();
    assert_eq!(user.status(), UserStatus::Welcome);
    assert_eq!(user.real_name(), None);
    assert_eq!(
        harness.user_state(BUYER).await.unwrap(),
        Some(ConversationState::WaitingName)
    );
}

// ---- Test 2: Payment pre-authorization ----

#[tokio::test]
async fn test_pre_checkout_checks_run_in_order() {
    let harness = TestHarness::new().await.unwrap();

    harness.send(pre_checkout(9, "q0", "")).await.unwrap();
    assert!(rejection(harness.channel.verdict_for("q0").await).contains("payload is empty"));

    harness.send(pre_checkout(9, "q1", "nope")).await.unwrap();
    assert!(rejection(harness.channel.verdict_for("q1").await).contains("no ticket with id nope"));

    harness.send(pre_checkout(9, "q2", "guest")).await.unwrap();
    assert!(rejection(harness.channel.verdict_for("q2").await).contains("no longer on sale"));

    harness.send(pre_checkout(9, "q3", "standard")).await.unwrap();
    assert!(rejection(harness.channel.verdict_for("q3").await).contains("no user with id 9"));

    harness.send(text(9, "/start")).await.unwrap();
    harness.send(pre_checkout(9, "q4", "standard")).await.unwrap();
    assert!(rejection(harness.channel.verdict_for("q4").await).contains("not approved"));
}

#[tokio::test]
async fn test_pre_checkout_accepts_approved_user_without_side_effects() {
    let harness = TestHarness::new().await.unwrap();
    harness.register(BUYER, "Ivan").await.unwrap();

    harness
        .send(pre_checkout(BUYER, "q1", "vip"))
        .await
        .unwrap();

    assert_eq!(
        harness.channel.verdict_for("q1").await,
        Some(PreCheckoutVerdict::Accept)
    );
    assert!(harness.purchases().await.unwrap().is_empty());
    assert_eq!(
        harness.user(BUYER).await.unwrap().status(),
        UserStatus::Approved
    );
}

#[tokio::test]
async fn test_pre_checkout_rejects_ticket_owner() {
    let harness = TestHarness::new().await.unwrap();
    harness.register(BUYER, "Ivan").await.unwrap();
    harness
        .send(payment(BUYER, "standard", "ch_1", 1000))
        .await
        .unwrap();

    harness
        .send(pre_checkout(BUYER, "q2", "vip"))
        .await
        .unwrap();

    assert!(rejection(harness.channel.verdict_for("q2").await).contains("already have a ticket"));
}

// ---- Test 3: Fulfillment edge cases ----

#[tokio::test]
async fn test_duplicate_charge_is_fulfilled_once() {
    let harness = TestHarness::new().await.unwrap();
    harness.register(BUYER, "Ivan").await.unwrap();

    let event = payment(BUYER, "standard", "ch_dup", 1000);
    harness.send(event.clone()).await.unwrap();
    harness.send(event).await.unwrap();

    assert_eq!(harness.purchases().await.unwrap().len(), 1);
    assert_eq!(harness.channel.images_to(BUYER).await.len(), 1);
    assert_eq!(harness.artifacts.generated().await.len(), 1);
}

#[tokio::test]
async fn test_catalog_changes_leave_recorded_purchases_alone() {
    let harness = TestHarness::new().await.unwrap();
    harness.register(BUYER, "Ivan").await.unwrap();
    harness
        .send(payment(BUYER, "standard", "ch_1", 1000))
        .await
        .unwrap();

    let repriced = Ticket::new("standard", 99, "Saturday only", None, TicketType::Paid, 1);
    let summary = operator::load_catalog(&harness.storage, &[repriced])
        .await
        .unwrap();
    assert_eq!(summary.updated, 1);
    let live = harness.bot.tickets().load("standard").await.unwrap();
    assert_eq!(live.price(), 99);

    let purchase = harness.bot.purchases().load("ch_1").await.unwrap();
    assert_eq!(purchase.ticket_base_price(), 10);
    assert_eq!(purchase.ticket_description(), "Entry for all days");
    assert_eq!(purchase.total_amount(), 1000);
}

#[tokio::test]
async fn test_second_payment_from_owner_is_recorded_and_flagged() {
    let harness = TestHarness::new().await.unwrap();
    harness.register_admin(ADMIN).await.unwrap();
    harness.register(BUYER, "Ivan").await.unwrap();
    harness
        .send(payment(BUYER, "standard", "ch_1", 1000))
        .await
        .unwrap();

    let err = harness
        .send(payment(BUYER, "vip", "ch_2", 5000))
        .await
        .unwrap_err();

    assert!(matches!(err, TixbotError::AlreadyOwned { ref purchase_id, .. } if purchase_id == "ch_1"));
    assert_eq!(harness.purchases().await.unwrap().len(), 2);
    assert_eq!(
        harness.user(BUYER).await.unwrap().purchase_id(),
        Some("ch_1")
    );
    assert!(
        harness
            .channel
            .texts_to(BUYER)
            .await
            .contains(&texts::PAYMENT_PROBLEM.to_string())
    );
    assert!(
        harness
            .channel
            .texts_to(ADMIN)
            .await
            .iter()
            .any(|t| t.contains("Refund needed"))
    );
}

#[tokio::test]
async fn test_payment_for_unknown_item_alerts_admins() {
    let harness = TestHarness::new().await.unwrap();
    harness.register_admin(ADMIN).await.unwrap();
    harness.register(BUYER, "Ivan").await.unwrap();

    let err = harness
        .send(payment(BUYER, "backstage", "ch_x", 1000))
        .await
        .unwrap_err();

    assert!(matches!(err, TixbotError::Integrity(_)));
    assert!(harness.purchases().await.unwrap().is_empty());
    assert!(
        harness
            .channel
            .texts_to(ADMIN)
            .await
            .iter()
            .any(|t| t.contains("unknown item 'backstage'"))
    );
}

#[tokio::test]
async fn test_failed_rendering_keeps_purchase_and_regenerates_later() {
    let harness = TestHarness::new().await.unwrap();
    harness.register(BUYER, "Ivan").await.unwrap();
    harness.artifacts.fail_generation(true);

    harness
        .send(payment(BUYER, "standard", "ch_1", 1000))
        .await
        .unwrap();

    assert_eq!(harness.purchases().await.unwrap().len(), 1);
    assert_eq!(harness.user(BUYER).await.unwrap().status(), UserStatus::Ready);
    assert!(harness.channel.images_to(BUYER).await.is_empty());

    harness.artifacts.fail_generation(false);
    harness
        .send(text(BUYER, texts::BUTTON_MY_TICKET))
        .await
        .unwrap();
    assert_eq!(harness.channel.images_to(BUYER).await.len(), 1);
}

#[tokio::test]
async fn test_my_ticket_regenerates_missing_image() {
    let harness = TestHarness::new().await.unwrap();
    harness.register(BUYER, "Ivan").await.unwrap();
    harness
        .send(payment(BUYER, "standard", "ch_1", 1000))
        .await
        .unwrap();
    harness.artifacts.forget("ch_1").await;

    harness
        .send(text(BUYER, texts::BUTTON_MY_TICKET))
        .await
        .unwrap();

    assert_eq!(harness.artifacts.generated().await.len(), 2);
    assert_eq!(harness.channel.images_to(BUYER).await.len(), 2);
}

// ---- Test 4: Gifts ----

#[tokio::test]
async fn test_gift_then_payment_keeps_single_owner() {
    let harness = TestHarness::new().await.unwrap();
    harness.register_admin(ADMIN).await.unwrap();
    harness.register(BUYER, "Ivan").await.unwrap();

    harness.send(text(ADMIN, texts::BUTTON_ADMIN)).await.unwrap();
    harness.send(callback(ADMIN, "Gift:5")).await.unwrap();

    let user = harness.user(BUYER).await.unwrap();
    let gift_id = user.purchase_id().unwrap().to_string();
    assert_eq!(user.status(), UserStatus::Ready);
    let purchases = harness.purchases().await.unwrap();
    assert_eq!(purchases.len(), 1);
    assert_eq!(purchases[0].ticket_name(), "guest");
    assert_eq!(purchases[0].issuer(), Some(ADMIN));
    assert!(harness.channel.edits_to(ADMIN).await[0].contains("TICKET ISSUED"));
    assert!(
        harness
            .channel
            .answered_callbacks()
            .await
            .contains(&"cb-1-Gift:5".to_string())
    );
    assert_eq!(harness.channel.images_to(BUYER).await.len(), 1);

    let err = harness
        .send(payment(BUYER, "standard", "ch_1", 1000))
        .await
        .unwrap_err();
    assert!(matches!(err, TixbotError::AlreadyOwned { .. }));
    assert_eq!(
        harness.user(BUYER).await.unwrap().purchase_id(),
        Some(gift_id.as_str())
    );

    harness.send(callback(ADMIN, "Gift:5")).await.unwrap();
    assert!(harness.channel.edits_to(ADMIN).await[1].contains("already issued"));
}

#[tokio::test]
async fn test_gift_requires_approved_user() {
    let harness = TestHarness::new().await.unwrap();
    harness.register_admin(ADMIN).await.unwrap();
    harness.send(text(BUYER, "/start")).await.unwrap();

    harness.send(text(ADMIN, texts::BUTTON_ADMIN)).await.unwrap();
    harness.send(callback(ADMIN, "Gift:5")).await.unwrap();

    assert!(harness.channel.edits_to(ADMIN).await[0].contains("does not allow"));
    assert!(harness.purchases().await.unwrap().is_empty());
    assert_eq!(harness.user(BUYER).await.unwrap().purchase_id(), None);
}

#[tokio::test]
async fn test_concurrent_gift_and_payment_yield_one_owner() {
    let harness = TestHarness::new().await.unwrap();
    let admin = harness.register_admin(ADMIN).await.unwrap();
    harness.register(BUYER, "Ivan").await.unwrap();

    let buyer = sender(BUYER);
    let charge = confirmed(BUYER, "standard", "ch_race", 1000);
    let (gift, paid) = tokio::join!(
        harness.bot.issue_gift(&admin, BUYER),
        harness.bot.fulfill_payment(&buyer, BUYER, &charge),
    );

    let owner = harness.user(BUYER).await.unwrap();
    match (gift, paid) {
        (Ok(gift), Err(TixbotError::AlreadyOwned { .. })) => {
            assert_eq!(owner.purchase_id(), Some(gift.id()));
        }
        (Err(TixbotError::AlreadyOwned { .. }), Ok(paid)) => {
            assert_eq!(owner.purchase_id(), Some(paid.id()));
        }
        other => panic!("expected exactly one owner, got {other:?}"),
    }
}

#[tokio::test]
async fn test_concurrent_gifts_issue_one_ticket() {
    let harness = TestHarness::new().await.unwrap();
    let first = harness.register_admin(ADMIN).await.unwrap();
    let second = harness.register_admin(2).await.unwrap();
    harness.register(BUYER, "Ivan").await.unwrap();

    let (a, b) = tokio::join!(
        harness.bot.issue_gift(&first, BUYER),
        harness.bot.issue_gift(&second, BUYER),
    );

    assert_eq!([a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(), 1);
    assert_eq!(harness.purchases().await.unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_restart_racing_a_gift_never_splits_owner_and_status() {
    let harness = TestHarness::new().await.unwrap();
    let admin = harness.register_admin(ADMIN).await.unwrap();

    for k in 0..24 {
        let user_id = 100 + k;
        harness.register(user_id, "Ivan").await.unwrap();

        let restart = async {
            for _ in 0..k {
                tokio::task::yield_now().await;
            }
            harness.send(text(user_id, "/start")).await
        };
        let (_, restarted) = tokio::join!(harness.bot.issue_gift(&admin, user_id), restart);
        restarted.unwrap();

        let user = harness.user(user_id).await.unwrap();
        let state = harness.user_state(user_id).await.unwrap();
        match user.purchase_id() {
            Some(_) => {
                assert_eq!(user.status(), UserStatus::Ready, "user {user_id}");
                assert_eq!(state, Some(ConversationState::ReadyDashboard), "user {user_id}");
            }
            None => {
                assert_ne!(user.status(), UserStatus::Ready, "user {user_id}");
                assert_eq!(state, Some(ConversationState::WaitingName), "user {user_id}");
            }
        }
    }
}

#[tokio::test]
async fn test_gift_by_non_admin_is_unauthorized() {
    let harness = TestHarness::new().await.unwrap();
    let user = harness.register(BUYER, "Ivan").await.unwrap();
    harness.register(6, "Petr").await.unwrap();

    let err = harness.bot.issue_gift(&user, 6).await.unwrap_err();
    assert!(matches!(err, TixbotError::Unauthorized { user_id: BUYER }));
}

// ---- Test 5: Check-in ----

#[tokio::test]
async fn test_checkin_is_idempotent() {
    let harness = TestHarness::new().await.unwrap();
    harness.register_admin(ADMIN).await.unwrap();
    harness.register(BUYER, "Ivan").await.unwrap();
    harness
        .send(payment(BUYER, "standard", "ch_1", 1000))
        .await
        .unwrap();
    enter_checkin(&harness).await;

    harness.send(text(ADMIN, "ch_1")).await.unwrap();
    let first = harness.bot.purchases().load("ch_1").await.unwrap();
    let activated = first.activated().unwrap().to_string();
    assert!(
        harness
            .channel
            .texts_to(ADMIN)
            .await
            .last()
            .unwrap()
            .starts_with("Checked in successfully")
    );

    harness.send(text(ADMIN, "ch_1")).await.unwrap();
    let second = harness.bot.purchases().load("ch_1").await.unwrap();
    assert_eq!(second.activated(), Some(activated.as_str()));
    assert!(
        harness
            .channel
            .texts_to(ADMIN)
            .await
            .last()
            .unwrap()
            .starts_with("ALREADY CHECKED IN")
    );

    harness.send(text(ADMIN, "ch_missing")).await.unwrap();
    assert_eq!(
        harness.channel.texts_to(ADMIN).await.last().map(String::as_str),
        Some(texts::CHECKIN_UNKNOWN)
    );
}

#[tokio::test]
async fn test_concurrent_redemptions_succeed_once() {
    let harness = TestHarness::new().await.unwrap();
    harness.register(BUYER, "Ivan").await.unwrap();
    harness
        .send(payment(BUYER, "standard", "ch_1", 1000))
        .await
        .unwrap();

    let purchases = harness.bot.purchases();
    let (a, b) = tokio::join!(redeem(purchases, "ch_1"), redeem(purchases, "ch_1"));
    let redeemed = [a.unwrap(), b.unwrap()]
        .iter()
        .filter(|o| matches!(o, CheckinOutcome::Redeemed(_)))
        .count();
    assert_eq!(redeemed, 1);
}

#[tokio::test]
async fn test_photo_checkin_uses_decoder() {
    let harness = TestHarness::new().await.unwrap();
    harness.register_admin(ADMIN).await.unwrap();
    harness.register(BUYER, "Ivan").await.unwrap();
    harness
        .send(payment(BUYER, "standard", "ch_1", 1000))
        .await
        .unwrap();
    enter_checkin(&harness).await;

    harness.send(photo(ADMIN, b"ch_1")).await.unwrap();
    assert!(
        harness
            .bot
            .purchases()
            .load("ch_1")
            .await
            .unwrap()
            .activated()
            .is_some()
    );

    harness
        .decoder
        .push(DecodeOutcome::Unreadable("no symbol found".into()))
        .await;
    harness.send(photo(ADMIN, b"blurry")).await.unwrap();
    assert!(
        harness
            .channel
            .texts_to(ADMIN)
            .await
            .last()
            .unwrap()
            .ends_with("Details: no symbol found")
    );

    harness.decoder.push(DecodeOutcome::Unavailable).await;
    harness.send(photo(ADMIN, b"blurry")).await.unwrap();
    assert_eq!(
        harness.channel.texts_to(ADMIN).await.last().map(String::as_str),
        Some(texts::CHECKIN_UNREADABLE)
    );
}

#[tokio::test]
async fn test_photo_outside_checkin_is_ignored() {
    let harness = TestHarness::new().await.unwrap();
    harness.register(BUYER, "Ivan").await.unwrap();
    harness.channel.clear().await;

    harness.send(photo(BUYER, b"ch_1")).await.unwrap();
    assert!(harness.channel.effects().await.is_empty());
}

// ---- Test 6: Admin dashboard ----

#[tokio::test]
async fn test_admin_button_from_regular_user_is_refused() {
    let harness = TestHarness::new().await.unwrap();
    harness.register(BUYER, "Ivan").await.unwrap();

    harness.send(text(BUYER, texts::BUTTON_ADMIN)).await.unwrap();

    assert_eq!(
        harness.channel.texts_to(BUYER).await.last().map(String::as_str),
        Some(texts::UNAUTHORIZED)
    );
    assert_eq!(harness.admin_state(BUYER).await.unwrap(), None);
}

#[tokio::test]
async fn test_revoked_admin_loses_dashboard_actions() {
    let harness = TestHarness::new().await.unwrap();
    harness.register_admin(ADMIN).await.unwrap();
    harness.send(text(ADMIN, texts::BUTTON_ADMIN)).await.unwrap();
    tixbot_agent::operator::set_admin(&harness.storage, ADMIN, false)
        .await
        .unwrap();

    harness
        .send(text(ADMIN, texts::BUTTON_ADMIN_STATS))
        .await
        .unwrap();

    assert_eq!(
        harness.channel.texts_to(ADMIN).await.last().map(String::as_str),
        Some(texts::UNAUTHORIZED)
    );
}

#[tokio::test]
async fn test_admin_reports() {
    let harness = TestHarness::new().await.unwrap();
    harness.register_admin(ADMIN).await.unwrap();
    harness.register(BUYER, "Ivan").await.unwrap();
    harness.register(6, "Petr").await.unwrap();
    harness
        .send(payment(BUYER, "standard", "ch_1", 1000))
        .await
        .unwrap();

    harness.send(text(ADMIN, texts::BUTTON_ADMIN)).await.unwrap();
    assert_eq!(
        harness.admin_state(ADMIN).await.unwrap(),
        Some(ConversationState::AdminDashboard)
    );

    harness
        .send(text(ADMIN, texts::BUTTON_ADMIN_STATS))
        .await
        .unwrap();
    let stats = harness.channel.texts_to(ADMIN).await.pop().unwrap();
    assert!(stats.contains("Users:"));
    assert!(stats.contains("standard: 1"));

    harness
        .send(text(ADMIN, texts::BUTTON_ADMIN_CSV))
        .await
        .unwrap();
    let documents = harness.channel.documents_to(ADMIN).await;
    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0].file_name, "purchases.csv");
    let csv = String::from_utf8(documents[0].data.clone()).unwrap();
    assert!(csv.starts_with("customer_name,"));
    assert_eq!(csv.lines().count(), 2);

    harness
        .send(text(ADMIN, texts::BUTTON_ADMIN_ALL))
        .await
        .unwrap();
    let listing = harness.channel.texts_to(ADMIN).await.pop().unwrap();
    assert!(listing.contains("/5 "));
    assert!(listing.ends_with("Total users: 3"));

    harness.send(text(ADMIN, "/6")).await.unwrap();
    let card = harness.channel.texts_to(ADMIN).await.pop().unwrap();
    assert!(card.contains("Petr"));
    match harness.channel.last_keyboard(ADMIN).await {
        Some(Keyboard::Inline(buttons)) => assert_eq!(buttons[0][0].data, "Gift:6"),
        other => panic!("expected gift button, got {other:?}"),
    }

    harness.send(text(ADMIN, texts::BUTTON_BACK)).await.unwrap();
    assert_eq!(harness.admin_state(ADMIN).await.unwrap(), None);
    assert_eq!(
        harness.channel.texts_to(ADMIN).await.pop().as_deref(),
        Some(texts::ADMIN_BYE)
    );
}

#[tokio::test]
async fn test_checkin_back_returns_to_dashboard() {
    let harness = TestHarness::new().await.unwrap();
    harness.register_admin(ADMIN).await.unwrap();
    enter_checkin(&harness).await;

    harness.send(text(ADMIN, texts::BUTTON_BACK)).await.unwrap();

    assert_eq!(
        harness.admin_state(ADMIN).await.unwrap(),
        Some(ConversationState::AdminDashboard)
    );
}

// ---- Test 7: Sessions ----

#[tokio::test]
async fn test_session_round_trip() {
    let harness = TestHarness::new().await.unwrap();
    let sessions = harness.bot.sessions();
    let key = SessionKey::user(42);

    sessions
        .set_state(Namespace::User, key, Some(ConversationState::WaitingName))
        .await
        .unwrap();
    assert_eq!(
        sessions.resolve(Namespace::User, key).await.unwrap(),
        Some(ConversationState::WaitingName)
    );
    assert_eq!(
        sessions.get(Namespace::User).await.unwrap().get(&key),
        Some(&ConversationState::WaitingName)
    );

    sessions.set_state(Namespace::User, key, None).await.unwrap();
    assert_eq!(sessions.resolve(Namespace::User, key).await.unwrap(), None);
    assert!(!sessions.get(Namespace::User).await.unwrap().contains_key(&key));
}

#[tokio::test]
async fn test_states_survive_a_new_bot_instance() {
    let harness = TestHarness::new().await.unwrap();
    harness.send(text(BUYER, "/start")).await.unwrap();

    let restarted = Bot::new(
        harness.bot.settings().clone(),
        harness.storage.clone(),
        harness.channel.clone(),
        harness.artifacts.clone(),
        harness.decoder.clone(),
    );
    restarted.handle(text(BUYER, "Ivan")).await.unwrap();

    assert_eq!(
        harness.user_state(BUYER).await.unwrap(),
        Some(ConversationState::WaitingVk)
    );
    assert_eq!(
        harness.user(BUYER).await.unwrap().real_name(),
        Some("Ivan")
    );
}

// ---- Test 8: Bot loop ----

#[tokio::test]
async fn test_bot_loop_handles_events_until_channel_closes() {
    let harness = TestHarness::new().await.unwrap();
    harness.channel.inject(text(BUYER, "/start")).await;
    harness.channel.inject(text(BUYER, "Ivan")).await;
    harness.channel.inject(text(7, texts::BUTTON_INFO)).await;
    harness.channel.close();

    let bot_loop = harness.bot_loop(Duration::from_secs(5));
    tokio::time::timeout(Duration::from_secs(10), bot_loop.run(CancellationToken::new()))
        .await
        .expect("bot loop should stop when the channel closes")
        .unwrap();

    assert_eq!(bot_loop.in_flight(), 0);
    let replies = harness.channel.texts_to(BUYER).await;
    assert!(replies.iter().any(|t| t.contains("Summer Fest")));
    assert!(replies.iter().any(|t| t.starts_with("Hi, Ivan!")));
    assert_eq!(
        harness.channel.texts_to(7).await,
        vec!["Gates open at noon.".to_string()]
    );
}

#[tokio::test]
async fn test_bot_loop_stops_on_cancel() {
    let harness = TestHarness::new().await.unwrap();
    let bot_loop = Arc::new(harness.bot_loop(Duration::from_secs(1)));
    let cancel = CancellationToken::new();

    let handle = tokio::spawn({
        let bot_loop = bot_loop.clone();
        let cancel = cancel.clone();
        async move { bot_loop.run(cancel).await }
    });
    cancel.cancel();

    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("bot loop should stop on cancel")
        .unwrap()
        .unwrap();
}
