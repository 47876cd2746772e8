// SPDX-FileCopyrightText: 2026 Tixbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation engine of the tixbot ticketing bot.
//!
//! The [`BotLoop`] receives events from a channel adapter and runs each one as
//! its own task:
//! - events of the same session key are serialized by a keyed lock
//! - events of different users run concurrently
//! - shutdown stops receiving and drains running handlers with a timeout

pub mod bot;
pub mod entities;
pub mod fulfillment;
mod handlers;
pub mod keyboard;
pub mod locks;
pub mod machine;
pub mod operator;
pub mod profile_link;
pub mod recording;
pub mod redemption;
pub mod report;
pub mod session;
pub mod shutdown;
pub mod store;
pub mod texts;

use std::sync::Arc;
use std::time::Duration;

use tixbot_core::{ChannelAdapter, SessionKey, StorageAdapter, TixbotError};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

pub use bot::{Bot, BotSettings};
pub use entities::{Purchase, Ticket, TicketType, User, UserStatus};
pub use locks::KeyedLocks;
pub use redemption::CheckinOutcome;
pub use store::{Collection, Document};

/// Receives inbound events and dispatches them to the [`Bot`].
pub struct BotLoop {
    bot: Arc<Bot>,
    channel: Arc<dyn ChannelAdapter>,
    storage: Arc<dyn StorageAdapter>,
    sessions: KeyedLocks<SessionKey>,
    tracker: TaskTracker,
    drain_timeout: Duration,
}

impl BotLoop {
    pub fn new(
        bot: Arc<Bot>,
        channel: Arc<dyn ChannelAdapter>,
        storage: Arc<dyn StorageAdapter>,
        drain_timeout: Duration,
    ) -> Self {
        Self {
            bot,
            channel,
            storage,
            sessions: KeyedLocks::new(),
            tracker: TaskTracker::new(),
            drain_timeout,
        }
    }

    /// Runs until `cancel` fires or the channel closes, then drains and closes storage.
    pub async fn run(&self, cancel: CancellationToken) -> Result<(), TixbotError> {
        info!(channel = self.channel.name(), "bot loop running");

        loop {
            tokio::select! {
                event = self.channel.receive() => {
                    match event {
                        Ok(event) => self.spawn(event),
                        Err(e) if e.is_channel_closed() => {
                            info!("channel closed, stopping bot loop");
                            break;
                        }
                        Err(e) => {
                            error!(error = %e, "channel receive error");
                        }
                    }
                }
                _ = cancel.cancelled() => {
                    info!("shutdown signal received, stopping bot loop");
                    break;
                }
            }
        }

        if !shutdown::drain(&self.tracker, self.drain_timeout).await {
            warn!("closing storage with handlers still running");
        }
        self.storage.close().await?;

        info!("bot loop stopped");
        Ok(())
    }

    fn spawn(&self, event: tixbot_core::InboundEvent) {
        let bot = self.bot.clone();
        let sessions = self.sessions.clone();
        let tracker = self.tracker.clone();
        let key = event.session_key();
        let kind = event.kind();
        debug!(user_id = key.user_id, kind, "event received");

        self.tracker.spawn(async move {
            let _guard = sessions.lock(key).await;
            recording::set_in_flight(tracker.len());
            if let Err(e) = bot.handle(event).await {
                error!(user_id = key.user_id, kind, error = %e, "failed to handle event");
            }
        });
    }

    /// Number of events currently being handled.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }
}
