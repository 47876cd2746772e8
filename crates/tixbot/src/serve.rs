// SPDX-FileCopyrightText: 2026 Tixbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `tixbot serve` command implementation.
//!
//! Opens SQLite storage, connects the Telegram channel, wires the artifact
//! renderer and QR decoder into a [`Bot`], and runs the [`BotLoop`] until a
//! shutdown signal arrives or the channel closes.

use std::sync::Arc;
use std::time::Duration;

use tixbot_agent::{Bot, BotLoop, BotSettings, recording, shutdown};
use tixbot_artifact::{FileArtifactStore, QrServerDecoder};
use tixbot_config::model::{StorageConfig, TixbotConfig};
use tixbot_core::types::HealthStatus;
use tixbot_core::{ChannelAdapter, PluginAdapter, StorageAdapter, TixbotError};
use tixbot_storage::SqliteStorage;
use tixbot_telegram::TelegramChannel;
use tracing::{info, warn};

/// Open and migrate the configured database.
pub(crate) async fn open_storage(
    config: &StorageConfig,
) -> Result<Arc<dyn StorageAdapter>, TixbotError> {
    let storage = SqliteStorage::new(config.clone());
    storage.initialize().await?;
    Ok(Arc::new(storage))
}

/// Runs the `tixbot serve` command.
pub async fn run_serve(config: TixbotConfig) -> Result<(), TixbotError> {
    init_tracing(&config.bot.log_level);

    info!(name = config.bot.name.as_str(), "starting tixbot serve");
    recording::register_metrics();

    let storage = open_storage(&config.storage).await?;
    info!(path = config.storage.database_path.as_str(), "storage initialized");

    let mut telegram = TelegramChannel::new(config.telegram.clone())?;
    telegram.connect().await?;
    let channel: Arc<dyn ChannelAdapter> = Arc::new(telegram);

    let artifacts = Arc::new(FileArtifactStore::new(&config.artifact));
    info!(
        output_dir = %artifacts.output_dir().display(),
        "artifact store ready"
    );

    let decoder = Arc::new(QrServerDecoder::new(&config.decoder)?);
    report_health(decoder.as_ref()).await;

    let bot = Arc::new(Bot::new(
        BotSettings::from_config(&config),
        storage.clone(),
        channel.clone(),
        artifacts,
        decoder,
    ));

    let cancel = shutdown::install_signal_handler();
    let bot_loop = BotLoop::new(
        bot,
        channel.clone(),
        storage,
        Duration::from_secs(config.bot.drain_timeout_secs),
    );
    bot_loop.run(cancel).await?;

    channel.shutdown().await?;
    info!("tixbot serve shutdown complete");
    Ok(())
}

/// Log an adapter's health without failing startup.
async fn report_health(adapter: &dyn PluginAdapter) {
    match adapter.health_check().await {
        Ok(HealthStatus::Healthy) => info!(adapter = adapter.name(), "adapter healthy"),
        Ok(HealthStatus::Degraded(reason)) | Ok(HealthStatus::Unhealthy(reason)) => {
            warn!(adapter = adapter.name(), reason = reason.as_str(), "adapter not healthy")
        }
        Err(e) => warn!(adapter = adapter.name(), error = %e, "adapter health check failed"),
    }
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("tixbot={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
