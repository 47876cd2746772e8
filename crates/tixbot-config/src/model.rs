// SPDX-FileCopyrightText: 2026 Tixbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level tixbot configuration.
///
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TixbotConfig {
    /// Bot identity, event details, and runtime behavior.
    #[serde(default)]
    pub bot: BotConfig,

    /// Telegram bot and payment settings.
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Ticket artifact rendering settings.
    #[serde(default)]
    pub artifact: ArtifactConfig,

    /// QR decoding service settings.
    #[serde(default)]
    pub decoder: DecoderConfig,
}

/// Bot identity and event configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BotConfig {
    /// Display name of the bot, used in logs.
    #[serde(default = "default_bot_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Event name printed on tickets and invoices.
    #[serde(default = "default_event_title")]
    pub event_title: String,

    /// Reply to the "Info" button.
    #[serde(default = "default_info_text")]
    pub info_text: String,

    /// ISO 4217 currency for invoices and gifts.
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Seconds to wait for in-flight events on shutdown.
    #[serde(default = "default_drain_timeout_secs")]
    pub drain_timeout_secs: u64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: default_bot_name(),
            log_level: default_log_level(),
            event_title: default_event_title(),
            info_text: default_info_text(),
            currency: default_currency(),
            drain_timeout_secs: default_drain_timeout_secs(),
        }
    }
}

fn default_bot_name() -> String {
    "tixbot".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_event_title() -> String {
    "Tixbot Event".to_string()
}

fn default_info_text() -> String {
    "Ask the organizers in the event chat if something went wrong.".to_string()
}

fn default_currency() -> String {
    "RUB".to_string()
}

fn default_drain_timeout_secs() -> u64 {
    30
}

/// Telegram bot and payment configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TelegramConfig {
    /// Telegram Bot API token. `None` means `serve` refuses to start.
    #[serde(default)]
    pub bot_token: Option<String>,

    /// Payment provider token used for invoices.
    #[serde(default)]
    pub payment_provider_token: Option<String>,

    /// Largest tip accepted on an invoice, in minor units. Zero disables tips.
    #[serde(default = "default_max_tip_amount")]
    pub max_tip_amount: i64,

    /// Suggested tip buttons, in minor units. At most four.
    #[serde(default = "default_suggested_tips")]
    pub suggested_tips: Vec<i64>,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            payment_provider_token: None,
            max_tip_amount: default_max_tip_amount(),
            suggested_tips: default_suggested_tips(),
        }
    }
}

fn default_max_tip_amount() -> i64 {
    1_000_000
}

fn default_suggested_tips() -> Vec<i64> {
    vec![10_000, 50_000, 100_000]
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("tixbot").join("tixbot.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("tixbot.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Ticket artifact configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ArtifactConfig {
    /// Directory where rendered tickets are kept as `<purchase_id>.png`.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Pixels per QR module.
    #[serde(default = "default_module_scale")]
    pub module_scale: u32,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            module_scale: default_module_scale(),
        }
    }
}

fn default_output_dir() -> String {
    dirs::data_dir()
        .map(|p| p.join("tixbot").join("tickets"))
        .unwrap_or_else(|| std::path::PathBuf::from("tickets"))
        .to_string_lossy()
        .into_owned()
}

fn default_module_scale() -> u32 {
    10
}

/// QR decoding service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DecoderConfig {
    /// Endpoint accepting a multipart `file` upload and returning decoded symbols.
    #[serde(default = "default_decoder_endpoint")]
    pub endpoint: String,

    /// Request timeout in seconds.
    #[serde(default = "default_decoder_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            endpoint: default_decoder_endpoint(),
            timeout_secs: default_decoder_timeout_secs(),
        }
    }
}

fn default_decoder_endpoint() -> String {
    "https://api.qrserver.com/v1/read-qr-code/".to_string()
}

fn default_decoder_timeout_secs() -> u64 {
    15
}
