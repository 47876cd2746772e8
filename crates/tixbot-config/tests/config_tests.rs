// SPDX-FileCopyrightText: 2026 Tixbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the tixbot configuration system.

use tixbot_config::diagnostic::ConfigError;
use tixbot_config::model::TixbotConfig;
use tixbot_config::{load_and_validate_str, load_config_from_str};

/// Valid TOML with all known fields deserializes successfully.
#[test]
fn valid_toml_deserializes_into_tixbot_config() {
    let toml = r#"
[bot]
name = "fest-bot"
log_level = "debug"
event_title = "Summer Fest"
info_text = "Doors open at 19:00"
currency = "EUR"
drain_timeout_secs = 5

[telegram]
bot_token = "123:ABC"
payment_provider_token = "prov:TEST"
max_tip_amount = 5000
suggested_tips = [1000, 2000]

[storage]
database_path = "/tmp/test.db"
wal_mode = false

[artifact]
output_dir = "/tmp/tickets"
module_scale = 6

[decoder]
endpoint = "http://localhost:9000/read"
timeout_secs = 3
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.bot.name, "fest-bot");
    assert_eq!(config.bot.log_level, "debug");
    assert_eq!(config.bot.event_title, "Summer Fest");
    assert_eq!(config.bot.currency, "EUR");
    assert_eq!(config.bot.drain_timeout_secs, 5);
    assert_eq!(config.telegram.bot_token.as_deref(), Some("123:ABC"));
    assert_eq!(
        config.telegram.payment_provider_token.as_deref(),
        Some("prov:TEST")
    );
    assert_eq!(config.telegram.suggested_tips, vec![1000, 2000]);
    assert_eq!(config.storage.database_path, "/tmp/test.db");
    assert!(!config.storage.wal_mode);
    assert_eq!(config.artifact.output_dir, "/tmp/tickets");
    assert_eq!(config.artifact.module_scale, 6);
    assert_eq!(config.decoder.endpoint, "http://localhost:9000/read");
    assert_eq!(config.decoder.timeout_secs, 3);
}

/// Empty TOML yields the compiled defaults.
#[test]
fn empty_toml_uses_defaults() {
    let config = load_config_from_str("").expect("empty TOML is valid");
    assert_eq!(config.bot.name, "tixbot");
    assert_eq!(config.bot.currency, "RUB");
    assert!(config.telegram.bot_token.is_none());
    assert!(config.storage.wal_mode);
    assert_eq!(config.artifact.module_scale, 10);
}

/// Unknown field in [bot] section is rejected with a suggestion.
#[test]
fn unknown_field_in_bot_produces_suggestion() {
    let toml = r#"
[bot]
event_tilte = "x"
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject unknown field");
    assert!(errors.iter().any(|e| matches!(
        e,
        ConfigError::UnknownKey { key, suggestion: Some(s), .. }
            if key == "event_tilte" && s == "event_title"
    )));
}

/// Unknown field in [telegram] section is rejected.
#[test]
fn unknown_field_in_telegram_produces_error() {
    let toml = r#"
[telegram]
bot_tken = "abc"
"#;

    let err = load_config_from_str(toml).expect_err("should reject unknown field");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("bot_tken"),
        "error should mention the bad key, got: {err_str}"
    );
}

/// Unknown top-level section is rejected.
#[test]
fn unknown_section_produces_error() {
    let toml = r#"
[payments]
provider = "x"
"#;
    assert!(load_config_from_str(toml).is_err());
}

/// Wrong value type is reported as InvalidType.
#[test]
fn wrong_type_is_reported() {
    let toml = r#"
[artifact]
module_scale = "big"
"#;
    let errors = load_and_validate_str(toml).expect_err("string is not a u32");
    assert!(errors
        .iter()
        .any(|e| matches!(e, ConfigError::InvalidType { .. } | ConfigError::Other(_))));
}

/// Semantically invalid values fail validation after deserialization.
#[test]
fn validation_runs_after_deserialization() {
    let toml = r#"
[bot]
currency = "roubles"
"#;
    let errors = load_and_validate_str(toml).expect_err("currency must be ISO 4217");
    assert!(errors
        .iter()
        .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("currency"))));
}

/// Defaults survive a serialize/deserialize cycle through TOML.
#[test]
fn default_config_serializes_to_loadable_toml() {
    let rendered = toml::to_string(&TixbotConfig::default()).expect("serializable");
    let config = load_and_validate_str(&rendered).expect("defaults are valid");
    assert_eq!(config.bot.event_title, TixbotConfig::default().bot.event_title);
}
