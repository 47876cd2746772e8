// SPDX-FileCopyrightText: 2026 Tixbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks semantic constraints serde cannot express: non-empty paths,
//! positive sizes and timeouts, currency codes, and endpoint URLs.

use crate::diagnostic::ConfigError;
use crate::model::TixbotConfig;

/// Validate a deserialized configuration, collecting every error instead of failing fast.
pub fn validate_config(config: &TixbotConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    if config.artifact.output_dir.trim().is_empty() {
        fail("artifact.output_dir must not be empty".to_string());
    }

    if config.artifact.module_scale == 0 {
        fail("artifact.module_scale must be at least 1".to_string());
    }

    let currency = &config.bot.currency;
    if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_uppercase()) {
        fail(format!(
            "bot.currency must be a three-letter ISO 4217 code, got `{currency}`"
        ));
    }

    if config.bot.event_title.trim().is_empty() {
        fail("bot.event_title must not be empty".to_string());
    }

    if config.decoder.timeout_secs == 0 {
        fail("decoder.timeout_secs must be at least 1".to_string());
    }

    match reqwest::Url::parse(&config.decoder.endpoint) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => fail(format!(
            "decoder.endpoint must use http or https, got `{}`",
            url.scheme()
        )),
        Err(e) => fail(format!(
            "decoder.endpoint `{}` is not a valid URL: {e}",
            config.decoder.endpoint
        )),
    }

    if config.telegram.max_tip_amount < 0 {
        fail(format!(
            "telegram.max_tip_amount must be non-negative, got {}",
            config.telegram.max_tip_amount
        ));
    }

    if config.telegram.suggested_tips.len() > 4 {
        fail("telegram.suggested_tips accepts at most 4 entries".to_string());
    }

    if config
        .telegram
        .suggested_tips
        .iter()
        .any(|tip| *tip <= 0 || *tip > config.telegram.max_tip_amount)
    {
        fail("telegram.suggested_tips must be positive and not exceed max_tip_amount".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_message(errors: &[ConfigError], needle: &str) -> bool {
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains(needle)))
    }

    #[test]
    fn default_config_validates() {
        assert!(validate_config(&TixbotConfig::default()).is_ok());
    }

    #[test]
    fn empty_database_path_fails_validation() {
        let mut config = TixbotConfig::default();
        config.storage.database_path = "".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "database_path"));
    }

    #[test]
    fn lowercase_currency_fails_validation() {
        let mut config = TixbotConfig::default();
        config.bot.currency = "rub".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "bot.currency"));
    }

    #[test]
    fn bad_decoder_endpoint_fails_validation() {
        let mut config = TixbotConfig::default();
        config.decoder.endpoint = "ftp://example.com/read".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "decoder.endpoint"));
    }

    #[test]
    fn tips_above_maximum_fail_validation() {
        let mut config = TixbotConfig::default();
        config.telegram.max_tip_amount = 100;
        config.telegram.suggested_tips = vec![50, 500];
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "suggested_tips"));
    }

    #[test]
    fn all_errors_are_collected() {
        let mut config = TixbotConfig::default();
        config.storage.database_path = " ".to_string();
        config.artifact.module_scale = 0;
        config.decoder.timeout_secs = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }
}
