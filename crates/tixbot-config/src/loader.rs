// SPDX-FileCopyrightText: 2026 Tixbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Lookup order: `./tixbot.toml` > `~/.config/tixbot/tixbot.toml` > `/etc/tixbot/tixbot.toml`,
//! with environment variable overrides via the `TIXBOT_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::TixbotConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/tixbot/tixbot.toml`
/// 3. `~/.config/tixbot/tixbot.toml`
/// 4. `./tixbot.toml`
/// 5. `TIXBOT_*` environment variables
pub fn load_config() -> Result<TixbotConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<TixbotConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TixbotConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<TixbotConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TixbotConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for config loading, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(TixbotConfig::default()))
        .merge(Toml::file("/etc/tixbot/tixbot.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("tixbot/tixbot.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("tixbot.toml"))
        .merge(env_provider())
}

/// Sections addressable through `TIXBOT_<SECTION>_<KEY>` variables.
const ENV_SECTIONS: &[&str] = &["bot", "telegram", "storage", "artifact", "decoder"];

/// Environment provider with an explicit section mapping.
///
/// `Env::split("_")` would turn `TIXBOT_TELEGRAM_BOT_TOKEN` into
/// `telegram.bot.token`; only the first segment names the section.
fn env_provider() -> Env {
    Env::prefixed("TIXBOT_").map(|key| {
        let key_str = key.as_str().to_ascii_lowercase();
        for section in ENV_SECTIONS {
            if let Some(rest) = key_str
                .strip_prefix(section)
                .and_then(|r| r.strip_prefix('_'))
            {
                return format!("{section}.{rest}").into();
            }
        }
        key_str.into()
    })
}
