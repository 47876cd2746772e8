// SPDX-FileCopyrightText: 2026 Tixbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the tixbot ticketing bot.
//!
//! This crate provides the foundational trait definitions, error types, and
//! common types used throughout the workspace. Every adapter (channel,
//! storage, artifact, decoder) implements traits defined here.

pub mod error;
pub mod traits;
pub mod types;

pub use error::TixbotError;
pub use types::{
    AdapterType, ConversationState, HealthStatus, InboundEvent, MessageId, Namespace, SessionKey,
};

pub use traits::{ArtifactStore, ChannelAdapter, CodeDecoder, PluginAdapter, StorageAdapter};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adapter_type_display_roundtrips() {
        use std::str::FromStr;

        for variant in [
            AdapterType::Channel,
            AdapterType::Storage,
            AdapterType::Artifact,
            AdapterType::Decoder,
        ] {
            let s = variant.to_string();
            let parsed = AdapterType::from_str(&s).expect("should parse back");
            assert_eq!(variant, parsed);
        }
    }

    #[test]
    fn adapter_type_serialization() {
        let channel = AdapterType::Channel;
        let json = serde_json::to_string(&channel).expect("should serialize");
        let parsed: AdapterType = serde_json::from_str(&json).expect("should deserialize");
        assert_eq!(channel, parsed);
    }

    #[test]
    fn health_status_variants() {
        let healthy = HealthStatus::Healthy;
        assert_ne!(HealthStatus::Degraded("slow".into()), healthy);
        assert_ne!(HealthStatus::Unhealthy("down".into()), healthy);
    }

    #[test]
    fn all_trait_modules_are_exported() {
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_channel_adapter<T: ChannelAdapter>() {}
        fn _assert_storage_adapter<T: StorageAdapter>() {}
        fn _assert_artifact_store<T: ArtifactStore>() {}
        fn _assert_code_decoder<T: CodeDecoder>() {}
    }
}
