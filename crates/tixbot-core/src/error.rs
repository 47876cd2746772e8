// SPDX-FileCopyrightText: 2026 Tixbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the tixbot workspace.

use thiserror::Error;

/// The primary error type used across all tixbot adapter traits and domain operations.
#[derive(Debug, Error)]
pub enum TixbotError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Channel adapter errors (connection failure, message format, rate limiting).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A keyed document does not exist in its collection.
    #[error("{collection}/{id} not found")]
    NotFound { collection: String, id: String },

    /// Create-if-absent found an existing document under the same key.
    #[error("{collection}/{id} already exists")]
    AlreadyExists { collection: String, id: String },

    /// A save tried to write a field only the store itself may set.
    #[error("field `{field}` of {collection} is read-only")]
    ImmutableField { collection: String, field: String },

    /// The acting user lacks the privilege required for the operation.
    #[error("user {user_id} is not authorized for this action")]
    Unauthorized { user_id: i64 },

    /// User-supplied input failed validation.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Persisted data contradicts an invariant (e.g. a confirmed payment for an unknown item).
    #[error("integrity error: {0}")]
    Integrity(String),

    /// The user already owns a purchase, so another one cannot be linked.
    #[error("user {user_id} already owns purchase {purchase_id}")]
    AlreadyOwned { user_id: i64, purchase_id: String },

    /// An outbound effect (message, artifact) could not be delivered after commit.
    #[error("delivery failed: {message}")]
    DeliveryFailed {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl TixbotError {
    /// Shorthand for a [`TixbotError::NotFound`] in `collection`.
    pub fn not_found(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            collection: collection.into(),
            id: id.into(),
        }
    }

    /// Wrap any error as a storage failure.
    pub fn storage(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Storage {
            source: Box::new(source),
        }
    }

    /// The inbound stream ended; no further events will arrive.
    pub fn channel_closed() -> Self {
        Self::Channel {
            message: "channel closed".into(),
            source: None,
        }
    }

    /// Returns true when the error means the inbound stream has ended.
    pub fn is_channel_closed(&self) -> bool {
        matches!(self, Self::Channel { message, .. } if message == "channel closed")
    }

    /// Returns true for errors that should only re-prompt the user.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. } | Self::Validation(_) | Self::Unauthorized { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display_names_collection_and_id() {
        let err = TixbotError::not_found("purchases", "ch_1");
        assert_eq!(err.to_string(), "purchases/ch_1 not found");
    }

    #[test]
    fn closed_channel_is_recognized() {
        assert!(TixbotError::channel_closed().is_channel_closed());
        assert!(
            !TixbotError::Channel {
                message: "timeout".into(),
                source: None
            }
            .is_channel_closed()
        );
    }

    #[test]
    fn user_facing_classification() {
        assert!(TixbotError::Validation("bad link".into()).is_user_facing());
        assert!(TixbotError::Unauthorized { user_id: 7 }.is_user_facing());
        assert!(!TixbotError::Integrity("unknown item".into()).is_user_facing());
        assert!(
            !TixbotError::DeliveryFailed {
                message: "x".into(),
                source: None
            }
            .is_user_facing()
        );
    }
}
