// SPDX-FileCopyrightText: 2026 Tixbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persisted conversation positions.
//!
//! The tracker keeps nothing in memory: every resolution reads the stored
//! label, so a restarted process picks up exactly where users left off.

use std::collections::HashMap;
use std::sync::Arc;

use tixbot_core::{ConversationState, Namespace, SessionKey, StorageAdapter, TixbotError};
use tracing::{debug, warn};

/// Maps session keys to conversation states, per namespace.
#[derive(Clone)]
pub struct SessionTracker {
    storage: Arc<dyn StorageAdapter>,
}

impl SessionTracker {
    pub fn new(storage: Arc<dyn StorageAdapter>) -> Self {
        Self { storage }
    }

    /// Every active session of a namespace.
    pub async fn get(
        &self,
        namespace: Namespace,
    ) -> Result<HashMap<SessionKey, ConversationState>, TixbotError> {
        let rows = self
            .storage
            .list_conversations(&namespace.to_string())
            .await?;
        Ok(rows
            .into_iter()
            .filter_map(|(key, label)| parse_row(namespace, &key, &label))
            .collect())
    }

    /// Upsert a state, or end the conversation with `None`.
    pub async fn set_state(
        &self,
        namespace: Namespace,
        key: SessionKey,
        state: Option<ConversationState>,
    ) -> Result<(), TixbotError> {
        if let Some(state) = state
            && state.namespace() != namespace
        {
            return Err(TixbotError::Internal(format!(
                "state {state} does not belong to {namespace}"
            )));
        }
        let label = state.map(|s| s.to_string());
        self.storage
            .set_conversation(&namespace.to_string(), &key.to_string(), label.as_deref())
            .await?;
        debug!(%namespace, session = %key, state = label.as_deref().unwrap_or("none"), "session state updated");
        Ok(())
    }

    /// Current state of one session.
    pub async fn resolve(
        &self,
        namespace: Namespace,
        key: SessionKey,
    ) -> Result<Option<ConversationState>, TixbotError> {
        let label = self
            .storage
            .get_conversation(&namespace.to_string(), &key.to_string())
            .await?;
        Ok(label.and_then(|label| match label.parse() {
            Ok(state) => Some(state),
            Err(_) => {
                warn!(%namespace, session = %key, label, "unknown state label, treating as no session");
                None
            }
        }))
    }
}

fn parse_row(
    namespace: Namespace,
    key: &str,
    label: &str,
) -> Option<(SessionKey, ConversationState)> {
    match (key.parse::<SessionKey>(), label.parse::<ConversationState>()) {
        (Ok(key), Ok(state)) => Some((key, state)),
        _ => {
            warn!(%namespace, key, label, "skipping unreadable session row");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tixbot_config::model::StorageConfig;
    use tixbot_storage::SqliteStorage;

    async fn tracker() -> (SessionTracker, Arc<dyn StorageAdapter>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let storage = SqliteStorage::new(StorageConfig {
            database_path: dir.path().join("s.db").to_string_lossy().into_owned(),
            wal_mode: true,
        });
        storage.initialize().await.unwrap();
        let storage: Arc<dyn StorageAdapter> = Arc::new(storage);
        (SessionTracker::new(storage.clone()), storage, dir)
    }

    #[tokio::test]
    async fn round_trip_and_delete() {
        let (tracker, _storage, _dir) = tracker().await;
        let key = SessionKey::user(42);

        tracker
            .set_state(Namespace::User, key, Some(ConversationState::WaitingVk))
            .await
            .unwrap();

        // A second tracker over the same store sees the state.
        let fresh = SessionTracker::new(tracker.storage.clone());
        assert_eq!(
            fresh.resolve(Namespace::User, key).await.unwrap(),
            Some(ConversationState::WaitingVk)
        );

        tracker.set_state(Namespace::User, key, None).await.unwrap();
        assert!(!tracker.get(Namespace::User).await.unwrap().contains_key(&key));
        assert_eq!(tracker.resolve(Namespace::User, key).await.unwrap(), None);
    }

    #[tokio::test]
    async fn namespaces_are_separate() {
        let (tracker, _storage, _dir) = tracker().await;
        let key = SessionKey::user(1);
        tracker
            .set_state(Namespace::User, key, Some(ConversationState::ReadyDashboard))
            .await
            .unwrap();
        tracker
            .set_state(Namespace::Admin, key, Some(ConversationState::AdminCheckin))
            .await
            .unwrap();

        let users = tracker.get(Namespace::User).await.unwrap();
        let admins = tracker.get(Namespace::Admin).await.unwrap();
        assert_eq!(users.get(&key), Some(&ConversationState::ReadyDashboard));
        assert_eq!(admins.get(&key), Some(&ConversationState::AdminCheckin));
    }

    #[tokio::test]
    async fn state_from_wrong_namespace_is_rejected() {
        let (tracker, _storage, _dir) = tracker().await;
        let err = tracker
            .set_state(
                Namespace::User,
                SessionKey::user(1),
                Some(ConversationState::AdminDashboard),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, TixbotError::Internal(_)));
    }

    #[tokio::test]
    async fn garbage_labels_are_skipped() {
        let (tracker, storage, _dir) = tracker().await;
        storage
            .set_conversation("user_states_conversation", "5", Some("3"))
            .await
            .unwrap();
        storage
            .set_conversation("user_states_conversation", "6", Some("WAITING_NAME"))
            .await
            .unwrap();

        let all = tracker.get(Namespace::User).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(
            tracker.resolve(Namespace::User, SessionKey::user(5)).await.unwrap(),
            None
        );
    }
}
