// SPDX-FileCopyrightText: 2026 Tixbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation state persistence, one label per (namespace, session key).

use rusqlite::{params, OptionalExtension};
use tixbot_core::TixbotError;

use crate::database::Database;

/// All `(session_key, state)` pairs under a namespace, ordered by key.
pub async fn list_conversations(
    db: &Database,
    namespace: &str,
) -> Result<Vec<(String, String)>, TixbotError> {
    let namespace = namespace.to_string();
    db.connection()
        .call(move |conn| -> Result<Vec<(String, String)>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT session_key, state FROM conversations
                 WHERE namespace = ?1 ORDER BY session_key",
            )?;
            let rows = stmt.query_map(params![namespace], |row| Ok((row.get(0)?, row.get(1)?)))?;
            rows.collect()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// The state stored for one session key.
pub async fn get_conversation(
    db: &Database,
    namespace: &str,
    session_key: &str,
) -> Result<Option<String>, TixbotError> {
    let namespace = namespace.to_string();
    let session_key = session_key.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<String>, rusqlite::Error> {
            conn.query_row(
                "SELECT state FROM conversations WHERE namespace = ?1 AND session_key = ?2",
                params![namespace, session_key],
                |row| row.get(0),
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Upsert a state, or delete the row when `state` is `None`.
pub async fn set_conversation(
    db: &Database,
    namespace: &str,
    session_key: &str,
    state: Option<&str>,
) -> Result<(), TixbotError> {
    let namespace = namespace.to_string();
    let session_key = session_key.to_string();
    let state = state.map(str::to_string);
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            match state {
                Some(state) => conn.execute(
                    "INSERT INTO conversations (namespace, session_key, state) VALUES (?1, ?2, ?3)
                     ON CONFLICT (namespace, session_key) DO UPDATE
                     SET state = excluded.state,
                         updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                    params![namespace, session_key, state],
                )?,
                None => conn.execute(
                    "DELETE FROM conversations WHERE namespace = ?1 AND session_key = ?2",
                    params![namespace, session_key],
                )?,
            };
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    #[tokio::test]
    async fn set_get_and_delete_roundtrip() {
        let (db, _dir) = setup_db().await;
        let ns = "user_states_conversation";

        set_conversation(&db, ns, "42", Some("WAITING_NAME")).await.unwrap();
        assert_eq!(
            get_conversation(&db, ns, "42").await.unwrap().as_deref(),
            Some("WAITING_NAME")
        );

        set_conversation(&db, ns, "42", Some("WAITING_VK")).await.unwrap();
        assert_eq!(
            list_conversations(&db, ns).await.unwrap(),
            vec![("42".to_string(), "WAITING_VK".to_string())]
        );

        set_conversation(&db, ns, "42", None).await.unwrap();
        assert!(get_conversation(&db, ns, "42").await.unwrap().is_none());
        assert!(list_conversations(&db, ns).await.unwrap().is_empty());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn namespaces_are_independent() {
        let (db, _dir) = setup_db().await;
        set_conversation(&db, "user_states_conversation", "1", Some("READY_DASHBOARD"))
            .await
            .unwrap();
        set_conversation(&db, "admin_states_conversation", "1", Some("ADMIN_CHECKIN"))
            .await
            .unwrap();

        set_conversation(&db, "admin_states_conversation", "1", None)
            .await
            .unwrap();
        assert_eq!(
            get_conversation(&db, "user_states_conversation", "1")
                .await
                .unwrap()
                .as_deref(),
            Some("READY_DASHBOARD")
        );
    }

    #[tokio::test]
    async fn deleting_absent_session_is_a_noop() {
        let (db, _dir) = setup_db().await;
        set_conversation(&db, "user_states_conversation", "9", None)
            .await
            .unwrap();
    }
}
