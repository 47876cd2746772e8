// SPDX-FileCopyrightText: 2026 Tixbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the StorageAdapter trait.

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::OnceCell;
use tracing::debug;

use tixbot_config::model::StorageConfig;
use tixbot_core::{AdapterType, HealthStatus, PluginAdapter, StorageAdapter, TixbotError};

use crate::database::Database;
use crate::queries;

/// SQLite-backed storage adapter.
///
/// The database is opened on the first call to [`StorageAdapter::initialize`].
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// Create a new SqliteStorage with the given configuration.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    fn db(&self) -> Result<&Database, TixbotError> {
        self.db.get().ok_or_else(|| TixbotError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }

    async fn checkpoint(&self) -> Result<(), TixbotError> {
        if let Some(db) = self.db.get() {
            db.connection()
                .call(|conn| -> Result<(), rusqlite::Error> {
                    conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                    Ok(())
                })
                .await
                .map_err(crate::database::map_tr_err)?;
            debug!("WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, TixbotError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), TixbotError> {
        self.checkpoint().await
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), TixbotError> {
        let path = self.config.database_path.clone();
        if let Some(parent) = std::path::Path::new(&path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(TixbotError::storage)?;
        }
        let db = Database::open_with(&path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| TixbotError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), TixbotError> {
        self.db()?;
        self.checkpoint().await
    }

    // --- Documents ---

    async fn insert_document(
        &self,
        collection: &str,
        id: &str,
        body: &Map<String, Value>,
    ) -> Result<(), TixbotError> {
        if queries::documents::insert_document(self.db()?, collection, id, body).await? {
            Ok(())
        } else {
            Err(TixbotError::AlreadyExists {
                collection: collection.to_string(),
                id: id.to_string(),
            })
        }
    }

    async fn get_document(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<Map<String, Value>>, TixbotError> {
        queries::documents::get_document(self.db()?, collection, id).await
    }

    async fn merge_document(
        &self,
        collection: &str,
        id: &str,
        patch: &Map<String, Value>,
    ) -> Result<(), TixbotError> {
        if queries::documents::merge_document(self.db()?, collection, id, patch).await? {
            Ok(())
        } else {
            Err(TixbotError::not_found(collection, id))
        }
    }

    async fn merge_document_if_absent(
        &self,
        collection: &str,
        id: &str,
        guard_field: &str,
        patch: &Map<String, Value>,
    ) -> Result<bool, TixbotError> {
        queries::documents::merge_document_if_absent(self.db()?, collection, id, guard_field, patch)
            .await
    }

    async fn list_documents(
        &self,
        collection: &str,
        order_by: Option<&str>,
    ) -> Result<Vec<Map<String, Value>>, TixbotError> {
        queries::documents::list_documents(self.db()?, collection, order_by).await
    }

    // --- Conversations ---

    async fn list_conversations(
        &self,
        namespace: &str,
    ) -> Result<Vec<(String, String)>, TixbotError> {
        queries::conversations::list_conversations(self.db()?, namespace).await
    }

    async fn get_conversation(
        &self,
        namespace: &str,
        session_key: &str,
    ) -> Result<Option<String>, TixbotError> {
        queries::conversations::get_conversation(self.db()?, namespace, session_key).await
    }

    async fn set_conversation(
        &self,
        namespace: &str,
        session_key: &str,
        state: Option<&str>,
    ) -> Result<(), TixbotError> {
        queries::conversations::set_conversation(self.db()?, namespace, session_key, state).await
    }
}
