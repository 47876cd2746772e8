// SPDX-FileCopyrightText: 2026 Tixbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait for persistence backends (SQLite, etc.).

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::TixbotError;
use crate::traits::adapter::PluginAdapter;

/// Adapter for storage and persistence backends.
///
/// Holds two kinds of data: keyed JSON documents grouped into collections,
/// and namespaced conversation state labels.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the storage backend (migrations, connection, etc.).
    async fn initialize(&self) -> Result<(), TixbotError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), TixbotError>;

    // --- Documents ---

    /// Inserts a new document. Fails with `AlreadyExists` if the id is taken.
    async fn insert_document(
        &self,
        collection: &str,
        id: &str,
        body: &Map<String, Value>,
    ) -> Result<(), TixbotError>;

    /// Loads a document body by id.
    async fn get_document(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<Map<String, Value>>, TixbotError>;

    /// Merges `patch` into an existing document. Fails with `NotFound` if absent.
    async fn merge_document(
        &self,
        collection: &str,
        id: &str,
        patch: &Map<String, Value>,
    ) -> Result<(), TixbotError>;

    /// Atomically merges `patch` only if `guard_field` is absent or null.
    ///
    /// Returns `false` when the document is missing or the guard is already set.
    async fn merge_document_if_absent(
        &self,
        collection: &str,
        id: &str,
        guard_field: &str,
        patch: &Map<String, Value>,
    ) -> Result<bool, TixbotError>;

    /// Lists all documents, ascending by `order_by` (or by id when `None`).
    async fn list_documents(
        &self,
        collection: &str,
        order_by: Option<&str>,
    ) -> Result<Vec<Map<String, Value>>, TixbotError>;

    // --- Conversations ---

    /// Returns every `(session_key, state)` pair stored under `namespace`.
    async fn list_conversations(
        &self,
        namespace: &str,
    ) -> Result<Vec<(String, String)>, TixbotError>;

    /// Returns the state stored for one session key.
    async fn get_conversation(
        &self,
        namespace: &str,
        session_key: &str,
    ) -> Result<Option<String>, TixbotError>;

    /// Upserts a state, or deletes the entry when `state` is `None`.
    async fn set_conversation(
        &self,
        namespace: &str,
        session_key: &str,
        state: Option<&str>,
    ) -> Result<(), TixbotError>;
}
