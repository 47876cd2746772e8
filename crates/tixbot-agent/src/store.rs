// SPDX-FileCopyrightText: 2026 Tixbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed keyed collections over the document store.
//!
//! [`Collection`] is generic over a [`Document`] type. Entities record which
//! fields their setters touched, and [`Collection::save`] writes only those
//! fields, so concurrent writers on disjoint fields never clobber each other.

use std::collections::BTreeSet;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tixbot_core::{StorageAdapter, TixbotError};

/// Names of fields changed locally since the last load or save.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirtyFields(BTreeSet<&'static str>);

impl DirtyFields {
    pub fn mark(&mut self, field: &'static str) {
        self.0.insert(field);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains(field)
    }

    fn iter(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.iter().copied()
    }

    fn clear(&mut self) {
        self.0.clear();
    }
}

/// An entity stored as one keyed document.
pub trait Document: Serialize + DeserializeOwned + Send + Sync {
    /// Collection the documents live in.
    const COLLECTION: &'static str;

    /// Fields that only direct store edits may change.
    const READ_ONLY: &'static [&'static str];

    /// Document key.
    fn key(&self) -> String;

    fn dirty(&self) -> &DirtyFields;

    fn dirty_mut(&mut self) -> &mut DirtyFields;
}

/// Typed access to one collection of the document store.
pub struct Collection<D> {
    storage: Arc<dyn StorageAdapter>,
    _marker: PhantomData<fn() -> D>,
}

impl<D> Clone for Collection<D> {
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
            _marker: PhantomData,
        }
    }
}

impl<D: Document> Collection<D> {
    pub fn new(storage: Arc<dyn StorageAdapter>) -> Self {
        Self {
            storage,
            _marker: PhantomData,
        }
    }

    pub async fn exists(&self, id: &str) -> Result<bool, TixbotError> {
        Ok(self.storage.get_document(D::COLLECTION, id).await?.is_some())
    }

    /// Insert a new document with every field. Fails with `AlreadyExists` if the key is taken.
    pub async fn create(&self, mut doc: D) -> Result<D, TixbotError> {
        let body = to_body(&doc)?;
        self.storage
            .insert_document(D::COLLECTION, &doc.key(), &body)
            .await?;
        doc.dirty_mut().clear();
        Ok(doc)
    }

    /// Load a document, failing with `NotFound` if absent.
    pub async fn load(&self, id: &str) -> Result<D, TixbotError> {
        self.find(id)
            .await?
            .ok_or_else(|| TixbotError::not_found(D::COLLECTION, id))
    }

    /// Load a document if present.
    pub async fn find(&self, id: &str) -> Result<Option<D>, TixbotError> {
        self.storage
            .get_document(D::COLLECTION, id)
            .await?
            .map(from_body)
            .transpose()
    }

    /// Merge-write only the fields marked dirty.
    pub async fn save(&self, doc: &mut D) -> Result<(), TixbotError> {
        if doc.dirty().is_empty() {
            return Ok(());
        }
        let patch = dirty_patch(doc)?;
        self.storage
            .merge_document(D::COLLECTION, &doc.key(), &patch)
            .await?;
        doc.dirty_mut().clear();
        Ok(())
    }

    /// Merge-write the dirty fields only if `guard` is still unset in the store.
    ///
    /// Returns `false` (and leaves the entity dirty) when the guard was already
    /// set by someone else; the caller should reload.
    pub async fn save_if_absent(&self, doc: &mut D, guard: &str) -> Result<bool, TixbotError> {
        let patch = dirty_patch(doc)?;
        let written = self
            .storage
            .merge_document_if_absent(D::COLLECTION, &doc.key(), guard, &patch)
            .await?;
        if written {
            doc.dirty_mut().clear();
        }
        Ok(written)
    }

    /// All documents ordered by `sort_key` (ascending unless `reverse`).
    pub async fn list(&self, sort_key: Option<&str>, reverse: bool) -> Result<Vec<D>, TixbotError> {
        let mut docs = self
            .storage
            .list_documents(D::COLLECTION, sort_key)
            .await?
            .into_iter()
            .map(from_body)
            .collect::<Result<Vec<D>, _>>()?;
        if reverse {
            docs.reverse();
        }
        Ok(docs)
    }
}

fn to_body<D: Document>(doc: &D) -> Result<Map<String, Value>, TixbotError> {
    match serde_json::to_value(doc).map_err(TixbotError::storage)? {
        Value::Object(map) => Ok(map),
        other => Err(TixbotError::Internal(format!(
            "{} serialized to non-object {other}",
            D::COLLECTION
        ))),
    }
}

fn from_body<D: Document>(body: Map<String, Value>) -> Result<D, TixbotError> {
    serde_json::from_value(Value::Object(body)).map_err(TixbotError::storage)
}

fn dirty_patch<D: Document>(doc: &D) -> Result<Map<String, Value>, TixbotError> {
    if let Some(field) = doc.dirty().iter().find(|f| D::READ_ONLY.contains(f)) {
        return Err(TixbotError::ImmutableField {
            collection: D::COLLECTION.to_string(),
            field: field.to_string(),
        });
    }
    let mut full = to_body(doc)?;
    Ok(doc
        .dirty()
        .iter()
        .map(|field| (field.to_string(), full.remove(field).unwrap_or(Value::Null)))
        .collect())
}
