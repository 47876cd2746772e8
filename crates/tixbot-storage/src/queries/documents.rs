// SPDX-FileCopyrightText: 2026 Tixbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Keyed JSON document operations.
//!
//! Bodies are stored as JSON text. Merges use SQLite's `json_patch` (RFC 7396),
//! so a patch only touches the keys it names and a `null` value removes a key.

use rusqlite::{params, OptionalExtension};
use serde_json::{Map, Value};
use tixbot_core::TixbotError;

use crate::database::Database;

type Body = Map<String, Value>;

/// JSON path addressing a top-level field, quoted so any key is safe.
fn field_path(field: &str) -> String {
    format!("$.\"{}\"", field.replace('"', "\\\""))
}

fn encode(body: &Body) -> Result<String, TixbotError> {
    serde_json::to_string(body).map_err(TixbotError::storage)
}

fn decode(text: String) -> Result<Body, rusqlite::Error> {
    serde_json::from_str(&text).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Insert a new document. Returns `false` if the id already exists (nothing is written).
pub async fn insert_document(
    db: &Database,
    collection: &str,
    id: &str,
    body: &Body,
) -> Result<bool, TixbotError> {
    let collection = collection.to_string();
    let id = id.to_string();
    let body = encode(body)?;
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let changed = conn.execute(
                "INSERT INTO documents (collection, id, body) VALUES (?1, ?2, ?3)
                 ON CONFLICT (collection, id) DO NOTHING",
                params![collection, id, body],
            )?;
            Ok(changed == 1)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Load a document body by id.
pub async fn get_document(
    db: &Database,
    collection: &str,
    id: &str,
) -> Result<Option<Body>, TixbotError> {
    let collection = collection.to_string();
    let id = id.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<Body>, rusqlite::Error> {
            let text: Option<String> = conn
                .query_row(
                    "SELECT body FROM documents WHERE collection = ?1 AND id = ?2",
                    params![collection, id],
                    |row| row.get(0),
                )
                .optional()?;
            text.map(decode).transpose()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Merge `patch` into an existing document. Returns `false` if the document does not exist.
pub async fn merge_document(
    db: &Database,
    collection: &str,
    id: &str,
    patch: &Body,
) -> Result<bool, TixbotError> {
    let collection = collection.to_string();
    let id = id.to_string();
    let patch = encode(patch)?;
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let changed = conn.execute(
                "UPDATE documents
                 SET body = json_patch(body, ?3),
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE collection = ?1 AND id = ?2",
                params![collection, id, patch],
            )?;
            Ok(changed == 1)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Merge `patch` only while `guard_field` is absent or null.
///
/// The check and the write are one UPDATE statement on the single writer
/// connection, so two racing callers cannot both see the guard unset.
pub async fn merge_document_if_absent(
    db: &Database,
    collection: &str,
    id: &str,
    guard_field: &str,
    patch: &Body,
) -> Result<bool, TixbotError> {
    let collection = collection.to_string();
    let id = id.to_string();
    let guard = field_path(guard_field);
    let patch = encode(patch)?;
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let changed = conn.execute(
                "UPDATE documents
                 SET body = json_patch(body, ?4),
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE collection = ?1 AND id = ?2
                   AND json_extract(body, ?3) IS NULL",
                params![collection, id, guard, patch],
            )?;
            Ok(changed == 1)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// List every document of a collection, ascending by `order_by` then id.
pub async fn list_documents(
    db: &Database,
    collection: &str,
    order_by: Option<&str>,
) -> Result<Vec<Body>, TixbotError> {
    let collection = collection.to_string();
    let order_path = order_by.map(field_path);
    db.connection()
        .call(move |conn| -> Result<Vec<Body>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT body FROM documents
                 WHERE collection = ?1
                 ORDER BY CASE WHEN ?2 IS NULL THEN NULL ELSE json_extract(body, ?2) END, id",
            )?;
            let rows = stmt.query_map(params![collection, order_path], |row| {
                row.get::<_, String>(0)
            })?;
            rows.map(|text| decode(text?)).collect()
        })
        .await
        .map_err(crate::database::map_tr_err)
}
