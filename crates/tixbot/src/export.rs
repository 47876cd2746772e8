// SPDX-FileCopyrightText: 2026 Tixbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `tixbot export` command implementation.
//!
//! Writes the same CSV the admin "Export" button sends, straight to a file.

use std::path::Path;

use tixbot_agent::operator;
use tixbot_config::model::TixbotConfig;
use tixbot_core::{StorageAdapter, TixbotError};

use crate::serve::open_storage;

/// Runs `tixbot export <path>`.
pub async fn run_export(config: &TixbotConfig, path: &Path) -> Result<(), TixbotError> {
    let storage = open_storage(&config.storage).await?;
    let csv = operator::export_purchases(&storage).await;
    storage.close().await?;
    let csv = csv?;

    tokio::fs::write(path, &csv)
        .await
        .map_err(TixbotError::storage)?;

    let size_kb = csv.len() as f64 / 1024.0;
    eprintln!("Export complete: {size_kb:.1} KB written to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn export_of_empty_store_writes_header_only() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = TixbotConfig::default();
        config.storage.database_path = dir.path().join("e.db").to_string_lossy().into_owned();
        let out = dir.path().join("purchases.csv");

        run_export(&config, &out).await.unwrap();

        let written = std::fs::read_to_string(&out).unwrap();
        assert_eq!(written.lines().count(), 1);
        assert!(written.starts_with("customer_name,"));
    }

    #[tokio::test]
    async fn export_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = TixbotConfig::default();
        config.storage.database_path = dir.path().join("e.db").to_string_lossy().into_owned();
        let out = dir.path().join("missing").join("purchases.csv");

        assert!(run_export(&config, &out).await.is_err());
    }
}
