// SPDX-FileCopyrightText: 2026 Tixbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background thread,
//! which is what makes the conditional updates in [`crate::queries`] atomic.
//! Do NOT create additional Connection instances for writes.

use tixbot_core::TixbotError;
use tracing::debug;

/// Map a tokio-rusqlite error into a storage error.
pub fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> TixbotError {
    TixbotError::Storage {
        source: Box::new(e),
    }
}

/// Handle to the single SQLite writer connection.
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (creating if needed) a WAL-mode database and apply pending migrations.
    pub async fn open(path: &str) -> Result<Self, TixbotError> {
        Self::open_with(path, true).await
    }

    /// Open a database, choosing between WAL and rollback journaling.
    pub async fn open_with(path: &str, wal_mode: bool) -> Result<Self, TixbotError> {
        let journal = if wal_mode { "WAL" } else { "DELETE" };
        let pragmas = format!(
            "PRAGMA journal_mode = {journal};
             PRAGMA synchronous = NORMAL;
             PRAGMA busy_timeout = 5000;
             PRAGMA foreign_keys = ON;"
        );

        // Migrations need a plain `&mut rusqlite::Connection`, so they run on a
        // short-lived blocking connection before the writer thread starts.
        let migrate_path = path.to_string();
        let migrate_pragmas = pragmas.clone();
        tokio::task::spawn_blocking(move || -> Result<(), TixbotError> {
            let mut conn =
                rusqlite::Connection::open(&migrate_path).map_err(TixbotError::storage)?;
            conn.execute_batch(&migrate_pragmas)
                .map_err(TixbotError::storage)?;
            crate::migrations::run_migrations(&mut conn)
        })
        .await
        .map_err(|e| TixbotError::Internal(format!("migration task failed: {e}")))??;

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| TixbotError::Storage {
                source: Box::new(e),
            })?;
        conn.call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute_batch(&pragmas)?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        debug!(path, wal_mode, "database opened");
        Ok(Self { conn })
    }

    /// The shared writer connection. Every query goes through `call()` on it.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoint the WAL and close the connection.
    pub async fn close(self) -> Result<(), TixbotError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        self.conn.close().await.map_err(|e| TixbotError::Storage {
            source: Box::new(e),
        })
    }
}
