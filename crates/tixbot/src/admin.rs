// SPDX-FileCopyrightText: 2026 Tixbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `tixbot admin grant|revoke` command implementation.

use tixbot_agent::operator;
use tixbot_config::model::TixbotConfig;
use tixbot_core::{StorageAdapter, TixbotError};

use crate::serve::open_storage;

/// Runs `tixbot admin grant <user_id>` (`admin = true`) or `revoke`.
///
/// The user must have pressed `/start` at least once.
pub async fn run_admin(config: &TixbotConfig, user_id: i64, admin: bool) -> Result<(), TixbotError> {
    let storage = open_storage(&config.storage).await?;
    let result = operator::set_admin(&storage, user_id, admin).await;
    storage.close().await?;
    result?;

    let verb = if admin { "granted to" } else { "revoked from" };
    eprintln!("Admin rights {verb} user {user_id}");
    Ok(())
}
