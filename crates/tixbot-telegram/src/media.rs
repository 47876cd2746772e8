// SPDX-FileCopyrightText: 2026 Tixbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Photo downloads from Telegram servers.

use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::{FileMeta, PhotoSize};
use tixbot_core::TixbotError;
use tracing::debug;

/// Resolves the file path with `getFile`, then downloads the content.
pub async fn download_file(bot: &Bot, file_meta: &FileMeta) -> Result<Vec<u8>, TixbotError> {
    let file = bot
        .get_file(file_meta.id.clone())
        .await
        .map_err(|e| TixbotError::Channel {
            message: format!("failed to get file info: {e}"),
            source: Some(Box::new(e)),
        })?;

    let mut buf = Vec::new();
    bot.download_file(&file.path, &mut buf)
        .await
        .map_err(|e| TixbotError::Channel {
            message: format!("failed to download file: {e}"),
            source: Some(Box::new(e)),
        })?;

    debug!(file_id = %file_meta.id, size = buf.len(), "downloaded file from Telegram");
    Ok(buf)
}

/// Downloads the largest variant of a photo; Telegram lists it last.
pub async fn download_largest_photo(bot: &Bot, photos: &[PhotoSize]) -> Result<Vec<u8>, TixbotError> {
    let largest = photos.last().ok_or_else(|| TixbotError::Channel {
        message: "photo array is empty".into(),
        source: None,
    })?;
    download_file(bot, &largest.file).await
}
