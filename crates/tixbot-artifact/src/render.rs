// SPDX-FileCopyrightText: 2026 Tixbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! QR ticket rendering with on-disk storage.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use image::{ImageFormat, Rgb, RgbImage};
use qrcode::{Color, QrCode};
use tracing::{debug, info};

use tixbot_config::model::ArtifactConfig;
use tixbot_core::types::TicketCard;
use tixbot_core::{AdapterType, ArtifactStore, HealthStatus, PluginAdapter, TixbotError};

/// Frame color around the code.
const PANEL: Rgb<u8> = Rgb([44, 44, 212]);
const DARK: Rgb<u8> = Rgb([0, 0, 0]);
const LIGHT: Rgb<u8> = Rgb([255, 255, 255]);
/// Light modules around the symbol, as required by the QR standard.
const QUIET_ZONE: u32 = 4;
/// Frame thickness, in modules.
const FRAME: u32 = 2;

/// Renders tickets as PNG files named `<purchase_id>.png` under a directory.
pub struct FileArtifactStore {
    output_dir: PathBuf,
    module_scale: u32,
}

impl FileArtifactStore {
    pub fn new(config: &ArtifactConfig) -> Self {
        Self {
            output_dir: PathBuf::from(&config.output_dir),
            module_scale: config.module_scale.max(1),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn path_for(&self, purchase_id: &str) -> Result<PathBuf, TixbotError> {
        if purchase_id.is_empty()
            || !purchase_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            || purchase_id.starts_with('.')
        {
            return Err(TixbotError::Validation(format!(
                "purchase id '{purchase_id}' is not a valid file name"
            )));
        }
        Ok(self.output_dir.join(format!("{purchase_id}.png")))
    }
}

/// Encode `payload` as a QR code framed by the ticket panel, as PNG bytes.
pub fn render_png(payload: &str, module_scale: u32) -> Result<Vec<u8>, TixbotError> {
    let code = QrCode::new(payload.as_bytes())
        .map_err(|e| TixbotError::Internal(format!("qr encoding failed: {e}")))?;
    let modules = code.width() as u32;
    let colors = code.to_colors();
    let scale = module_scale.max(1);

    let inner = modules + 2 * QUIET_ZONE;
    let side = (inner + 2 * FRAME) * scale;
    let mut img = RgbImage::from_pixel(side, side, PANEL);

    let origin = FRAME * scale;
    for y in 0..inner * scale {
        for x in 0..inner * scale {
            let (mx, my) = (x / scale, y / scale);
            let dark = mx >= QUIET_ZONE
                && my >= QUIET_ZONE
                && mx < QUIET_ZONE + modules
                && my < QUIET_ZONE + modules
                && colors[((my - QUIET_ZONE) * modules + (mx - QUIET_ZONE)) as usize]
                    == Color::Dark;
            img.put_pixel(origin + x, origin + y, if dark { DARK } else { LIGHT });
        }
    }

    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| TixbotError::Internal(format!("png encoding failed: {e}")))?;
    Ok(bytes)
}

#[async_trait]
impl PluginAdapter for FileArtifactStore {
    fn name(&self) -> &str {
        "qr-png"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Artifact
    }

    async fn health_check(&self) -> Result<HealthStatus, TixbotError> {
        match tokio::fs::metadata(&self.output_dir).await {
            Ok(meta) if meta.is_dir() => Ok(HealthStatus::Healthy),
            Ok(_) => Ok(HealthStatus::Unhealthy(format!(
                "{} is not a directory",
                self.output_dir.display()
            ))),
            Err(_) => Ok(HealthStatus::Degraded(format!(
                "{} does not exist yet",
                self.output_dir.display()
            ))),
        }
    }

    async fn shutdown(&self) -> Result<(), TixbotError> {
        Ok(())
    }
}

#[async_trait]
impl ArtifactStore for FileArtifactStore {
    async fn generate(&self, card: &TicketCard) -> Result<Vec<u8>, TixbotError> {
        let path = self.path_for(&card.purchase_id)?;
        let payload = card.purchase_id.clone();
        let scale = self.module_scale;
        let bytes = tokio::task::spawn_blocking(move || render_png(&payload, scale))
            .await
            .map_err(|e| TixbotError::Internal(format!("render task failed: {e}")))??;

        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| TixbotError::DeliveryFailed {
                message: format!("cannot create {}", self.output_dir.display()),
                source: Some(Box::new(e)),
            })?;
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| TixbotError::DeliveryFailed {
                message: format!("cannot write {}", path.display()),
                source: Some(Box::new(e)),
            })?;
        info!(purchase_id = card.purchase_id.as_str(), path = %path.display(), "ticket rendered");
        Ok(bytes)
    }

    async fn fetch(&self, purchase_id: &str) -> Result<Option<Vec<u8>>, TixbotError> {
        let path = self.path_for(purchase_id)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(purchase_id, "no stored ticket image");
                Ok(None)
            }
            Err(e) => Err(TixbotError::DeliveryFailed {
                message: format!("cannot read {}", path.display()),
                source: Some(Box::new(e)),
            }),
        }
    }
}
