// SPDX-FileCopyrightText: 2026 Tixbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ticket artifacts for tixbot.
//!
//! - [`FileArtifactStore`] renders a purchase id as a framed QR PNG and keeps
//!   it on disk for re-delivery.
//! - [`QrServerDecoder`] reads a code back from a photo taken at the door.

pub mod decoder;
pub mod render;

pub use decoder::QrServerDecoder;
pub use render::{FileArtifactStore, render_png};
