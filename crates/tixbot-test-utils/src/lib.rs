// SPDX-FileCopyrightText: 2026 Tixbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for tixbot integration tests.
//!
//! Provides mock adapters and a scenario harness for fast, deterministic
//! tests without Telegram, the filesystem renderer, or the decoding service.

pub mod harness;
pub mod mock_artifacts;
pub mod mock_channel;

pub use harness::TestHarness;
pub use mock_artifacts::{DecodeOutcome, MockArtifacts, MockDecoder};
pub use mock_channel::{Effect, MockChannel};
