// SPDX-FileCopyrightText: 2026 Tixbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules for documents and conversations.

pub mod conversations;
pub mod documents;
