// SPDX-FileCopyrightText: 2026 Tixbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation handlers, implemented as methods on [`crate::bot::Bot`].

mod admin;
mod user;
