// SPDX-FileCopyrightText: 2026 Tixbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Registered bot users.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tixbot_core::types::Sender;

use crate::store::{DirtyFields, Document};

/// Registration progress of a user.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString, Serialize,
    Deserialize,
)]
pub enum UserStatus {
    /// Opened the bot, profile not complete.
    #[strum(serialize = "just_open_bot")]
    #[serde(rename = "just_open_bot")]
    Welcome,
    /// Profile complete, allowed to buy.
    #[strum(serialize = "approved")]
    #[serde(rename = "approved")]
    Approved,
    /// Owns a ticket.
    #[strum(serialize = "ready")]
    #[serde(rename = "ready")]
    Ready,
}

impl UserStatus {
    /// Wording used in status cards and statistics.
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Welcome => "just opened the bot",
            Self::Approved => "approved, no ticket yet",
            Self::Ready => "has a ticket",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    id: i64,
    first_name: String,
    #[serde(default)]
    last_name: Option<String>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    real_name: Option<String>,
    #[serde(default)]
    vk: Option<String>,
    status: UserStatus,
    #[serde(default)]
    admin: bool,
    #[serde(default)]
    god: bool,
    #[serde(default)]
    purchase_id: Option<String>,
    created: String,
    #[serde(skip)]
    dirty: DirtyFields,
}

impl Document for User {
    const COLLECTION: &'static str = "users";
    const READ_ONLY: &'static [&'static str] = &["id", "admin", "god", "created"];

    fn key(&self) -> String {
        self.id.to_string()
    }

    fn dirty(&self) -> &DirtyFields {
        &self.dirty
    }

    fn dirty_mut(&mut self) -> &mut DirtyFields {
        &mut self.dirty
    }
}

impl User {
    /// A fresh WELCOME user built from the transport profile.
    pub fn new(sender: &Sender, created: String) -> Self {
        Self {
            id: sender.id,
            first_name: sender.first_name.clone(),
            last_name: sender.last_name.clone(),
            username: sender.username.clone(),
            real_name: None,
            vk: None,
            status: UserStatus::Welcome,
            admin: false,
            god: false,
            purchase_id: None,
            created,
            dirty: DirtyFields::default(),
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> Option<&str> {
        self.last_name.as_deref()
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn real_name(&self) -> Option<&str> {
        self.real_name.as_deref()
    }

    pub fn vk(&self) -> Option<&str> {
        self.vk.as_deref()
    }

    pub fn status(&self) -> UserStatus {
        self.status
    }

    pub fn is_admin(&self) -> bool {
        self.admin
    }

    pub fn is_god(&self) -> bool {
        self.god
    }

    pub fn purchase_id(&self) -> Option<&str> {
        self.purchase_id.as_deref()
    }

    pub fn created(&self) -> &str {
        &self.created
    }

    /// `@username`, or a placeholder when the profile has none.
    pub fn handle(&self) -> String {
        match &self.username {
            Some(name) => format!("@{name}"),
            None => "@no_username".to_string(),
        }
    }

    /// Transport profile name, first and last.
    pub fn profile_name(&self) -> String {
        match &self.last_name {
            Some(last) if !last.is_empty() => format!("{} {last}", self.first_name),
            _ => self.first_name.clone(),
        }
    }

    /// Name the user gave us, falling back to the profile name.
    pub fn display_name(&self) -> String {
        self.real_name.clone().unwrap_or_else(|| self.profile_name())
    }

    /// Refresh the transport profile fields only.
    pub fn refresh_profile(&mut self, sender: &Sender) {
        self.first_name = sender.first_name.clone();
        self.last_name = sender.last_name.clone();
        self.username = sender.username.clone();
        self.dirty.mark("first_name");
        self.dirty.mark("last_name");
        self.dirty.mark("username");
    }

    /// Start the registration over: new profile, no collected data, WELCOME.
    ///
    /// Must not be used on a user who owns a purchase.
    pub fn reset(&mut self, sender: &Sender) {
        self.refresh_profile(sender);
        self.real_name = None;
        self.vk = None;
        self.status = UserStatus::Welcome;
        self.dirty.mark("real_name");
        self.dirty.mark("vk");
        self.dirty.mark("status");
    }

    pub fn set_real_name(&mut self, name: &str) {
        self.real_name = Some(name.trim().to_string());
        self.dirty.mark("real_name");
    }

    pub fn set_vk(&mut self, link: String) {
        self.vk = Some(link);
        self.dirty.mark("vk");
    }

    /// WELCOME becomes APPROVED; any other status is left alone.
    pub fn approve(&mut self) -> bool {
        if self.status != UserStatus::Welcome {
            return false;
        }
        self.status = UserStatus::Approved;
        self.dirty.mark("status");
        true
    }

    /// Link an owned purchase. Persist with a conditional save guarded on `purchase_id`.
    pub fn link_purchase(&mut self, purchase_id: &str) {
        self.purchase_id = Some(purchase_id.to_string());
        self.status = UserStatus::Ready;
        self.dirty.mark("purchase_id");
        self.dirty.mark("status");
    }
}
