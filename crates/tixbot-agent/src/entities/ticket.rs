// SPDX-FileCopyrightText: 2026 Tixbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Catalog items. Read-only to the conversation; provisioned by operators.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::store::{DirtyFields, Document};

/// Largest catalog price whose minor-unit amount fits in an `i64`.
pub const MAX_PRICE: i64 = i64::MAX / 100;

/// Whether a catalog item is sold through invoices or only gifted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TicketType {
    Paid,
    Free,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    id: String,
    /// Whole currency units.
    price: i64,
    #[serde(default)]
    description: String,
    #[serde(default)]
    photo: Option<String>,
    #[serde(rename = "type")]
    kind: TicketType,
    #[serde(default)]
    order: i64,
    #[serde(skip)]
    dirty: DirtyFields,
}

impl Document for Ticket {
    const COLLECTION: &'static str = "tickets";
    const READ_ONLY: &'static [&'static str] =
        &["id", "price", "description", "photo", "type", "order"];

    fn key(&self) -> String {
        self.id.clone()
    }

    fn dirty(&self) -> &DirtyFields {
        &self.dirty
    }

    fn dirty_mut(&mut self) -> &mut DirtyFields {
        &mut self.dirty
    }
}

impl Ticket {
    pub fn new(
        id: impl Into<String>,
        price: i64,
        description: impl Into<String>,
        photo: Option<String>,
        kind: TicketType,
        order: i64,
    ) -> Self {
        Self {
            id: id.into(),
            price,
            description: description.into(),
            photo,
            kind,
            order,
            dirty: DirtyFields::default(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn price(&self) -> i64 {
        self.price
    }

    /// Price in minor currency units, as charged. Saturates above [`MAX_PRICE`].
    pub fn price_minor(&self) -> i64 {
        self.price.saturating_mul(100)
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn photo(&self) -> Option<&str> {
        self.photo.as_deref()
    }

    pub fn kind(&self) -> TicketType {
        self.kind
    }

    pub fn order(&self) -> i64 {
        self.order
    }
}
