// Copyright (c) 2026 Parcelport Contributors
// SPDX-License-Identifier: Apache-2.0

//! Value objects round-tripped through the service. Equality is pure
//! field-wise comparison; server-assigned identifiers are never part of it.

use parcelport_protocol::pb;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub zip: String,
    pub city: String,
    pub country: String,
    pub planet: String,
}

impl From<pb::Address> for Address {
    fn from(a: pb::Address) -> Self {
        Self {
            street: a.street,
            zip: a.zip,
            city: a.city,
            country: a.country,
            planet: a.planet,
        }
    }
}

impl From<&Address> for pb::Address {
    fn from(a: &Address) -> Self {
        Self {
            street: a.street.clone(),
            zip: a.zip.clone(),
            city: a.city.clone(),
            country: a.country.clone(),
            planet: a.planet.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditCard {
    pub number: String,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum InvalidFeedback {
    #[error("feedback rating must be between 1 and 5, got {0}")]
    RatingOutOfRange(u8),
    #[error("feedback text may not be empty")]
    EmptyText,
}

/// A customer feedback entry. Validated at construction so a
/// malformed-but-plausible value can never crash the harness downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    rating: u8,
    text: String,
}

impl Feedback {
    pub fn new(rating: u8, text: impl Into<String>) -> Result<Self, InvalidFeedback> {
        let text = text.into();
        if !(1..=5).contains(&rating) {
            return Err(InvalidFeedback::RatingOutOfRange(rating));
        }
        if text.is_empty() {
            return Err(InvalidFeedback::EmptyText);
        }
        Ok(Self { rating, text })
    }

    /// Minimal valid entry for callers that must produce a feedback value
    /// unconditionally.
    pub fn placeholder() -> Self {
        Self {
            rating: 3,
            text: "acceptable service".to_owned(),
        }
    }

    pub fn rating(&self) -> u8 {
        self.rating
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}
