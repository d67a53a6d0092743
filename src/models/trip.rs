// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Trip and location models.
//!
//! These are the itinerary entries the reminder scheduler derives fire times
//! from. Persistence of trips themselves is a thin backend concern owned by
//! the host application; the core only consumes the saved values.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{AppError, Result};

/// A trip owned by one user and optionally shared with collaborators.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Trip {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub destination: Option<String>,
    /// When the trip starts; milestone reminders are derived from this
    pub start_date: DateTime<Utc>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    pub owner_uid: String,
    /// Uids of collaborators the trip is shared with
    #[serde(default)]
    pub shared_with: Vec<String>,
    #[serde(default)]
    pub created_at: String,
}

/// A location (or flight) attached to a trip.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Location {
    pub id: String,
    pub trip_id: String,
    pub name: String,
    /// When the visit starts
    pub start_date: DateTime<Utc>,
    /// Seconds before `start_date` at which to fire a reminder.
    /// `Some(0)` means at start time; `None` means no reminder.
    #[serde(default)]
    pub reminder_offset_secs: Option<i64>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// User-entered trip fields, validated before any backend call.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TripDraft {
    #[validate(length(min = 2, max = 80, message = "must be 2-80 characters"))]
    pub name: String,
    #[validate(length(max = 120, message = "must be at most 120 characters"))]
    pub destination: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
}

impl TripDraft {
    /// Reject invalid input locally; no partial state mutation occurs.
    pub fn validated(&self) -> Result<()> {
        self.validate()
            .map_err(|e| AppError::Validation(crate::models::first_validation_message(&e)))?;
        if let Some(end) = self.end_date {
            if end < self.start_date {
                return Err(AppError::Validation(
                    "end_date: must not be before start_date".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// User-entered location fields, validated before any backend call.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LocationDraft {
    #[validate(length(min = 1, max = 80, message = "must be 1-80 characters"))]
    pub name: String,
    pub start_date: DateTime<Utc>,
    #[validate(range(min = 0, message = "must not be negative"))]
    pub reminder_offset_secs: Option<i64>,
}

impl LocationDraft {
    pub fn validated(&self) -> Result<()> {
        self.validate()
            .map_err(|e| AppError::Validation(crate::models::first_validation_message(&e)))
    }
}
