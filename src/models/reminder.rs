// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Reminder requests and the deterministic id scheme.
//!
//! Identifiers are pure functions of the owning entity, so re-scheduling the
//! same trip or location replaces the pending reminder instead of adding a
//! duplicate, and deleting the entity knows exactly which ids to cancel.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A concrete notification to register with the platform scheduler.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReminderRequest {
    /// Stable id, derived from the owning trip or location
    pub id: String,
    /// Absolute fire time; must be in the future at scheduling time
    pub fire_at: DateTime<Utc>,
    pub title: String,
    pub body: String,
}

/// The fixed reminder milestones derived from a trip's start date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TripMilestone {
    DayBefore,
    HourBefore,
    AtStart,
}

impl TripMilestone {
    pub const ALL: [TripMilestone; 3] = [
        TripMilestone::DayBefore,
        TripMilestone::HourBefore,
        TripMilestone::AtStart,
    ];

    /// How long before the trip start this milestone fires.
    pub fn offset(self) -> Duration {
        match self {
            TripMilestone::DayBefore => Duration::hours(24),
            TripMilestone::HourBefore => Duration::hours(1),
            TripMilestone::AtStart => Duration::zero(),
        }
    }

    /// Stable key used in reminder ids.
    pub fn key(self) -> &'static str {
        match self {
            TripMilestone::DayBefore => "t24h",
            TripMilestone::HourBefore => "t1h",
            TripMilestone::AtStart => "t0",
        }
    }

    /// Notification body phrase for this milestone.
    pub fn phrase(self) -> &'static str {
        match self {
            TripMilestone::DayBefore => "starts tomorrow",
            TripMilestone::HourBefore => "starts in an hour",
            TripMilestone::AtStart => "is starting now",
        }
    }
}

/// Reminder id for a trip milestone: `trip-<tripId>-<milestone>`.
pub fn trip_reminder_id(trip_id: &str, milestone: TripMilestone) -> String {
    format!("trip-{}-{}", trip_id, milestone.key())
}

/// Reminder id for a location: `location-<locationId>-start`.
pub fn location_reminder_id(location_id: &str) -> String {
    format!("location-{}-start", location_id)
}
