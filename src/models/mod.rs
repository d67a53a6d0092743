// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod feed;
pub mod reminder;
pub mod trip;
pub mod user;

pub use feed::NotificationFeedItem;
pub use reminder::{location_reminder_id, trip_reminder_id, ReminderRequest, TripMilestone};
pub use trip::{Location, LocationDraft, Trip, TripDraft};
pub use user::UserRecord;

/// Flatten a validator error set into the first human-readable message.
pub(crate) fn first_validation_message(errors: &validator::ValidationErrors) -> String {
    for (field, kinds) in errors.errors() {
        if let validator::ValidationErrorsKind::Field(field_errors) = kinds {
            if let Some(err) = field_errors.first() {
                return match &err.message {
                    Some(msg) => format!("{}: {}", field, msg),
                    None => format!("{}: {}", field, err.code),
                };
            }
        }
    }
    "invalid input".to_string()
}
