// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting and calendar conversion.

use chrono::{DateTime, Datelike, Local, SecondsFormat, Timelike, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Calendar components in the device's local timezone, the form platform
/// notification schedulers take when a reminder is anchored to wall-clock
/// time rather than an absolute instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarComponents {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
}

/// Convert an absolute instant into local calendar components.
///
/// A reminder registered via these components will shift with timezone or
/// DST changes between scheduling and firing.
pub fn local_calendar_components(fire_at: DateTime<Utc>) -> CalendarComponents {
    let local = fire_at.with_timezone(&Local);
    CalendarComponents {
        year: local.year(),
        month: local.month(),
        day: local.day(),
        hour: local.hour(),
        minute: local.minute(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn rfc3339_uses_z_suffix() {
        let date = Utc.with_ymd_and_hms(2025, 6, 1, 9, 30, 0).unwrap();
        assert_eq!(format_utc_rfc3339(date), "2025-06-01T09:30:00Z");
    }

    #[test]
    fn calendar_components_drop_seconds() {
        let date = Utc.with_ymd_and_hms(2025, 6, 1, 9, 30, 45).unwrap();
        let components = local_calendar_components(date);
        // Field values depend on the host timezone; the conversion itself
        // must round-trip through chrono::Local without panicking.
        assert!(components.month >= 1 && components.month <= 12);
        assert!(components.hour < 24);
        assert!(components.minute < 60);
    }
}
