//! Notification feed items.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A persisted, user-visible record of a reminder having been scheduled or
/// delivered.
///
/// Stored per-user in the `notification_feed` collection and mirrored to an
/// in-memory list ordered by `fired_or_scheduled_at` descending.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotificationFeedItem {
    pub id: String,
    pub title: String,
    pub message: String,
    /// Delivery time for delivered entries, fire time for scheduled entries
    pub fired_or_scheduled_at: DateTime<Utc>,
    #[serde(default)]
    pub is_read: bool,
}

impl NotificationFeedItem {
    /// Relaxed decode for partially written documents.
    ///
    /// Mirrors the strict schema field-by-field: `id` is required; title and
    /// message fall back to empty strings, the timestamp to the Unix epoch,
    /// and `is_read` to false.
    pub fn from_partial(value: &serde_json::Value) -> Option<Self> {
        let id = value.get("id")?.as_str()?.to_string();
        let fired_or_scheduled_at = value
            .get("fired_or_scheduled_at")
            .and_then(|v| v.as_str())
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
        Some(Self {
            id,
            title: value
                .get("title")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
            message: value
                .get("message")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
            fired_or_scheduled_at,
            is_read: value
                .get("is_read")
                .and_then(|v| v.as_bool())
                .unwrap_or(false),
        })
    }
}

/// Sort feed items newest-first, the only order the feed is presented in.
pub fn sort_feed_desc(items: &mut [NotificationFeedItem]) {
    items.sort_by(|a, b| b.fired_or_scheduled_at.cmp(&a.fired_or_scheduled_at));
}
