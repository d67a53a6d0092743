//! Application configuration loaded from environment variables.
//!
//! The two reminder policies are deliberate configuration choices rather
//! than hard-coded behavior: whether the feed records scheduling events in
//! addition to deliveries, and whether fire times are anchored to an
//! absolute instant or to local wall-clock time.

use std::env;
use std::str::FromStr;

/// Which reminder events append a notification-feed entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedEventPolicy {
    /// Both a "scheduled" entry (at registration) and a "delivered" entry
    /// (when the reminder fires).
    ScheduledAndDelivered,
    /// Only the "delivered" entry.
    DeliveredOnly,
}

impl FromStr for FeedEventPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "scheduled_and_delivered" => Ok(FeedEventPolicy::ScheduledAndDelivered),
            "delivered_only" => Ok(FeedEventPolicy::DeliveredOnly),
            other => Err(ConfigError::Invalid("FEED_EVENT_POLICY", other.to_string())),
        }
    }
}

/// How a reminder's fire time is interpreted by the platform scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderAnchor {
    /// Fire at the absolute instant, regardless of timezone changes.
    AbsoluteInstant,
    /// Fire at the local wall-clock time captured at scheduling; shifts with
    /// timezone and DST changes.
    LocalWallClock,
}

impl FromStr for ReminderAnchor {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "absolute_instant" => Ok(ReminderAnchor::AbsoluteInstant),
            "local_wall_clock" => Ok(ReminderAnchor::LocalWallClock),
            other => Err(ConfigError::Invalid("REMINDER_ANCHOR", other.to_string())),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// GCP project ID for the Firestore backend
    pub gcp_project_id: String,
    /// Path of the durable local settings file
    pub settings_path: String,
    /// Feed entries per reminder lifecycle event
    pub feed_event_policy: FeedEventPolicy,
    /// Fire-time anchoring policy
    pub reminder_anchor: ReminderAnchor,
    /// Poll interval for document watch subscriptions, in seconds
    pub watch_poll_seconds: u64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let feed_event_policy = match env::var("FEED_EVENT_POLICY") {
            Ok(raw) => raw.parse()?,
            Err(_) => FeedEventPolicy::ScheduledAndDelivered,
        };
        let reminder_anchor = match env::var("REMINDER_ANCHOR") {
            Ok(raw) => raw.parse()?,
            Err(_) => ReminderAnchor::AbsoluteInstant,
        };

        Ok(Self {
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            settings_path: env::var("SETTINGS_PATH")
                .unwrap_or_else(|_| "wayfare_settings.json".to_string()),
            feed_event_policy,
            reminder_anchor,
            watch_poll_seconds: env::var("WATCH_POLL_SECONDS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .unwrap_or(5),
        })
    }

    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            gcp_project_id: "test-project".to_string(),
            settings_path: "wayfare_settings_test.json".to_string(),
            feed_event_policy: FeedEventPolicy::ScheduledAndDelivered,
            reminder_anchor: ReminderAnchor::AbsoluteInstant,
            watch_poll_seconds: 5,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
