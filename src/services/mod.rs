// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Core services and collaborator contracts.

pub mod feed;
pub mod identity;
pub mod reachability;
pub mod reminders;
pub mod scheduler;
pub mod session;
pub mod settings;

pub use feed::{FeedService, FeedSink};
pub use identity::{Credentials, IdentityProvider, Principal, Registration};
pub use reachability::ReachabilityMonitor;
pub use reminders::{ReminderService, ScheduleOutcome};
pub use scheduler::{DeliveredNotification, InProcessScheduler, NotificationScheduler};
pub use session::{SessionService, SessionSnapshot};
pub use settings::{JsonFileSettings, LocalSettings, MemorySettings};
