// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Reminder scheduling: derive fire times from itinerary entries, keep the
//! platform's pending set consistent with current itinerary state, and
//! reflect schedulings/firings into the notification feed.
//!
//! Itinerary persistence and reminder scheduling are decoupled: scheduling
//! runs best-effort after a successful save, and a registration failure
//! never blocks the save (the user re-triggers by re-saving).

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::mpsc;

use crate::config::FeedEventPolicy;
use crate::models::{
    location_reminder_id, trip_reminder_id, Location, NotificationFeedItem, ReminderRequest, Trip,
    TripMilestone,
};
use crate::services::feed::FeedSink;
use crate::services::scheduler::{DeliveredNotification, NotificationScheduler};

/// Result of scheduling a batch of reminders.
///
/// Registration failures are per-reminder; callers use the counts to report
/// partial failures without rolling back the itinerary save.
#[derive(Debug, Clone, Default)]
pub struct ScheduleOutcome {
    /// Number of reminders successfully registered.
    pub scheduled: u32,
    /// Number of reminders that failed to register.
    pub failed: u32,
    /// Reminder ids that failed to register.
    pub failed_ids: Vec<String>,
}

impl ScheduleOutcome {
    pub fn is_complete_success(&self) -> bool {
        self.failed == 0
    }
}

/// Derives and registers reminders, and routes lifecycle events to the feed.
pub struct ReminderService {
    scheduler: Arc<dyn NotificationScheduler>,
    sink: Arc<dyn FeedSink>,
    feed_event_policy: FeedEventPolicy,
}

impl ReminderService {
    pub fn new(
        scheduler: Arc<dyn NotificationScheduler>,
        sink: Arc<dyn FeedSink>,
        feed_event_policy: FeedEventPolicy,
    ) -> Arc<Self> {
        Arc::new(Self {
            scheduler,
            sink,
            feed_event_policy,
        })
    }

    // ─── Pure Computation ────────────────────────────────────────

    /// Milestone reminders for a trip: T-24h, T-1h, and T-0 relative to the
    /// start date, each included only if its fire time is strictly in the
    /// future at `now`.
    pub fn compute_trip_milestones(trip: &Trip, now: DateTime<Utc>) -> Vec<ReminderRequest> {
        TripMilestone::ALL
            .iter()
            .filter_map(|&milestone| {
                let fire_at = trip.start_date - milestone.offset();
                if fire_at <= now {
                    return None;
                }
                Some(ReminderRequest {
                    id: trip_reminder_id(&trip.id, milestone),
                    fire_at,
                    title: trip.name.clone(),
                    body: format!("{} {}.", trip.name, milestone.phrase()),
                })
            })
            .collect()
    }

    /// Reminder for a location with an opt-in offset.
    ///
    /// `reminder_offset_secs` is seconds before the start date; `Some(0)`
    /// means at start time, `None` means no reminder. A fire time already in
    /// the past yields no reminder.
    pub fn compute_location_reminder(
        location: &Location,
        trip_name: &str,
        now: DateTime<Utc>,
    ) -> Option<ReminderRequest> {
        let offset_secs = location.reminder_offset_secs?;
        let fire_at = location.start_date - Duration::seconds(offset_secs);
        if fire_at <= now {
            tracing::debug!(
                location_id = %location.id,
                fire_at = %fire_at,
                "Location reminder fire time already passed, skipping"
            );
            return None;
        }
        Some(ReminderRequest {
            id: location_reminder_id(&location.id),
            fire_at,
            title: location.name.clone(),
            body: format!("Coming up on your {} trip.", trip_name),
        })
    }

    // ─── Effectful Operations ────────────────────────────────────

    /// Register one reminder (replace-by-id) and, per the feed policy,
    /// record the scheduling in the feed.
    pub async fn schedule(&self, request: &ReminderRequest) -> crate::error::Result<()> {
        self.scheduler.schedule(request).await?;

        if self.feed_event_policy == FeedEventPolicy::ScheduledAndDelivered {
            self.sink
                .emit(NotificationFeedItem {
                    id: format!("{}-scheduled", request.id),
                    title: request.title.clone(),
                    message: request.body.clone(),
                    fired_or_scheduled_at: request.fire_at,
                    is_read: false,
                })
                .await;
        }
        Ok(())
    }

    /// Idempotent cancel by reminder id.
    pub async fn cancel(&self, id: &str) -> crate::error::Result<()> {
        self.scheduler.cancel(id).await
    }

    /// Register all future milestones for a trip. Re-scheduling the same
    /// trip replaces its pending reminders rather than duplicating them.
    pub async fn schedule_trip(&self, trip: &Trip, now: DateTime<Utc>) -> ScheduleOutcome {
        let mut outcome = ScheduleOutcome::default();
        for request in Self::compute_trip_milestones(trip, now) {
            match self.schedule(&request).await {
                Ok(()) => outcome.scheduled += 1,
                Err(err) => {
                    tracing::warn!(
                        reminder_id = %request.id,
                        error = %err,
                        "Failed to register trip reminder"
                    );
                    outcome.failed += 1;
                    outcome.failed_ids.push(request.id);
                }
            }
        }
        tracing::info!(
            trip_id = %trip.id,
            scheduled = outcome.scheduled,
            failed = outcome.failed,
            "Trip reminders reconciled"
        );
        outcome
    }

    /// Cancel every milestone id a trip can own.
    pub async fn cancel_trip(&self, trip_id: &str) -> crate::error::Result<()> {
        for milestone in TripMilestone::ALL {
            self.scheduler
                .cancel(&trip_reminder_id(trip_id, milestone))
                .await?;
        }
        Ok(())
    }

    /// Reconcile a trip change: cancel the old trip's milestones (stale
    /// date-derived fire times included), then register the new state.
    /// `new = None` is a deletion.
    pub async fn reconcile_trip(
        &self,
        old: Option<&Trip>,
        new: Option<&Trip>,
        now: DateTime<Utc>,
    ) -> ScheduleOutcome {
        if let Some(old) = old {
            if let Err(err) = self.cancel_trip(&old.id).await {
                tracing::warn!(trip_id = %old.id, error = %err, "Failed to cancel trip reminders");
            }
        }
        match new {
            Some(trip) => self.schedule_trip(trip, now).await,
            None => ScheduleOutcome::default(),
        }
    }

    /// Reconcile a location change: cancel the old reminder id, then
    /// register the replacement if the new state still opts in.
    /// `new = None` is a deletion.
    pub async fn reconcile_location(
        &self,
        old: Option<&Location>,
        new: Option<&Location>,
        trip_name: &str,
        now: DateTime<Utc>,
    ) -> crate::error::Result<()> {
        if let Some(old) = old {
            self.scheduler
                .cancel(&location_reminder_id(&old.id))
                .await?;
        }
        if let Some(location) = new {
            if let Some(request) = Self::compute_location_reminder(location, trip_name, now) {
                self.schedule(&request).await?;
            }
        }
        Ok(())
    }

    /// Single entry point for reminder firings, foreground or background.
    pub async fn on_delivered(&self, payload: DeliveredNotification) {
        tracing::debug!(reminder_id = %payload.id, "Reminder delivered");
        self.sink
            .emit(NotificationFeedItem {
                id: format!("{}-delivered", payload.id),
                title: payload.title,
                message: payload.body,
                fired_or_scheduled_at: payload.delivered_at,
                is_read: false,
            })
            .await;
    }

    /// Drain a scheduler's delivery channel into `on_delivered`.
    pub fn spawn_delivery_pump(
        self: &Arc<Self>,
        mut deliveries: mpsc::UnboundedReceiver<DeliveredNotification>,
    ) -> tokio::task::JoinHandle<()> {
        let service = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(payload) = deliveries.recv().await {
                service.on_delivered(payload).await;
            }
        })
    }
}
