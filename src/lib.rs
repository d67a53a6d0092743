// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Wayfare core: session gating and reminder scheduling for a travel
//! itinerary client.
//!
//! This crate is the in-process core consumed by a host UI. It owns two
//! things: the session/verification gate (reconciling identity-provider
//! sign-in state with the remotely stored email-verified flag) and the
//! reminder pipeline (deriving fire times from trips and locations, keeping
//! the platform's pending notifications consistent with the itinerary, and
//! mirroring schedulings/firings into a persisted notification feed). The
//! identity provider, document store, platform notification scheduler, and
//! durable settings are injected collaborators; all state reaches the UI
//! through read-only watch snapshots.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod telemetry;
pub mod time_utils;

use std::sync::Arc;

use config::Config;
use db::DocumentStore;
use services::{
    FeedService, IdentityProvider, LocalSettings, NotificationScheduler, ReachabilityMonitor,
    ReminderService, SessionService,
};

/// The process-wide core, constructed once at startup with its collaborators
/// and threaded through to the UI layer.
pub struct AppCore {
    pub config: Config,
    pub session: Arc<SessionService>,
    pub feed: Arc<FeedService>,
    pub reminders: Arc<ReminderService>,
    pub reachability: ReachabilityMonitor,
}

impl AppCore {
    pub fn new(
        config: Config,
        store: Arc<dyn DocumentStore>,
        identity: Arc<dyn IdentityProvider>,
        scheduler: Arc<dyn NotificationScheduler>,
        settings: Arc<dyn LocalSettings>,
    ) -> Self {
        let session = SessionService::new(identity, Arc::clone(&store), settings);
        let feed = FeedService::new(store);
        let sink: Arc<dyn services::FeedSink> = feed.clone();
        let reminders = ReminderService::new(scheduler, sink, config.feed_event_policy);

        Self {
            config,
            session,
            feed,
            reminders,
            reachability: ReachabilityMonitor::new(),
        }
    }

    /// Keep the feed's active user in lockstep with the session: load the
    /// persisted feed on sign-in, drop the in-memory mirror on sign-out.
    /// Call once at startup; the task runs for the process lifetime.
    pub fn link_feed_to_session(&self) -> tokio::task::JoinHandle<()> {
        let mut snapshots = self.session.subscribe();
        let feed = Arc::clone(&self.feed);
        tokio::spawn(async move {
            let mut active_uid: Option<String> = None;
            loop {
                let uid = snapshots.borrow_and_update().uid.clone();
                if uid != active_uid {
                    match &uid {
                        Some(uid) => {
                            if let Err(err) = feed.set_active_user(uid).await {
                                tracing::warn!(uid = %uid, error = %err, "Initial feed load failed");
                            }
                        }
                        None => feed.reset(),
                    }
                    active_uid = uid;
                }
                if snapshots.changed().await.is_err() {
                    break;
                }
            }
        })
    }
}
