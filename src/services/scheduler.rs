// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Local-notification scheduler contract and an in-process implementation.
//!
//! The platform's notification service is injected behind
//! [`NotificationScheduler`]. [`InProcessScheduler`] backs the contract with
//! tokio timers and a delivery channel, for hosts without a platform bridge
//! and for deterministic tests.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::mpsc;

use crate::error::{AppError, Result};
use crate::models::ReminderRequest;

/// A reminder that fired, as reported by the platform.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveredNotification {
    pub id: String,
    pub title: String,
    pub body: String,
    pub delivered_at: DateTime<Utc>,
}

/// Narrow platform scheduler contract. Registering an existing id replaces
/// it (at most one pending reminder per id); cancelling an absent id is a
/// no-op.
#[async_trait::async_trait]
pub trait NotificationScheduler: Send + Sync {
    async fn schedule(&self, request: &ReminderRequest) -> Result<()>;

    async fn cancel(&self, id: &str) -> Result<()>;

    /// Ids of currently pending reminders.
    async fn pending(&self) -> Vec<String>;
}

struct PendingEntry {
    generation: u64,
    task: tokio::task::JoinHandle<()>,
}

/// Timer-backed scheduler delivering through an mpsc channel.
pub struct InProcessScheduler {
    pending: Arc<DashMap<String, PendingEntry>>,
    deliveries: mpsc::UnboundedSender<DeliveredNotification>,
    generation: AtomicU64,
}

impl InProcessScheduler {
    /// Returns the scheduler and the receiving end of its delivery channel.
    /// Route the receiver into `ReminderService::spawn_delivery_pump` so
    /// firings reach the notification feed.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<DeliveredNotification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                pending: Arc::new(DashMap::new()),
                deliveries: tx,
                generation: AtomicU64::new(1),
            },
            rx,
        )
    }
}

#[async_trait::async_trait]
impl NotificationScheduler for InProcessScheduler {
    async fn schedule(&self, request: &ReminderRequest) -> Result<()> {
        let now = Utc::now();
        if request.fire_at <= now {
            return Err(AppError::Scheduling(format!(
                "fire time {} is not in the future",
                request.fire_at
            )));
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst);
        let delay = (request.fire_at - now)
            .to_std()
            .unwrap_or(std::time::Duration::ZERO);

        let pending = Arc::clone(&self.pending);
        let deliveries = self.deliveries.clone();
        let delivered = DeliveredNotification {
            id: request.id.clone(),
            title: request.title.clone(),
            body: request.body.clone(),
            delivered_at: request.fire_at,
        };
        let id = request.id.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Only clear our own registration; a replacement generation owns
            // the entry now.
            pending.remove_if(&id, |_, entry| entry.generation == generation);
            if deliveries.send(delivered).is_err() {
                tracing::debug!(reminder_id = %id, "Delivery channel closed, dropping notification");
            }
        });

        if let Some(previous) = self.pending.insert(
            request.id.clone(),
            PendingEntry { generation, task },
        ) {
            previous.task.abort();
            tracing::debug!(reminder_id = %request.id, "Replaced pending reminder");
        }

        tracing::debug!(
            reminder_id = %request.id,
            fire_at = %request.fire_at,
            "Reminder registered"
        );
        Ok(())
    }

    async fn cancel(&self, id: &str) -> Result<()> {
        if let Some((_, entry)) = self.pending.remove(id) {
            entry.task.abort();
            tracing::debug!(reminder_id = %id, "Reminder cancelled");
        }
        Ok(())
    }

    async fn pending(&self) -> Vec<String> {
        self.pending.iter().map(|e| e.key().clone()).collect()
    }
}
