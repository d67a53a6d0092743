// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Notification feed: the persisted, user-visible reminder history.
//!
//! The in-memory list is the UI's read model, always sorted newest-first and
//! published through a watch channel. Persistence to the document store is
//! best-effort: a failed write is logged and the in-memory copy stands until
//! the next refresh.

use std::sync::{Arc, Mutex};

use tokio::sync::watch;

use crate::db::DocumentStore;
use crate::error::Result;
use crate::models::feed::sort_feed_desc;
use crate::models::NotificationFeedItem;

/// Sink the reminder scheduler emits scheduled/delivered events into.
#[async_trait::async_trait]
pub trait FeedSink: Send + Sync {
    async fn emit(&self, item: NotificationFeedItem);
}

#[derive(Default)]
struct FeedInner {
    uid: Option<String>,
    items: Vec<NotificationFeedItem>,
}

/// Per-user notification feed, mirrored in memory and persisted per item.
pub struct FeedService {
    store: Arc<dyn DocumentStore>,
    inner: Mutex<FeedInner>,
    feed_tx: watch::Sender<Vec<NotificationFeedItem>>,
}

impl FeedService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Arc<Self> {
        let (feed_tx, _) = watch::channel(Vec::new());
        Arc::new(Self {
            store,
            inner: Mutex::new(FeedInner::default()),
            feed_tx,
        })
    }

    /// Observable snapshot of the feed, newest-first.
    pub fn subscribe(&self) -> watch::Receiver<Vec<NotificationFeedItem>> {
        self.feed_tx.subscribe()
    }

    pub fn items(&self) -> Vec<NotificationFeedItem> {
        self.inner.lock().unwrap().items.clone()
    }

    pub fn unread_count(&self) -> usize {
        self.inner
            .lock()
            .unwrap()
            .items
            .iter()
            .filter(|item| !item.is_read)
            .count()
    }

    fn publish_locked(&self, inner: &FeedInner) {
        self.feed_tx.send_replace(inner.items.clone());
    }

    /// Switch the feed to a signed-in user and load their persisted items.
    pub async fn set_active_user(&self, uid: &str) -> Result<()> {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.uid = Some(uid.to_string());
            inner.items.clear();
            self.publish_locked(&inner);
        }
        self.refresh().await
    }

    /// Re-fetch the active user's feed from the document store.
    pub async fn refresh(&self) -> Result<()> {
        let Some(uid) = self.inner.lock().unwrap().uid.clone() else {
            return Ok(());
        };

        let mut items = self.store.feed_for_user(&uid).await.inspect_err(|err| {
            tracing::warn!(uid = %uid, error = %err, "Feed refresh failed");
        })?;
        sort_feed_desc(&mut items);

        let mut inner = self.inner.lock().unwrap();
        // A sign-out can race the fetch; only apply to the same user.
        if inner.uid.as_deref() == Some(uid.as_str()) {
            inner.items = items;
            self.publish_locked(&inner);
        }
        Ok(())
    }

    /// Drop in-memory state on sign-out. Backend copies persist.
    pub fn reset(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.uid = None;
        inner.items.clear();
        self.publish_locked(&inner);
    }

    pub async fn mark_read(&self, item_id: &str) -> Result<()> {
        let uid = {
            let mut inner = self.inner.lock().unwrap();
            for item in inner.items.iter_mut() {
                if item.id == item_id {
                    item.is_read = true;
                }
            }
            self.publish_locked(&inner);
            inner.uid.clone()
        };

        if let Some(uid) = uid {
            self.store.set_feed_item_read(&uid, item_id, true).await?;
        }
        Ok(())
    }

    pub async fn delete_item(&self, item_id: &str) -> Result<()> {
        let uid = {
            let mut inner = self.inner.lock().unwrap();
            inner.items.retain(|item| item.id != item_id);
            self.publish_locked(&inner);
            inner.uid.clone()
        };

        if let Some(uid) = uid {
            self.store.delete_feed_item(&uid, item_id).await?;
        }
        Ok(())
    }

    /// Bulk clear. Returns the number of persisted items deleted.
    pub async fn clear(&self) -> Result<usize> {
        let uid = {
            let mut inner = self.inner.lock().unwrap();
            inner.items.clear();
            self.publish_locked(&inner);
            inner.uid.clone()
        };

        match uid {
            Some(uid) => self.store.clear_feed(&uid).await,
            None => Ok(0),
        }
    }
}

#[async_trait::async_trait]
impl FeedSink for FeedService {
    async fn emit(&self, item: NotificationFeedItem) {
        let uid = {
            let mut inner = self.inner.lock().unwrap();
            let Some(uid) = inner.uid.clone() else {
                tracing::debug!(item_id = %item.id, "No active user, dropping feed item");
                return;
            };
            inner.items.retain(|existing| existing.id != item.id);
            inner.items.push(item.clone());
            sort_feed_desc(&mut inner.items);
            self.publish_locked(&inner);
            uid
        };

        if let Err(err) = self.store.add_feed_item(&uid, &item).await {
            tracing::warn!(
                uid = %uid,
                item_id = %item.id,
                error = %err,
                "Failed to persist feed item"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use chrono::{TimeZone, Utc};

    fn item(id: &str, hour: u32) -> NotificationFeedItem {
        NotificationFeedItem {
            id: id.to_string(),
            title: "Trip".to_string(),
            message: "starts soon".to_string(),
            fired_or_scheduled_at: Utc.with_ymd_and_hms(2025, 7, 1, hour, 0, 0).unwrap(),
            is_read: false,
        }
    }

    #[tokio::test]
    async fn emit_without_active_user_is_dropped() {
        let store = MemoryStore::new();
        let feed = FeedService::new(Arc::new(store.clone()));

        feed.emit(item("n1", 9)).await;

        assert!(feed.items().is_empty());
        assert!(store.feed_for_user("u1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn emit_persists_and_orders_desc() {
        let store = MemoryStore::new();
        let feed = FeedService::new(Arc::new(store.clone()));
        feed.set_active_user("u1").await.unwrap();

        feed.emit(item("early", 8)).await;
        feed.emit(item("late", 12)).await;
        feed.emit(item("mid", 10)).await;

        let ids: Vec<String> = feed.items().into_iter().map(|i| i.id).collect();
        assert_eq!(ids, vec!["late", "mid", "early"]);
        assert_eq!(store.feed_for_user("u1").await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn emit_replaces_same_id() {
        let store = MemoryStore::new();
        let feed = FeedService::new(Arc::new(store));
        feed.set_active_user("u1").await.unwrap();

        feed.emit(item("n1", 9)).await;
        feed.emit(item("n1", 11)).await;

        let items = feed.items();
        assert_eq!(items.len(), 1);
        assert_eq!(
            items[0].fired_or_scheduled_at,
            Utc.with_ymd_and_hms(2025, 7, 1, 11, 0, 0).unwrap()
        );
    }

    #[tokio::test]
    async fn persist_failure_keeps_in_memory_item() {
        let store = MemoryStore::new();
        let feed = FeedService::new(Arc::new(store.clone()));
        feed.set_active_user("u1").await.unwrap();

        store.set_fail_writes(true);
        feed.emit(item("n1", 9)).await;

        assert_eq!(feed.items().len(), 1);
        assert!(store.feed_for_user("u1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn reset_clears_memory_but_not_backend() {
        let store = MemoryStore::new();
        let feed = FeedService::new(Arc::new(store.clone()));
        feed.set_active_user("u1").await.unwrap();
        feed.emit(item("n1", 9)).await;

        feed.reset();

        assert!(feed.items().is_empty());
        assert_eq!(store.feed_for_user("u1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn refresh_restores_persisted_items() {
        let store = MemoryStore::new();
        let feed = FeedService::new(Arc::new(store.clone()));
        feed.set_active_user("u1").await.unwrap();
        feed.emit(item("n1", 9)).await;
        feed.reset();

        feed.set_active_user("u1").await.unwrap();
        assert_eq!(feed.items().len(), 1);
    }

    #[tokio::test]
    async fn mark_read_and_unread_count() {
        let store = MemoryStore::new();
        let feed = FeedService::new(Arc::new(store.clone()));
        feed.set_active_user("u1").await.unwrap();
        feed.emit(item("n1", 9)).await;
        feed.emit(item("n2", 10)).await;
        assert_eq!(feed.unread_count(), 2);

        feed.mark_read("n1").await.unwrap();
        assert_eq!(feed.unread_count(), 1);

        let persisted = store.feed_for_user("u1").await.unwrap();
        let n1 = persisted.iter().find(|i| i.id == "n1").unwrap();
        assert!(n1.is_read);
    }

    #[tokio::test]
    async fn clear_removes_everything() {
        let store = MemoryStore::new();
        let feed = FeedService::new(Arc::new(store.clone()));
        feed.set_active_user("u1").await.unwrap();
        feed.emit(item("n1", 9)).await;
        feed.emit(item("n2", 10)).await;

        let deleted = feed.clear().await.unwrap();

        assert_eq!(deleted, 2);
        assert!(feed.items().is_empty());
        assert!(store.feed_for_user("u1").await.unwrap().is_empty());
    }
}
