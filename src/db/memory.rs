// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory document store for tests and offline development.
//!
//! Watch callbacks fan out synchronously on every write, which makes the
//! subscription-driven verification flow deterministic under test.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;

use crate::db::{DocumentStore, UserWatchCallback, WatchHandle};
use crate::error::{AppError, Result};
use crate::models::feed::sort_feed_desc;
use crate::models::{NotificationFeedItem, UserRecord};

struct Watcher {
    uid: String,
    callback: UserWatchCallback,
}

struct Inner {
    users: DashMap<String, UserRecord>,
    feeds: DashMap<String, Vec<NotificationFeedItem>>,
    watchers: DashMap<u64, Watcher>,
    next_watcher_id: AtomicU64,
    fail_writes: AtomicBool,
}

/// In-memory `DocumentStore` implementation.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                users: DashMap::new(),
                feeds: DashMap::new(),
                watchers: DashMap::new(),
                next_watcher_id: AtomicU64::new(1),
                fail_writes: AtomicBool::new(false),
            }),
        }
    }

    /// Make all subsequent writes fail with a transient database error, for
    /// exercising last-known-good semantics.
    pub fn set_fail_writes(&self, fail: bool) {
        self.inner.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<()> {
        if self.inner.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::Database("write unavailable".to_string()));
        }
        Ok(())
    }

    fn notify_watchers(&self, uid: &str, record: Option<UserRecord>) {
        for entry in self.inner.watchers.iter() {
            if entry.value().uid == uid {
                (entry.value().callback)(record.clone());
            }
        }
    }

    /// Number of active user watches, exposed for teardown assertions.
    pub fn watcher_count(&self) -> usize {
        self.inner.watchers.len()
    }
}

#[async_trait::async_trait]
impl DocumentStore for MemoryStore {
    async fn get_user(&self, uid: &str) -> Result<Option<UserRecord>> {
        Ok(self.inner.users.get(uid).map(|r| r.clone()))
    }

    async fn upsert_user(&self, user: &UserRecord) -> Result<()> {
        self.check_writable()?;
        self.inner.users.insert(user.uid.clone(), user.clone());
        self.notify_watchers(&user.uid, Some(user.clone()));
        Ok(())
    }

    async fn set_email_verified(&self, uid: &str, verified: bool) -> Result<()> {
        self.check_writable()?;
        let record = {
            let mut entry = self
                .inner
                .users
                .entry(uid.to_string())
                .or_insert_with(|| UserRecord {
                    uid: uid.to_string(),
                    email: None,
                    display_name: None,
                    email_verified: false,
                    created_at: String::new(),
                });
            entry.email_verified = verified;
            entry.clone()
        };
        self.notify_watchers(uid, Some(record));
        Ok(())
    }

    fn watch_user(&self, uid: &str, callback: UserWatchCallback) -> WatchHandle {
        let current = self.inner.users.get(uid).map(|r| r.clone());
        callback(current);

        let id = self.inner.next_watcher_id.fetch_add(1, Ordering::SeqCst);
        self.inner.watchers.insert(
            id,
            Watcher {
                uid: uid.to_string(),
                callback,
            },
        );

        let inner = Arc::clone(&self.inner);
        WatchHandle::new(move || {
            inner.watchers.remove(&id);
        })
    }

    async fn add_feed_item(&self, uid: &str, item: &NotificationFeedItem) -> Result<()> {
        self.check_writable()?;
        let mut feed = self.inner.feeds.entry(uid.to_string()).or_default();
        feed.retain(|existing| existing.id != item.id);
        feed.push(item.clone());
        Ok(())
    }

    async fn feed_for_user(&self, uid: &str) -> Result<Vec<NotificationFeedItem>> {
        let mut items = self
            .inner
            .feeds
            .get(uid)
            .map(|f| f.clone())
            .unwrap_or_default();
        sort_feed_desc(&mut items);
        Ok(items)
    }

    async fn set_feed_item_read(&self, uid: &str, item_id: &str, read: bool) -> Result<()> {
        self.check_writable()?;
        if let Some(mut feed) = self.inner.feeds.get_mut(uid) {
            for item in feed.iter_mut() {
                if item.id == item_id {
                    item.is_read = read;
                }
            }
        }
        Ok(())
    }

    async fn delete_feed_item(&self, uid: &str, item_id: &str) -> Result<()> {
        self.check_writable()?;
        if let Some(mut feed) = self.inner.feeds.get_mut(uid) {
            feed.retain(|item| item.id != item_id);
        }
        Ok(())
    }

    async fn clear_feed(&self, uid: &str) -> Result<usize> {
        self.check_writable()?;
        let count = self
            .inner
            .feeds
            .remove(uid)
            .map(|(_, feed)| feed.len())
            .unwrap_or(0);
        Ok(count)
    }

    async fn delete_user_data(&self, uid: &str) -> Result<usize> {
        self.check_writable()?;
        let mut deleted = self
            .inner
            .feeds
            .remove(uid)
            .map(|(_, feed)| feed.len())
            .unwrap_or(0);
        if self.inner.users.remove(uid).is_some() {
            deleted += 1;
            self.notify_watchers(uid, None);
        }
        tracing::debug!(uid, deleted, "Deleted user data");
        Ok(deleted)
    }
}
