//! Database layer (Firestore + in-memory).

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreStore;
pub use memory::MemoryStore;

use crate::error::Result;
use crate::models::{NotificationFeedItem, UserRecord};

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    /// Per-user notification feed (composite doc ids `<uid>_<item_id>`)
    pub const NOTIFICATION_FEED: &str = "notification_feed";
}

/// Callback invoked with the current user record whenever it changes.
/// `None` means the document was deleted.
pub type UserWatchCallback = Box<dyn Fn(Option<UserRecord>) + Send + Sync>;

/// Handle to a live document subscription. Dropping the handle cancels the
/// subscription, so replacing a stored handle is cancel-before-replace.
pub struct WatchHandle {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl WatchHandle {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Explicitly cancel the subscription.
    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for WatchHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchHandle")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// Narrow document-store contract the core depends on: the per-user record
/// (with its `email_verified` mirror) and the per-user notification feed.
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get_user(&self, uid: &str) -> Result<Option<UserRecord>>;

    async fn upsert_user(&self, user: &UserRecord) -> Result<()>;

    /// Idempotent merge write of the `email_verified` mirror flag. Creates a
    /// minimal record when none exists yet.
    async fn set_email_verified(&self, uid: &str, verified: bool) -> Result<()>;

    /// Live subscription on a user record. The callback fires with the
    /// current state on registration and again on every change.
    fn watch_user(&self, uid: &str, callback: UserWatchCallback) -> WatchHandle;

    /// Insert or replace a feed item (keyed by item id).
    async fn add_feed_item(&self, uid: &str, item: &NotificationFeedItem) -> Result<()>;

    /// All feed items for a user, ordered by event time descending.
    async fn feed_for_user(&self, uid: &str) -> Result<Vec<NotificationFeedItem>>;

    async fn set_feed_item_read(&self, uid: &str, item_id: &str, read: bool) -> Result<()>;

    async fn delete_feed_item(&self, uid: &str, item_id: &str) -> Result<()>;

    /// Delete all feed items for a user. Returns the number deleted.
    async fn clear_feed(&self, uid: &str) -> Result<usize>;

    /// Delete ALL data for a user (account deletion). Returns the number of
    /// documents deleted.
    async fn delete_user_data(&self, uid: &str) -> Result<usize>;
}
