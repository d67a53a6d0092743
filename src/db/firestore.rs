// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (profile + email-verified mirror)
//! - Notification feed (per-user, ordered by event time)

use crate::db::{collections, UserWatchCallback, WatchHandle};
use crate::error::AppError;
use crate::models::{NotificationFeedItem, UserRecord};
use crate::time_utils::format_utc_rfc3339;
use futures_util::{stream, StreamExt};

const MAX_CONCURRENT_DB_OPS: usize = 50;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreStore {
    client: Option<firestore::FirestoreDb>,
    watch_poll: std::time::Duration,
}

impl FirestoreStore {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str, watch_poll_seconds: u64) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id, watch_poll_seconds).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
            watch_poll: std::time::Duration::from_secs(watch_poll_seconds),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(
        project_id: &str,
        watch_poll_seconds: u64,
    ) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        // Use ExternalJwtFunctionSource to provide a dummy token without needing async-trait
        // or a custom TokenSource implementation struct.
        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
            watch_poll: std::time::Duration::from_secs(watch_poll_seconds),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self {
            client: None,
            watch_poll: std::time::Duration::from_secs(5),
        }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    /// Composite doc id for a feed item: `<uid>_<item_id>`.
    fn feed_doc_id(uid: &str, item_id: &str) -> String {
        format!("{}_{}", uid, urlencoding::encode(item_id))
    }

    // ─── User Operations ─────────────────────────────────────────

    pub async fn get_user(&self, uid: &str) -> Result<Option<UserRecord>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(uid)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn upsert_user(&self, user: &UserRecord) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.uid)
            .object(user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Merge the verified flag into the user record, creating a minimal
    /// record if none exists. Read-modify-write keeps the operation within
    /// the narrow typed contract; the flag only ever moves false → true, so
    /// a lost race converges on the next tick.
    pub async fn set_email_verified(&self, uid: &str, verified: bool) -> Result<(), AppError> {
        let mut record = self.get_user(uid).await?.unwrap_or_else(|| UserRecord {
            uid: uid.to_string(),
            email: None,
            display_name: None,
            email_verified: false,
            created_at: format_utc_rfc3339(chrono::Utc::now()),
        });
        record.email_verified = verified;
        self.upsert_user(&record).await
    }

    /// Poll-based live subscription on a user record.
    ///
    /// Fires the callback with the current state on the first successful
    /// read and again whenever the record changes. Cancelled by dropping the
    /// returned handle.
    pub fn watch_user(&self, uid: &str, callback: UserWatchCallback) -> WatchHandle {
        let store = self.clone();
        let uid = uid.to_string();
        let poll = self.watch_poll;

        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(poll);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            let mut last_seen: Option<Option<UserRecord>> = None;

            loop {
                interval.tick().await;
                match store.get_user(&uid).await {
                    Ok(current) => {
                        if last_seen.as_ref() != Some(&current) {
                            callback(current.clone());
                            last_seen = Some(current);
                        }
                    }
                    Err(err) => {
                        tracing::warn!(uid = %uid, error = %err, "User watch poll failed");
                    }
                }
            }
        });

        WatchHandle::new(move || task.abort())
    }

    // ─── Notification Feed Operations ────────────────────────────

    pub async fn add_feed_item(
        &self,
        uid: &str,
        item: &NotificationFeedItem,
    ) -> Result<(), AppError> {
        let doc = StoredFeedItem::new(uid, item);
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::NOTIFICATION_FEED)
            .document_id(Self::feed_doc_id(uid, &item.id))
            .object(&doc)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    pub async fn feed_for_user(&self, uid: &str) -> Result<Vec<NotificationFeedItem>, AppError> {
        let uid_owned = uid.to_string();
        let docs: Vec<StoredFeedItem> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::NOTIFICATION_FEED)
            .filter(move |q| q.for_all([q.field("uid").eq(uid_owned.clone())]))
            .order_by([(
                "fired_or_scheduled_at",
                firestore::FirestoreQueryDirection::Descending,
            )])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(docs.into_iter().map(StoredFeedItem::into_item).collect())
    }

    pub async fn set_feed_item_read(
        &self,
        uid: &str,
        item_id: &str,
        read: bool,
    ) -> Result<(), AppError> {
        let doc_id = Self::feed_doc_id(uid, item_id);
        let existing: Option<StoredFeedItem> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::NOTIFICATION_FEED)
            .obj()
            .one(&doc_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let Some(mut doc) = existing else {
            return Ok(());
        };
        doc.is_read = read;

        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::NOTIFICATION_FEED)
            .document_id(&doc_id)
            .object(&doc)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    pub async fn delete_feed_item(&self, uid: &str, item_id: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::NOTIFICATION_FEED)
            .document_id(Self::feed_doc_id(uid, item_id))
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Uses concurrent deletes with a limit to avoid overloading Firestore.
    pub async fn clear_feed(&self, uid: &str) -> Result<usize, AppError> {
        let items = self.feed_for_user(uid).await?;
        let count = items.len();

        stream::iter(items)
            .map(|item| async move { self.delete_feed_item(uid, &item.id).await })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<(), AppError>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<()>, AppError>>()?;

        tracing::debug!(uid, count, "Cleared notification feed");
        Ok(count)
    }

    // ─── User Data Deletion ──────────────────────────────────────

    /// Delete ALL data for a user (account deletion).
    ///
    /// Deletes the notification feed and the user profile document.
    /// Returns the number of documents deleted.
    pub async fn delete_user_data(&self, uid: &str) -> Result<usize, AppError> {
        let mut deleted_count = self.clear_feed(uid).await?;

        self.get_client()?
            .fluent()
            .delete()
            .from(collections::USERS)
            .document_id(uid)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        deleted_count += 1;

        tracing::info!(uid, deleted_count, "User data deletion complete");

        Ok(deleted_count)
    }
}

#[async_trait::async_trait]
impl crate::db::DocumentStore for FirestoreStore {
    async fn get_user(&self, uid: &str) -> crate::error::Result<Option<UserRecord>> {
        FirestoreStore::get_user(self, uid).await
    }

    async fn upsert_user(&self, user: &UserRecord) -> crate::error::Result<()> {
        FirestoreStore::upsert_user(self, user).await
    }

    async fn set_email_verified(&self, uid: &str, verified: bool) -> crate::error::Result<()> {
        FirestoreStore::set_email_verified(self, uid, verified).await
    }

    fn watch_user(&self, uid: &str, callback: UserWatchCallback) -> WatchHandle {
        FirestoreStore::watch_user(self, uid, callback)
    }

    async fn add_feed_item(
        &self,
        uid: &str,
        item: &NotificationFeedItem,
    ) -> crate::error::Result<()> {
        FirestoreStore::add_feed_item(self, uid, item).await
    }

    async fn feed_for_user(&self, uid: &str) -> crate::error::Result<Vec<NotificationFeedItem>> {
        FirestoreStore::feed_for_user(self, uid).await
    }

    async fn set_feed_item_read(
        &self,
        uid: &str,
        item_id: &str,
        read: bool,
    ) -> crate::error::Result<()> {
        FirestoreStore::set_feed_item_read(self, uid, item_id, read).await
    }

    async fn delete_feed_item(&self, uid: &str, item_id: &str) -> crate::error::Result<()> {
        FirestoreStore::delete_feed_item(self, uid, item_id).await
    }

    async fn clear_feed(&self, uid: &str) -> crate::error::Result<usize> {
        FirestoreStore::clear_feed(self, uid).await
    }

    async fn delete_user_data(&self, uid: &str) -> crate::error::Result<usize> {
        FirestoreStore::delete_user_data(self, uid).await
    }
}

/// Feed item document with its owning uid, the field the per-user query
/// filters on.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct StoredFeedItem {
    uid: String,
    id: String,
    title: String,
    message: String,
    fired_or_scheduled_at: chrono::DateTime<chrono::Utc>,
    #[serde(default)]
    is_read: bool,
}

impl StoredFeedItem {
    fn new(uid: &str, item: &NotificationFeedItem) -> Self {
        Self {
            uid: uid.to_string(),
            id: item.id.clone(),
            title: item.title.clone(),
            message: item.message.clone(),
            fired_or_scheduled_at: item.fired_or_scheduled_at,
            is_read: item.is_read,
        }
    }

    fn into_item(self) -> NotificationFeedItem {
        NotificationFeedItem {
            id: self.id,
            title: self.title,
            message: self.message,
            fired_or_scheduled_at: self.fired_or_scheduled_at,
            is_read: self.is_read,
        }
    }
}
