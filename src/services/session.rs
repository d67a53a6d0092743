// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session and verification state.
//!
//! Single source of truth for "is the user allowed past the gate". Two
//! independently arriving signals — the identity provider's sign-in state
//! and the remotely stored email-verified flag — are reconciled into one
//! derived gate. All reconciliation paths are idempotent and commutative, so
//! the one-shot refresh and the live subscription can race freely; the only
//! ordering the service enforces is cancel-before-replace on the live watch
//! when the principal changes, with an epoch guard discarding any async
//! completion issued under a previous principal.

use std::sync::{Arc, Mutex};

use tokio::sync::watch;

use crate::db::{DocumentStore, WatchHandle};
use crate::error::{AppError, Result};
use crate::models::UserRecord;
use crate::services::identity::{Credentials, IdentityProvider, Principal, Registration};
use crate::services::settings::{keys, LocalSettings};
use crate::time_utils::format_utc_rfc3339;

/// Read-only view of the session, published on every mutation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSnapshot {
    pub uid: Option<String>,
    pub display_name: Option<String>,
    /// The identity provider reports a signed-in principal
    pub identity_confirmed: bool,
    /// The user verified their email or dismissed the prompt
    pub verification_acknowledged: bool,
    /// Remote mirror of the provider's verified flag
    pub email_verified: bool,
    pub biometric_authenticated: bool,
    /// Derived: `identity_confirmed && verification_acknowledged`
    pub is_authenticated: bool,
}

struct SessionInner {
    /// Bumped on every principal change; async completions carrying an older
    /// epoch are discarded.
    epoch: u64,
    uid: Option<String>,
    display_name: Option<String>,
    identity_confirmed: bool,
    verification_acknowledged: bool,
    email_verified: bool,
    biometric_authenticated: bool,
    user_watch: Option<WatchHandle>,
}

impl SessionInner {
    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            uid: self.uid.clone(),
            display_name: self.display_name.clone(),
            identity_confirmed: self.identity_confirmed,
            verification_acknowledged: self.verification_acknowledged,
            email_verified: self.email_verified,
            biometric_authenticated: self.biometric_authenticated,
            is_authenticated: self.identity_confirmed && self.verification_acknowledged,
        }
    }
}

/// Session/verification controller.
pub struct SessionService {
    identity: Arc<dyn IdentityProvider>,
    store: Arc<dyn DocumentStore>,
    settings: Arc<dyn LocalSettings>,
    inner: Mutex<SessionInner>,
    snapshot_tx: watch::Sender<SessionSnapshot>,
}

impl SessionService {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        store: Arc<dyn DocumentStore>,
        settings: Arc<dyn LocalSettings>,
    ) -> Arc<Self> {
        let (snapshot_tx, _) = watch::channel(SessionSnapshot::default());
        Arc::new(Self {
            identity,
            store,
            settings,
            inner: Mutex::new(SessionInner {
                epoch: 0,
                uid: None,
                display_name: None,
                identity_confirmed: false,
                verification_acknowledged: false,
                email_verified: false,
                biometric_authenticated: false,
                user_watch: None,
            }),
            snapshot_tx,
        })
    }

    /// Observable session state for the UI.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot_tx.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot_tx.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.snapshot_tx.borrow().is_authenticated
    }

    fn publish(&self, inner: &SessionInner) {
        self.snapshot_tx.send_replace(inner.snapshot());
    }

    /// Apply the current principal at process start.
    pub async fn bootstrap(self: &Arc<Self>) {
        let principal = self.identity.current_principal().await;
        self.on_identity_state_changed(principal).await;
    }

    /// Entry point for identity-provider state changes. The host wires the
    /// provider's state stream here; `sign_in`/`sign_out` also route through
    /// it so every principal change takes the same path.
    pub async fn on_identity_state_changed(self: &Arc<Self>, principal: Option<Principal>) {
        match principal {
            None => {
                let old_watch = {
                    let mut inner = self.inner.lock().unwrap();
                    inner.epoch += 1;
                    inner.uid = None;
                    inner.display_name = None;
                    inner.identity_confirmed = false;
                    inner.verification_acknowledged = false;
                    inner.email_verified = false;
                    inner.biometric_authenticated = false;
                    let old_watch = inner.user_watch.take();
                    self.publish(&inner);
                    old_watch
                };
                drop(old_watch);
                // Forces the verification prompt on the next sign-in.
                self.settings.set_bool(keys::VERIFICATION_ACKNOWLEDGED, false);
                tracing::info!("Signed out");
            }
            Some(principal) => {
                let (epoch, old_watch) = {
                    let mut inner = self.inner.lock().unwrap();
                    inner.epoch += 1;
                    inner.uid = Some(principal.uid.clone());
                    inner.display_name = principal.best_display_name();
                    inner.identity_confirmed = true;
                    inner.email_verified = principal.email_verified;
                    inner.verification_acknowledged = principal.email_verified
                        || self.settings.get_bool(keys::VERIFICATION_ACKNOWLEDGED);
                    let old_watch = inner.user_watch.take();
                    self.publish(&inner);
                    (inner.epoch, old_watch)
                };
                // Cancel-before-replace: a stale callback must not resurrect
                // a previous principal's verification flag.
                drop(old_watch);
                if principal.email_verified {
                    self.settings.set_bool(keys::VERIFICATION_ACKNOWLEDGED, true);
                }
                tracing::info!(uid = %principal.uid, "Identity confirmed");
                self.refresh_verification_state(&principal.uid, epoch).await;
            }
        }
    }

    /// Re-run verification reconciliation for the signed-in principal
    /// (e.g. after the user reports having clicked the email link). Safe to
    /// call concurrently with itself or with the live subscription.
    pub async fn refresh_verification(self: &Arc<Self>) {
        let (uid, epoch) = {
            let inner = self.inner.lock().unwrap();
            (inner.uid.clone(), inner.epoch)
        };
        if let Some(uid) = uid {
            self.refresh_verification_state(&uid, epoch).await;
        }
    }

    /// Re-fetch the principal's provider state, (re-)establish the live
    /// subscription on their backend record, and reconcile. Both the reload
    /// path and the subscription path converge to the same terminal state
    /// regardless of ordering.
    async fn refresh_verification_state(self: &Arc<Self>, uid: &str, epoch: u64) {
        let weak = Arc::downgrade(self);
        let handle = self.store.watch_user(
            uid,
            Box::new(move |record: Option<UserRecord>| {
                if let Some(service) = weak.upgrade() {
                    if let Some(record) = record {
                        service.apply_remote_verification(record.email_verified, epoch);
                    }
                }
            }),
        );

        {
            let mut inner = self.inner.lock().unwrap();
            if inner.epoch != epoch {
                tracing::debug!(uid = %uid, "Principal changed during refresh, dropping watch");
                drop(inner);
                drop(handle);
                return;
            }
            let old_watch = inner.user_watch.replace(handle);
            drop(inner);
            drop(old_watch);
        }

        match self.identity.reload(uid).await {
            Ok(fresh) if fresh.email_verified => {
                // Idempotent mirror write; a failure only risks transient
                // inconsistency that self-heals on the next watch tick.
                if let Err(err) = self.store.set_email_verified(uid, true).await {
                    tracing::warn!(
                        uid = %uid,
                        error = %err,
                        "Failed to mirror verified flag"
                    );
                }
                self.apply_remote_verification(true, epoch);
            }
            Ok(_) => {}
            Err(err) => {
                tracing::warn!(uid = %uid, error = %err, "Verification refresh failed");
            }
        }
    }

    /// Apply an asynchronously observed `email_verified` value. Discards the
    /// update if the session has moved to a different principal since the
    /// observation was issued.
    fn apply_remote_verification(&self, email_verified: bool, epoch: u64) {
        let acknowledged = {
            let mut inner = self.inner.lock().unwrap();
            if inner.epoch != epoch {
                tracing::debug!("Discarding stale verification update");
                return;
            }
            inner.email_verified = email_verified;
            if email_verified {
                inner.verification_acknowledged = true;
            }
            self.publish(&inner);
            inner.verification_acknowledged
        };
        if acknowledged && email_verified {
            self.settings.set_bool(keys::VERIFICATION_ACKNOWLEDGED, true);
        }
    }

    /// User chose "skip for now": pass the gate without verifying.
    pub fn acknowledge_without_verifying(&self) {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.verification_acknowledged = true;
            self.publish(&inner);
        }
        self.settings.set_bool(keys::VERIFICATION_ACKNOWLEDGED, true);
        tracing::info!("Verification prompt dismissed");
    }

    /// Validate locally, then sign in with the provider.
    pub async fn sign_in(self: &Arc<Self>, credentials: &Credentials) -> Result<()> {
        credentials.validated()?;
        let principal = self.identity.sign_in(credentials).await?;
        self.on_identity_state_changed(Some(principal)).await;
        Ok(())
    }

    /// Validate locally, create the account, mirror the user record, and
    /// send the verification email.
    pub async fn register(self: &Arc<Self>, registration: &Registration) -> Result<()> {
        registration.validated()?;
        let principal = self.identity.register(registration).await?;

        let record = UserRecord {
            uid: principal.uid.clone(),
            email: principal.email.clone(),
            display_name: Some(registration.display_name.clone()),
            email_verified: false,
            created_at: format_utc_rfc3339(chrono::Utc::now()),
        };
        if let Err(err) = self.store.upsert_user(&record).await {
            tracing::warn!(uid = %principal.uid, error = %err, "Failed to write user record");
        }
        if let Err(err) = self.identity.send_verification_email(&principal.uid).await {
            tracing::warn!(uid = %principal.uid, error = %err, "Failed to send verification email");
        }

        self.on_identity_state_changed(Some(principal)).await;
        Ok(())
    }

    /// Re-send the verification email for the signed-in principal.
    pub async fn resend_verification_email(&self) -> Result<()> {
        let uid = self
            .inner
            .lock()
            .unwrap()
            .uid
            .clone()
            .ok_or(AppError::Unauthorized)?;
        self.identity.send_verification_email(&uid).await
    }

    /// Sign out. A provider failure leaves all state unchanged.
    pub async fn sign_out(self: &Arc<Self>) -> Result<()> {
        self.identity.sign_out().await?;
        self.settings.set_bool(keys::BIOMETRIC_ENABLED, false);
        self.on_identity_state_changed(None).await;
        Ok(())
    }

    /// Delete the account. [`AppError::ReauthRequired`] propagates distinctly
    /// so the caller can present a fresh-credential flow.
    pub async fn delete_account(self: &Arc<Self>) -> Result<()> {
        let uid = self
            .inner
            .lock()
            .unwrap()
            .uid
            .clone()
            .ok_or(AppError::Unauthorized)?;

        self.identity.delete_account(&uid).await?;

        match self.store.delete_user_data(&uid).await {
            Ok(deleted) => tracing::info!(uid = %uid, deleted, "Account data deleted"),
            Err(err) => {
                tracing::warn!(uid = %uid, error = %err, "Failed to delete account data");
            }
        }

        self.settings.set_bool(keys::BIOMETRIC_ENABLED, false);
        self.on_identity_state_changed(None).await;
        Ok(())
    }

    // ─── Biometric Preference ────────────────────────────────────

    pub fn biometric_enabled(&self) -> bool {
        self.settings.get_bool(keys::BIOMETRIC_ENABLED)
    }

    pub fn set_biometric_enabled(&self, enabled: bool) {
        self.settings.set_bool(keys::BIOMETRIC_ENABLED, enabled);
    }

    /// Record a successful biometric check for this process lifetime.
    pub fn mark_biometric_authenticated(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.biometric_authenticated = true;
        self.publish(&inner);
    }
}
