// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared fakes for integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use wayfare_core::error::{AppError, Result};
use wayfare_core::models::{Location, ReminderRequest, Trip};
use wayfare_core::services::{Credentials, IdentityProvider, NotificationScheduler, Principal, Registration};

/// In-memory identity provider with scriptable failure modes.
#[derive(Default)]
pub struct FakeIdentityProvider {
    accounts: Mutex<HashMap<String, Principal>>,
    current: Mutex<Option<Principal>>,
    reload_overrides: Mutex<HashMap<String, Principal>>,
    pub sign_in_calls: AtomicU32,
    fail_sign_out: AtomicBool,
    reauth_required_for_delete: AtomicBool,
    verification_emails: Mutex<Vec<String>>,
}

impl FakeIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_account(&self, principal: Principal) {
        let email = principal.email.clone().expect("fake accounts need an email");
        self.accounts.lock().unwrap().insert(email, principal);
    }

    /// Script what `reload` reports for a uid (e.g. verified out-of-band).
    pub fn set_reload(&self, principal: Principal) {
        self.reload_overrides
            .lock()
            .unwrap()
            .insert(principal.uid.clone(), principal);
    }

    pub fn set_fail_sign_out(&self, fail: bool) {
        self.fail_sign_out.store(fail, Ordering::SeqCst);
    }

    pub fn set_reauth_required_for_delete(&self, required: bool) {
        self.reauth_required_for_delete
            .store(required, Ordering::SeqCst);
    }

    pub fn verification_emails_sent(&self) -> Vec<String> {
        self.verification_emails.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl IdentityProvider for FakeIdentityProvider {
    async fn sign_in(&self, credentials: &Credentials) -> Result<Principal> {
        self.sign_in_calls.fetch_add(1, Ordering::SeqCst);
        let principal = self
            .accounts
            .lock()
            .unwrap()
            .get(&credentials.email)
            .cloned()
            .ok_or_else(|| AppError::Identity("no such account".to_string()))?;
        *self.current.lock().unwrap() = Some(principal.clone());
        Ok(principal)
    }

    async fn register(&self, registration: &Registration) -> Result<Principal> {
        let local = registration.email.split('@').next().unwrap_or("user");
        let principal = Principal {
            uid: format!("uid-{}", local),
            email: Some(registration.email.clone()),
            display_name: Some(registration.display_name.clone()),
            email_verified: false,
        };
        self.accounts
            .lock()
            .unwrap()
            .insert(registration.email.clone(), principal.clone());
        *self.current.lock().unwrap() = Some(principal.clone());
        Ok(principal)
    }

    async fn sign_out(&self) -> Result<()> {
        if self.fail_sign_out.load(Ordering::SeqCst) {
            return Err(AppError::Identity("sign-out unavailable".to_string()));
        }
        *self.current.lock().unwrap() = None;
        Ok(())
    }

    async fn current_principal(&self) -> Option<Principal> {
        self.current.lock().unwrap().clone()
    }

    async fn reload(&self, uid: &str) -> Result<Principal> {
        if let Some(p) = self.reload_overrides.lock().unwrap().get(uid) {
            return Ok(p.clone());
        }
        self.accounts
            .lock()
            .unwrap()
            .values()
            .find(|p| p.uid == uid)
            .cloned()
            .ok_or_else(|| AppError::Identity("unknown uid".to_string()))
    }

    async fn send_verification_email(&self, uid: &str) -> Result<()> {
        self.verification_emails.lock().unwrap().push(uid.to_string());
        Ok(())
    }

    async fn delete_account(&self, uid: &str) -> Result<()> {
        if self.reauth_required_for_delete.load(Ordering::SeqCst) {
            return Err(AppError::ReauthRequired);
        }
        self.accounts.lock().unwrap().retain(|_, p| p.uid != uid);
        *self.current.lock().unwrap() = None;
        Ok(())
    }
}

/// Operations seen by the recording scheduler, in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerOp {
    Schedule(String),
    Cancel(String),
}

/// Platform scheduler fake with replace-by-id pending bookkeeping and
/// injectable per-id failures.
#[derive(Default)]
pub struct RecordingScheduler {
    pending_map: Mutex<HashMap<String, ReminderRequest>>,
    ops: Mutex<Vec<SchedulerOp>>,
    fail_ids: Mutex<HashSet<String>>,
}

impl RecordingScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reminder ids that should fail to register.
    pub fn set_fail_ids(&self, ids: impl IntoIterator<Item = String>) {
        let mut guard = self.fail_ids.lock().unwrap();
        guard.clear();
        guard.extend(ids);
    }

    pub fn ops(&self) -> Vec<SchedulerOp> {
        self.ops.lock().unwrap().clone()
    }

    pub fn request(&self, id: &str) -> Option<ReminderRequest> {
        self.pending_map.lock().unwrap().get(id).cloned()
    }
}

#[async_trait::async_trait]
impl NotificationScheduler for RecordingScheduler {
    async fn schedule(&self, request: &ReminderRequest) -> Result<()> {
        self.ops
            .lock()
            .unwrap()
            .push(SchedulerOp::Schedule(request.id.clone()));
        if self.fail_ids.lock().unwrap().contains(&request.id) {
            return Err(AppError::Scheduling("registration refused".to_string()));
        }
        self.pending_map
            .lock()
            .unwrap()
            .insert(request.id.clone(), request.clone());
        Ok(())
    }

    async fn cancel(&self, id: &str) -> Result<()> {
        self.ops.lock().unwrap().push(SchedulerOp::Cancel(id.to_string()));
        self.pending_map.lock().unwrap().remove(id);
        Ok(())
    }

    async fn pending(&self) -> Vec<String> {
        self.pending_map.lock().unwrap().keys().cloned().collect()
    }
}

// ─── Builders ──────────────────────────────────────────────────

pub fn principal(uid: &str, email: &str, verified: bool) -> Principal {
    Principal {
        uid: uid.to_string(),
        email: Some(email.to_string()),
        display_name: None,
        email_verified: verified,
    }
}

pub fn credentials(email: &str) -> Credentials {
    Credentials {
        email: email.to_string(),
        password: "longenough".to_string(),
    }
}

pub fn trip(id: &str, name: &str, start: DateTime<Utc>) -> Trip {
    Trip {
        id: id.to_string(),
        name: name.to_string(),
        destination: None,
        start_date: start,
        end_date: None,
        owner_uid: "u1".to_string(),
        shared_with: Vec::new(),
        created_at: String::new(),
    }
}

pub fn location(id: &str, offset: Option<i64>, start: DateTime<Utc>) -> Location {
    Location {
        id: id.to_string(),
        trip_id: "trip1".to_string(),
        name: "Fushimi Inari".to_string(),
        start_date: start,
        reminder_offset_secs: offset,
        notes: None,
    }
}
