// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Identity provider contract and user-input validation.
//!
//! The provider (a hosted auth service) is injected; the core only depends
//! on this narrow trait. Input validation happens here, before any provider
//! call, so invalid input never causes a network round trip.

use serde::Deserialize;
use validator::Validate;

use crate::error::{AppError, Result};

/// The authenticated identity reported by the provider.
#[derive(Debug, Clone, PartialEq)]
pub struct Principal {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub email_verified: bool,
}

impl Principal {
    /// Best-effort human-readable name: profile display name, falling back
    /// to the email local-part.
    pub fn best_display_name(&self) -> Option<String> {
        if let Some(name) = &self.display_name {
            if !name.trim().is_empty() {
                return Some(name.clone());
            }
        }
        self.email
            .as_deref()
            .and_then(|email| email.split('@').next())
            .filter(|local| !local.is_empty())
            .map(String::from)
    }
}

/// Sign-in credentials, validated locally before any provider call.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Credentials {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "must be at least 8 characters"))]
    pub password: String,
}

impl Credentials {
    pub fn validated(&self) -> Result<()> {
        self.validate()
            .map_err(|e| AppError::Validation(crate::models::first_validation_message(&e)))
    }
}

/// New-account details, validated locally before any provider call.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Registration {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "must be at least 8 characters"))]
    pub password: String,
    pub password_confirm: String,
    #[validate(length(min = 2, max = 40, message = "must be 2-40 characters"))]
    pub display_name: String,
}

impl Registration {
    pub fn validated(&self) -> Result<()> {
        self.validate()
            .map_err(|e| AppError::Validation(crate::models::first_validation_message(&e)))?;
        if self.password != self.password_confirm {
            return Err(AppError::Validation(
                "password_confirm: passwords do not match".to_string(),
            ));
        }
        Ok(())
    }
}

/// Narrow identity-provider contract.
///
/// Sign-in state changes are delivered by the host wiring the provider's
/// state stream to `SessionService::on_identity_state_changed`.
#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self, credentials: &Credentials) -> Result<Principal>;

    async fn register(&self, registration: &Registration) -> Result<Principal>;

    async fn sign_out(&self) -> Result<()>;

    async fn current_principal(&self) -> Option<Principal>;

    /// Re-fetch the principal's latest server-side state (catches
    /// out-of-band email verification).
    async fn reload(&self, uid: &str) -> Result<Principal>;

    async fn send_verification_email(&self, uid: &str) -> Result<()>;

    /// Destructive; may fail with [`AppError::ReauthRequired`] when the
    /// provider demands a fresh credential.
    async fn delete_account(&self, uid: &str) -> Result<()>;
}
