// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent classification.

/// Core error type shared by the session and reminder services.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Re-authentication required")]
    ReauthRequired,

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Identity provider error: {0}")]
    Identity(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Notification scheduling error: {0}")]
    Scheduling(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// True for failures that leave state at last-known-good and are expected
    /// to self-heal on the next reconciliation attempt (subscription tick,
    /// manual refresh, re-save).
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            AppError::Identity(_) | AppError::Database(_) | AppError::Scheduling(_)
        )
    }

    /// True when the caller must present a fresh-credential flow rather than
    /// retry. Never silently retried.
    pub fn is_reauth_required(&self) -> bool {
        matches!(self, AppError::ReauthRequired)
    }

    /// Short, non-technical message suitable for direct display.
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Unauthorized => "Please sign in to continue.",
            AppError::ReauthRequired => "Please sign in again to confirm it's you.",
            AppError::Validation(_) => "Please check your input and try again.",
            AppError::Identity(_) => "Couldn't reach the sign-in service. Try again shortly.",
            AppError::Database(_) => "Couldn't sync your data. Try again shortly.",
            AppError::Scheduling(_) => "Couldn't set that reminder. Re-save to retry.",
            AppError::Internal(_) => "Something went wrong. Try again shortly.",
        }
    }
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(AppError::Identity("timeout".to_string()).is_transient());
        assert!(AppError::Database("unavailable".to_string()).is_transient());
        assert!(AppError::Scheduling("denied".to_string()).is_transient());

        assert!(!AppError::Unauthorized.is_transient());
        assert!(!AppError::ReauthRequired.is_transient());
        assert!(!AppError::Validation("bad email".to_string()).is_transient());
    }

    #[test]
    fn reauth_is_distinct_from_generic_failures() {
        assert!(AppError::ReauthRequired.is_reauth_required());
        assert!(!AppError::Identity("expired".to_string()).is_reauth_required());
        assert!(!AppError::Unauthorized.is_reauth_required());
    }

    #[test]
    fn user_messages_are_nonempty() {
        let errors = [
            AppError::Unauthorized,
            AppError::ReauthRequired,
            AppError::Validation("x".to_string()),
            AppError::Identity("x".to_string()),
            AppError::Database("x".to_string()),
            AppError::Scheduling("x".to_string()),
            AppError::Internal(anyhow::anyhow!("x")),
        ];
        for err in errors {
            assert!(!err.user_message().is_empty());
        }
    }
}
