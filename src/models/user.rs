//! User record mirrored into the document store.

use serde::{Deserialize, Serialize};

/// Per-user document stored in Firestore, keyed by the principal's uid.
///
/// `email_verified` is the remotely stored mirror of the identity provider's
/// verification flag; the session service both writes it (after a provider
/// reload reports verified) and watches it (to catch out-of-band
/// verification from another device).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserRecord {
    /// Identity provider uid (also used as document ID)
    pub uid: String,
    /// Email address (may be None for phone-only accounts)
    #[serde(default)]
    pub email: Option<String>,
    /// Display name chosen at registration
    #[serde(default)]
    pub display_name: Option<String>,
    /// Remote mirror of the provider's email-verified flag
    #[serde(default)]
    pub email_verified: bool,
    /// When the account record was first written (ISO 8601)
    #[serde(default)]
    pub created_at: String,
}

impl UserRecord {
    /// Relaxed decode for partially written documents.
    ///
    /// Mirrors the strict schema field-by-field: `uid` is required, every
    /// other field falls back to its default when absent or mistyped.
    pub fn from_partial(value: &serde_json::Value) -> Option<Self> {
        let uid = value.get("uid")?.as_str()?.to_string();
        Some(Self {
            uid,
            email: value
                .get("email")
                .and_then(|v| v.as_str())
                .map(String::from),
            display_name: value
                .get("display_name")
                .and_then(|v| v.as_str())
                .map(String::from),
            email_verified: value
                .get("email_verified")
                .and_then(|v| v.as_bool())
                .unwrap_or(false),
            created_at: value
                .get("created_at")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
        })
    }
}
