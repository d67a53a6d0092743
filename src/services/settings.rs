//! Durable local settings.
//!
//! Small key-value flags that must survive process restarts: whether the
//! user has acknowledged the verification prompt, and whether biometric
//! unlock is enabled.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Well-known setting keys.
pub mod keys {
    /// "The user has either verified their email or chosen to proceed
    /// without doing so now." Reset on sign-out.
    pub const VERIFICATION_ACKNOWLEDGED: &str = "verification_acknowledged";
    /// Biometric unlock preference. Reset on sign-out.
    pub const BIOMETRIC_ENABLED: &str = "biometric_enabled";
}

/// Durable boolean key-value storage.
pub trait LocalSettings: Send + Sync {
    /// Missing keys read as false.
    fn get_bool(&self, key: &str) -> bool;
    fn set_bool(&self, key: &str, value: bool);
}

/// File-backed settings, persisted as a flat JSON object.
///
/// The in-memory cache is the process-lifetime truth; a failed file write is
/// logged and only costs durability across a restart.
pub struct JsonFileSettings {
    path: PathBuf,
    cache: Mutex<HashMap<String, bool>>,
}

impl JsonFileSettings {
    /// Open (or lazily create) the settings file. A missing or corrupt file
    /// starts from empty settings.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let cache = match std::fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|err| {
                tracing::warn!(path = %path.display(), error = %err, "Settings file corrupt, starting empty");
                HashMap::new()
            }),
            Err(_) => HashMap::new(),
        };
        Self {
            path,
            cache: Mutex::new(cache),
        }
    }

    fn persist(&self, snapshot: &HashMap<String, bool>) {
        match serde_json::to_string_pretty(snapshot) {
            Ok(raw) => {
                if let Err(err) = std::fs::write(&self.path, raw) {
                    tracing::warn!(path = %self.path.display(), error = %err, "Failed to persist settings");
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "Failed to serialize settings");
            }
        }
    }
}

impl LocalSettings for JsonFileSettings {
    fn get_bool(&self, key: &str) -> bool {
        self.cache
            .lock()
            .unwrap()
            .get(key)
            .copied()
            .unwrap_or(false)
    }

    fn set_bool(&self, key: &str, value: bool) {
        let snapshot = {
            let mut cache = self.cache.lock().unwrap();
            cache.insert(key.to_string(), value);
            cache.clone()
        };
        self.persist(&snapshot);
    }
}

/// In-memory settings for tests.
#[derive(Default)]
pub struct MemorySettings {
    values: Mutex<HashMap<String, bool>>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalSettings for MemorySettings {
    fn get_bool(&self, key: &str) -> bool {
        self.values
            .lock()
            .unwrap()
            .get(key)
            .copied()
            .unwrap_or(false)
    }

    fn set_bool(&self, key: &str, value: bool) {
        self.values.lock().unwrap().insert(key.to_string(), value);
    }
}
