//! Network reachability signal.
//!
//! A boolean connected stream the UI subscribes to for its offline banner.
//! The core never uses it for retry or backoff decisions.

use tokio::sync::watch;

pub struct ReachabilityMonitor {
    tx: watch::Sender<bool>,
}

impl Default for ReachabilityMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl ReachabilityMonitor {
    /// Starts optimistically connected.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(true);
        Self { tx }
    }

    /// Feed from the platform's reachability callback.
    pub fn set_connected(&self, connected: bool) {
        if self.tx.send_replace(connected) != connected {
            tracing::info!(connected, "Network reachability changed");
        }
    }

    pub fn is_connected(&self) -> bool {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}
