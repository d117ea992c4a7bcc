//! # Session Registry
//!
//! Process-wide set of usernames with a live connection. One login per
//! username at a time: `reserve` is the atomic duplicate gate.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  conn A: reserve("alice") ─► true   (set now holds "alice")            │
//! │  conn B: reserve("alice") ─► false  (ERR LOGIN ALREADY_CONNECTED)      │
//! │  conn A: release("alice")           (logout, EOF, or I/O error)        │
//! │  conn B: reserve("alice") ─► true                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashSet;

use tokio::sync::Mutex;
use tracing::debug;

/// Registry of currently logged-in usernames.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    active: Mutex<HashSet<String>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        SessionRegistry::default()
    }

    /// Atomically reserves a username. Returns `false` when the name is
    /// already connected.
    pub async fn reserve(&self, username: &str) -> bool {
        let mut active = self.active.lock().await;
        let inserted = active.insert(username.to_string());
        if inserted {
            debug!(username = %username, sessions = active.len(), "session reserved");
        }
        inserted
    }

    /// Releases a username. Releasing a name that is not reserved is a
    /// no-op, so every connection exit path can call this blindly.
    pub async fn release(&self, username: &str) {
        let mut active = self.active.lock().await;
        if active.remove(username) {
            debug!(username = %username, sessions = active.len(), "session released");
        }
    }

    /// Number of live sessions.
    pub async fn count(&self) -> usize {
        self.active.lock().await.len()
    }

    /// Drops every reservation. Called at shutdown.
    pub async fn clear(&self) {
        self.active.lock().await.clear();
    }
}
