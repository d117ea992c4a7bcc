//! # Audit Sink
//!
//! Fire-and-forget JSON audit trail for the operations that change
//! money or stock.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  handler ──try_send──► bounded mpsc ──► writer task ──► logs/          │
//! │                                                         transactions   │
//! │                                                         .log (JSONL)   │
//! │                                                                         │
//! │  The caller's transaction NEVER waits on or fails with the audit       │
//! │  trail: a full channel or a write error drops the event with a         │
//! │  warn!, nothing more.                                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tracing::{error, warn};
use uuid::Uuid;

use store_core::{Money, Tier};

/// Buffered events before the sink starts dropping.
const CHANNEL_CAPACITY: usize = 256;

// =============================================================================
// Events
// =============================================================================

/// One auditable event.
///
/// Serialized as a tagged JSON union:
/// `{ "type": "SaleCompleted", "payload": { ... } }`
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "payload")]
pub enum AuditEvent {
    /// A sale (single-line or cart) committed.
    SaleCompleted {
        branch: String,
        customer_id: String,
        tier: Tier,
        base_total: Money,
        discount: Money,
        final_total: Money,
        line_count: usize,
        gift_granted: Option<bool>,
    },

    /// Stock was ordered into a branch.
    StockOrdered {
        branch: String,
        sku: String,
        quantity: i64,
    },

    /// A customer record was registered.
    CustomerAdded { customer_id: String },

    /// A login attempt was rejected.
    LoginDenied { username: String, reason: String },
}

/// Envelope written to the log: event id, timestamp, event body.
#[derive(Debug, Serialize)]
struct AuditRecord {
    id: Uuid,
    at: DateTime<Utc>,
    #[serde(flatten)]
    event: AuditEvent,
}

// =============================================================================
// Sink
// =============================================================================

/// Handle for recording audit events. Cheap to clone; all clones feed
/// one writer task.
#[derive(Debug, Clone)]
pub struct AuditSink {
    tx: mpsc::Sender<AuditEvent>,
}

impl AuditSink {
    /// Spawns the writer task appending to `<log_dir>/transactions.log`
    /// and returns the sending handle.
    pub fn spawn(log_dir: PathBuf) -> AuditSink {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        tokio::spawn(write_loop(log_dir.join("transactions.log"), rx));
        AuditSink { tx }
    }

    /// Records an event without waiting. Dropped events are logged and
    /// forgotten.
    pub fn record(&self, event: AuditEvent) {
        if let Err(e) = self.tx.try_send(event) {
            warn!(?e, "audit event dropped");
        }
    }
}

/// Writer task: one JSON line per event, appended.
async fn write_loop(path: PathBuf, mut rx: mpsc::Receiver<AuditEvent>) {
    if let Some(parent) = path.parent() {
        if let Err(e) = tokio::fs::create_dir_all(parent).await {
            error!(?e, path = %path.display(), "cannot create audit log directory");
            return;
        }
    }

    while let Some(event) = rx.recv().await {
        let record = AuditRecord {
            id: Uuid::new_v4(),
            at: Utc::now(),
            event,
        };
        let line = match serde_json::to_string(&record) {
            Ok(json) => json,
            Err(e) => {
                warn!(?e, "audit event not serializable, dropped");
                continue;
            }
        };
        if let Err(e) = append_line(&path, &line).await {
            warn!(?e, "audit write failed, event dropped");
        }
    }
}

async fn append_line(path: &PathBuf, line: &str) -> std::io::Result<()> {
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(line.as_bytes()).await?;
    file.write_all(b"\n").await?;
    Ok(())
}
