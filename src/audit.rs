//! Audit logging side channel.
//!
//! The client reports every outbound request and every inbound response (each
//! streamed message individually) to an [`AuditLogger`]. Reporting is
//! fire-and-forget: entries are queued in order for a detached drain task, so a
//! slow or failing logger never delays or fails the call it describes.
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`AuditLogger`] | Trait for audit destinations |
//! | [`NoopAuditLogger`] | Default sink (discards entries) |
//! | [`InMemoryAuditLogger`] | Bounded in-memory sink for tests and debugging |
//! | [`TracingAuditLogger`] | Emits entries as `tracing` debug events |

use crate::Result;
use async_trait::async_trait;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, OnceLock, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::debug;

fn timestamp() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditCategory {
    Request,
    StreamRequest,
    Response,
    StreamResponse,
}

impl AuditCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditCategory::Request => "request",
            AuditCategory::StreamRequest => "stream_request",
            AuditCategory::Response => "response",
            AuditCategory::StreamResponse => "stream_response",
        }
    }
}

/// One append-only audit record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub timestamp: f64,
    pub category: AuditCategory,
    /// RPC method (or operation name) the payload belongs to.
    pub method: String,
    pub payload: serde_json::Value,
}

impl AuditEntry {
    pub fn new(
        category: AuditCategory,
        method: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            timestamp: timestamp(),
            category,
            method: method.into(),
            payload,
        }
    }
}

/// Audit sink trait.
#[async_trait]
pub trait AuditLogger: Send + Sync {
    async fn log(&self, entry: AuditEntry) -> Result<()>;
}

/// No-op sink (always available).
pub struct NoopAuditLogger;

#[async_trait]
impl AuditLogger for NoopAuditLogger {
    async fn log(&self, _: AuditEntry) -> Result<()> {
        Ok(())
    }
}

/// Returns a no-op audit logger.
pub fn noop_logger() -> Arc<dyn AuditLogger> {
    Arc::new(NoopAuditLogger)
}

/// Entries waiting for a slow logger beyond this are dropped.
pub const AUDIT_QUEUE_CAPACITY: usize = 1024;

/// Per-client ordered hand-off to an [`AuditLogger`].
///
/// Entries go through one bounded channel drained by a single task, so the
/// logger sees them in the order the client produced them. Enqueueing never
/// waits: a full queue drops the entry. The drain task starts on the first
/// entry; outside a tokio runtime entries are dropped.
pub(crate) struct AuditQueue {
    logger: Arc<dyn AuditLogger>,
    sender: OnceLock<mpsc::Sender<AuditEntry>>,
    capacity: usize,
}

impl AuditQueue {
    pub(crate) fn new(logger: Arc<dyn AuditLogger>) -> Self {
        Self::with_capacity(logger, AUDIT_QUEUE_CAPACITY)
    }

    pub(crate) fn with_capacity(logger: Arc<dyn AuditLogger>, capacity: usize) -> Self {
        Self {
            logger,
            sender: OnceLock::new(),
            capacity: capacity.max(1),
        }
    }

    pub(crate) fn send(&self, entry: AuditEntry) {
        let Some(sender) = self.sender() else {
            debug!(method = entry.method.as_str(), "no tokio runtime; audit entry dropped");
            return;
        };
        match sender.try_send(entry) {
            Ok(()) => {}
            Err(TrySendError::Full(entry)) => {
                debug!(
                    category = entry.category.as_str(),
                    method = entry.method.as_str(),
                    "audit queue full; entry dropped"
                );
            }
            Err(TrySendError::Closed(entry)) => {
                debug!(
                    category = entry.category.as_str(),
                    method = entry.method.as_str(),
                    "audit drain task gone; entry dropped"
                );
            }
        }
    }

    fn sender(&self) -> Option<&mpsc::Sender<AuditEntry>> {
        if let Some(sender) = self.sender.get() {
            return Some(sender);
        }
        let handle = tokio::runtime::Handle::try_current().ok()?;
        let (tx, rx) = mpsc::channel(self.capacity);
        // A racing initializer wins; the losing channel is dropped unused.
        if self.sender.set(tx).is_ok() {
            handle.spawn(drain(Arc::clone(&self.logger), rx));
        }
        self.sender.get()
    }
}

impl std::fmt::Debug for AuditQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditQueue")
            .field("capacity", &self.capacity)
            .field("started", &self.sender.get().is_some())
            .finish_non_exhaustive()
    }
}

async fn drain(logger: Arc<dyn AuditLogger>, mut rx: mpsc::Receiver<AuditEntry>) {
    while let Some(entry) = rx.recv().await {
        let category = entry.category;
        let method = entry.method.clone();
        match AssertUnwindSafe(logger.log(entry)).catch_unwind().await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => debug!(
                category = category.as_str(),
                method = method.as_str(),
                error = %e,
                "audit logger failed"
            ),
            Err(_) => debug!(
                category = category.as_str(),
                method = method.as_str(),
                "audit logger panicked"
            ),
        }
    }
}

/// In-memory sink for testing.
pub struct InMemoryAuditLogger {
    entries: Arc<RwLock<Vec<AuditEntry>>>,
    max_entries: usize,
}

impl InMemoryAuditLogger {
    pub fn new(max: usize) -> Self {
        Self {
            entries: Arc::new(RwLock::new(Vec::new())),
            max_entries: max,
        }
    }

    pub fn entries(&self) -> Vec<AuditEntry> {
        match self.entries.read() {
            Ok(entries) => entries.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn entries_by_category(&self, category: AuditCategory) -> Vec<AuditEntry> {
        self.entries()
            .into_iter()
            .filter(|e| e.category == category)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl AuditLogger for InMemoryAuditLogger {
    async fn log(&self, entry: AuditEntry) -> Result<()> {
        let mut entries = match self.entries.write() {
            Ok(entries) => entries,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries.push(entry);
        if entries.len() > self.max_entries {
            entries.remove(0);
        }
        Ok(())
    }
}

/// Writes entries to `tracing` under the `code_assist::audit` target.
pub struct TracingAuditLogger;

#[async_trait]
impl AuditLogger for TracingAuditLogger {
    async fn log(&self, entry: AuditEntry) -> Result<()> {
        debug!(
            target: "code_assist::audit",
            category = entry.category.as_str(),
            method = entry.method.as_str(),
            timestamp = entry.timestamp,
            payload = %entry.payload,
        );
        Ok(())
    }
}
