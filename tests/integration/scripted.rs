//! In-process transport and audit sinks for dispatcher tests

use async_trait::async_trait;
use bytes::Bytes;
use code_assist_rpc::audit::{AuditCategory, AuditEntry, AuditLogger, InMemoryAuditLogger};
use code_assist_rpc::transport::{ErrorDetail, RemoteErrorBody, Transport, TransportRequest};
use code_assist_rpc::{BoxStream, CancellationToken, Error, Result};
use futures::StreamExt;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

pub enum Reply {
    Json(serde_json::Value),
    Stream(Vec<&'static str>),
    /// Chunks are fed by the test through the sender half.
    Channel(UnboundedReceiver<Bytes>),
    Fail(Error),
}

/// Replays scripted replies in order and records every request.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<TransportRequest>>,
}

impl ScriptedTransport {
    pub fn new(replies: Vec<Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn next(&self, request: TransportRequest) -> Reply {
        self.requests.lock().unwrap().push(request);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .expect("no scripted reply left")
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn execute(
        &self,
        request: TransportRequest,
        _cancel: Option<&CancellationToken>,
    ) -> Result<serde_json::Value> {
        match self.next(request) {
            Reply::Json(v) => Ok(v),
            Reply::Fail(e) => Err(e),
            _ => panic!("streaming reply scripted for a unary call"),
        }
    }

    async fn execute_stream(
        &self,
        request: TransportRequest,
        _cancel: Option<&CancellationToken>,
    ) -> Result<BoxStream<'static, Bytes>> {
        match self.next(request) {
            Reply::Stream(chunks) => Ok(Box::pin(
                futures::stream::iter(chunks).map(|c| Ok(Bytes::from_static(c.as_bytes()))),
            )),
            Reply::Channel(rx) => Ok(Box::pin(
                tokio_stream::wrappers::UnboundedReceiverStream::new(rx).map(Ok),
            )),
            Reply::Fail(e) => Err(e),
            Reply::Json(_) => panic!("unary reply scripted for a streaming call"),
        }
    }
}

pub fn remote_error(status: u16, reason: &str) -> Error {
    Error::Remote {
        status,
        message: format!("rejected: {}", reason),
        body: Some(RemoteErrorBody {
            code: Some(status as i64),
            message: Some(format!("rejected: {}", reason)),
            status: Some("PERMISSION_DENIED".to_string()),
            details: vec![ErrorDetail {
                type_url: Some("type.googleapis.com/google.rpc.ErrorInfo".to_string()),
                reason: Some(reason.to_string()),
                domain: Some("googleapis.com".to_string()),
                metadata: None,
            }],
        }),
    }
}

/// Always fails.
pub struct FailingLogger;

#[async_trait]
impl AuditLogger for FailingLogger {
    async fn log(&self, _: AuditEntry) -> Result<()> {
        Err(Error::unsupported("audit sink offline"))
    }
}

/// Panics on every entry.
pub struct PanickingLogger;

#[async_trait]
impl AuditLogger for PanickingLogger {
    async fn log(&self, _: AuditEntry) -> Result<()> {
        panic!("audit sink exploded");
    }
}

/// Never completes.
pub struct StalledLogger;

#[async_trait]
impl AuditLogger for StalledLogger {
    async fn log(&self, _: AuditEntry) -> Result<()> {
        futures::future::pending::<()>().await;
        Ok(())
    }
}

/// Wait until `logger` holds at least `n` entries of `category` (audit writes are detached).
pub async fn wait_for_entries(
    logger: &InMemoryAuditLogger,
    category: AuditCategory,
    n: usize,
) -> Vec<AuditEntry> {
    for _ in 0..200 {
        let entries = logger.entries_by_category(category);
        if entries.len() >= n {
            return entries;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!(
        "expected {} {:?} entries, got {}",
        n,
        category,
        logger.entries_by_category(category).len()
    );
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
