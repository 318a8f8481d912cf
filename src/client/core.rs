use crate::audit::AuditQueue;
use crate::config::ClientConfig;
use crate::transport::Transport;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Client for the Code Assist backend.
///
/// Holds no per-call state: every call owns its request, decoder buffer and
/// cancellation token, so one client can serve concurrent callers behind an `Arc`.
pub struct CodeAssistClient {
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) audit: Arc<AuditQueue>,
    pub(crate) config: ClientConfig,
}

impl CodeAssistClient {
    pub fn builder() -> crate::client::builder::CodeAssistClientBuilder {
        crate::client::builder::CodeAssistClientBuilder::new()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn project_id(&self) -> Option<&str> {
        self.config.project_id.as_deref()
    }

    pub fn session_id(&self) -> Option<&str> {
        self.config.session_id.as_deref()
    }
}

impl std::fmt::Debug for CodeAssistClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodeAssistClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// One RPC invocation: the method name, its wire body (absent for GET) and an
/// optional cancellation token.
#[derive(Debug, Clone)]
pub struct Call {
    pub method: String,
    pub body: Option<serde_json::Value>,
    pub cancel: Option<CancellationToken>,
}

impl Call {
    pub fn get(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            body: None,
            cancel: None,
        }
    }

    pub fn post(method: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            method: method.into(),
            body: Some(body),
            cancel: None,
        }
    }

    pub fn with_cancel(mut self, cancel: Option<CancellationToken>) -> Self {
        self.cancel = cancel;
        self
    }
}
