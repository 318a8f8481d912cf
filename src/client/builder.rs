use crate::audit::{AuditLogger, AuditQueue};
use crate::client::core::CodeAssistClient;
use crate::config::{ClientConfig, EndpointOverride};
use crate::transport::{HttpTransport, TokenSource, Transport};
use crate::Result;
use std::sync::Arc;
use uuid::Uuid;

/// Builder for creating clients with custom configuration.
pub struct CodeAssistClientBuilder {
    transport: Option<Arc<dyn Transport>>,
    tokens: Arc<dyn TokenSource>,
    audit: Arc<dyn AuditLogger>,
    config: ClientConfig,
}

impl CodeAssistClientBuilder {
    pub fn new() -> Self {
        Self {
            transport: None,
            tokens: crate::transport::no_token(),
            audit: crate::audit::noop_logger(),
            config: ClientConfig::new(),
        }
    }

    /// Use a custom transport instead of the default reqwest one.
    ///
    /// When set, [`token_source`](Self::token_source) is ignored: the transport
    /// owns authentication.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Bearer tokens for the default HTTP transport.
    pub fn token_source(mut self, tokens: Arc<dyn TokenSource>) -> Self {
        self.tokens = tokens;
        self
    }

    /// Inject an audit logger. Default is a no-op logger.
    pub fn audit_logger(mut self, logger: Arc<dyn AuditLogger>) -> Self {
        self.audit = logger;
        self
    }

    pub fn project_id(mut self, project: impl Into<String>) -> Self {
        self.config.project_id = Some(project.into());
        self
    }

    pub fn session_id(mut self, session: impl Into<String>) -> Self {
        self.config.session_id = Some(session.into());
        self
    }

    /// Tag content requests with a fresh random session id.
    pub fn new_session(self) -> Self {
        self.session_id(Uuid::new_v4().to_string())
    }

    /// Add a header sent with every request.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.extra_headers.insert(name.into(), value.into());
        self
    }

    /// Replace the endpoint override source (default: `CODE_ASSIST_ENDPOINT` env var).
    pub fn endpoint_override(mut self, source: impl EndpointOverride + 'static) -> Self {
        self.config.endpoint_override = Arc::new(source);
        self
    }

    pub fn build(self) -> Result<CodeAssistClient> {
        let transport = match self.transport {
            Some(t) => t,
            None => Arc::new(HttpTransport::new(self.tokens)?),
        };

        Ok(CodeAssistClient {
            transport,
            audit: Arc::new(AuditQueue::new(self.audit)),
            config: self.config,
        })
    }
}

impl Default for CodeAssistClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
