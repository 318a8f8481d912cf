//! Client configuration.
//!
//! The endpoint override is consulted on every call instead of being captured at
//! construction, so changing `CODE_ASSIST_ENDPOINT` (or a [`SharedEndpointOverride`])
//! takes effect on the next request.

use arc_swap::ArcSwapOption;
use std::collections::HashMap;
use std::sync::Arc;

/// Production endpoint of the Code Assist backend.
pub const CODE_ASSIST_ENDPOINT: &str = "https://cloudcode-pa.googleapis.com";

/// API version segment of every method URL.
pub const CODE_ASSIST_API_VERSION: &str = "v1internal";

/// Environment variable that replaces [`CODE_ASSIST_ENDPOINT`].
pub const ENDPOINT_ENV_VAR: &str = "CODE_ASSIST_ENDPOINT";

/// Source of the `endpointOverride` option.
pub trait EndpointOverride: Send + Sync {
    /// The base URL to use instead of the default, if any.
    fn endpoint_override(&self) -> Option<String>;
}

/// Reads [`ENDPOINT_ENV_VAR`] from the process environment on each call.
#[derive(Debug, Clone, Default)]
pub struct EnvEndpointOverride {
    var: Option<String>,
}

impl EnvEndpointOverride {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a different variable (useful when several clients share a process).
    pub fn with_var(var: impl Into<String>) -> Self {
        Self {
            var: Some(var.into()),
        }
    }
}

impl EndpointOverride for EnvEndpointOverride {
    fn endpoint_override(&self) -> Option<String> {
        let var = self.var.as_deref().unwrap_or(ENDPOINT_ENV_VAR);
        std::env::var(var).ok().filter(|v| !v.is_empty())
    }
}

/// Runtime-swappable override shared between the owner and any number of clients.
#[derive(Debug, Clone, Default)]
pub struct SharedEndpointOverride {
    inner: Arc<ArcSwapOption<String>>,
}

impl SharedEndpointOverride {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, endpoint: impl Into<String>) {
        self.inner.store(Some(Arc::new(endpoint.into())));
    }

    pub fn clear(&self) {
        self.inner.store(None);
    }
}

impl EndpointOverride for SharedEndpointOverride {
    fn endpoint_override(&self) -> Option<String> {
        self.inner.load_full().map(|s| s.as_ref().clone())
    }
}

/// A fixed override (or none).
impl EndpointOverride for Option<String> {
    fn endpoint_override(&self) -> Option<String> {
        self.clone()
    }
}

/// Per-client settings.
#[derive(Clone)]
pub struct ClientConfig {
    /// Google Cloud project the calls are billed to.
    pub project_id: Option<String>,
    /// Session id sent with content generation requests.
    pub session_id: Option<String>,
    /// Headers added to every request after `Content-Type`.
    pub extra_headers: HashMap<String, String>,
    pub endpoint_override: Arc<dyn EndpointOverride>,
}

impl ClientConfig {
    pub fn new() -> Self {
        Self {
            project_id: None,
            session_id: None,
            extra_headers: HashMap::new(),
            endpoint_override: Arc::new(EnvEndpointOverride::new()),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("project_id", &self.project_id)
            .field("session_id", &self.session_id)
            .field("extra_headers", &self.extra_headers.keys().collect::<Vec<_>>())
            .field("endpoint_override", &self.endpoint_override.endpoint_override())
            .finish()
    }
}
