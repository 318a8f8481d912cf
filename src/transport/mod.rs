//! Transport seam: the authenticated HTTP executor the client dispatches through.
//!
//! The client only depends on the [`Transport`] trait. [`HttpTransport`] is the
//! reqwest-backed implementation; tests substitute scripted transports.

pub mod http;

pub use http::HttpTransport;

use crate::{BoxStream, Result};
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

/// A fully resolved request handed to the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    pub method: HttpMethod,
    pub url: String,
    pub body: Option<serde_json::Value>,
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
}

impl TransportRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            url: url.into(),
            body: None,
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            query: Vec::new(),
        }
    }

    pub fn post(url: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            method: HttpMethod::Post,
            body: Some(body),
            ..Self::get(url)
        }
    }

    pub fn with_headers<'a>(mut self, headers: impl IntoIterator<Item = (&'a String, &'a String)>) -> Self {
        self.headers
            .extend(headers.into_iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }
}

/// Authenticated HTTP executor.
///
/// Implementations surface every failure (network, auth, non-2xx) as an error;
/// non-2xx responses should map to [`crate::Error::Remote`] so the client can
/// inspect the structured error details.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Execute a unary request and parse the response body as JSON.
    async fn execute(
        &self,
        request: TransportRequest,
        cancel: Option<&CancellationToken>,
    ) -> Result<serde_json::Value>;

    /// Execute a request whose response body is consumed incrementally.
    async fn execute_stream(
        &self,
        request: TransportRequest,
        cancel: Option<&CancellationToken>,
    ) -> Result<BoxStream<'static, Bytes>>;
}

/// Source of bearer tokens. Token acquisition and refresh live outside this crate.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn access_token(&self) -> Result<Option<String>>;
}

/// A fixed bearer token.
pub struct StaticToken(pub String);

#[async_trait]
impl TokenSource for StaticToken {
    async fn access_token(&self) -> Result<Option<String>> {
        Ok(Some(self.0.clone()))
    }
}

/// Sends requests without an `Authorization` header.
pub struct NoToken;

#[async_trait]
impl TokenSource for NoToken {
    async fn access_token(&self) -> Result<Option<String>> {
        Ok(None)
    }
}

pub fn no_token() -> Arc<dyn TokenSource> {
    Arc::new(NoToken)
}

/// One entry of the `details` list in a backend error envelope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetail {
    #[serde(rename = "@type", default, skip_serializing_if = "Option::is_none")]
    pub type_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, String>>,
}

/// The `error` object of a backend failure response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteErrorBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default)]
    pub details: Vec<ErrorDetail>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: RemoteErrorBody,
}

impl RemoteErrorBody {
    /// Parse a failure body. Streaming endpoints wrap the envelope in a JSON array.
    pub fn parse(text: &str) -> Option<Self> {
        let value: serde_json::Value = serde_json::from_str(text).ok()?;
        let envelope = match value {
            serde_json::Value::Array(mut items) if !items.is_empty() => items.swap_remove(0),
            other => other,
        };
        serde_json::from_value::<ErrorEnvelope>(envelope)
            .ok()
            .map(|e| e.error)
    }

    pub fn has_reason(&self, reason: &str) -> bool {
        self.details
            .iter()
            .any(|d| d.reason.as_deref() == Some(reason))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid request URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Transport error: {0}")]
    Other(String),
}
