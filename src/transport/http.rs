use super::{HttpMethod, RemoteErrorBody, TokenSource, Transport, TransportError, TransportRequest};
use crate::{BoxStream, Error, ErrorContext, Result};
use async_trait::async_trait;
use bytes::Bytes;
use futures::TryStreamExt;
use reqwest::Proxy;
use std::env;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

const PROXY_ENV_VAR: &str = "CODE_ASSIST_PROXY_URL";

/// reqwest-backed [`Transport`].
pub struct HttpTransport {
    client: reqwest::Client,
    tokens: Arc<dyn TokenSource>,
}

impl HttpTransport {
    /// Build a transport with env-overridable defaults:
    /// - `CODE_ASSIST_HTTP_TIMEOUT_SECS` (connect timeout, default 30; streams have no total timeout)
    /// - `CODE_ASSIST_PROXY_URL`
    pub fn new(tokens: Arc<dyn TokenSource>) -> Result<Self> {
        let connect_timeout_secs = env::var("CODE_ASSIST_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(30);

        let mut builder = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .pool_idle_timeout(Some(Duration::from_secs(90)))
            // Streams can stay open for minutes; keep the connection alive.
            .http2_keep_alive_interval(Some(Duration::from_secs(30)))
            .http2_keep_alive_timeout(Duration::from_secs(10));

        if let Ok(proxy_url) = env::var(PROXY_ENV_VAR) {
            builder = builder.proxy(parse_proxy(&proxy_url)?);
        }

        let client = builder
            .build()
            .map_err(|e| Error::Transport(TransportError::Other(e.to_string())))?;

        Ok(Self { client, tokens })
    }

    /// Wrap an existing reqwest client (shared pools, custom TLS, tests).
    pub fn with_client(client: reqwest::Client, tokens: Arc<dyn TokenSource>) -> Self {
        Self { client, tokens }
    }

    async fn send(
        &self,
        request: TransportRequest,
        cancel: Option<&CancellationToken>,
    ) -> Result<reqwest::Response> {
        let url = url::Url::parse(&request.url).map_err(TransportError::InvalidUrl)?;

        let mut req = match request.method {
            HttpMethod::Post => self.client.post(url),
            HttpMethod::Get => self.client.get(url),
        };

        if let Some(token) = self.tokens.access_token().await? {
            req = req.bearer_auth(token);
        }
        for (k, v) in &request.headers {
            req = req.header(k, v);
        }
        if !request.query.is_empty() {
            req = req.query(&request.query);
        }
        if let Some(body) = &request.body {
            req = req.body(serde_json::to_vec(body)?);
        }

        let start = std::time::Instant::now();
        let resp = until_cancelled(cancel, async {
            req.send()
                .await
                .map_err(|e| Error::Transport(TransportError::Http(e)))
        })
        .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let read = until_cancelled(cancel, async { Ok(resp.text().await) }).await?;
            let (body, message) = match read {
                Ok(text) => {
                    let body = RemoteErrorBody::parse(&text);
                    let message = body
                        .as_ref()
                        .and_then(|b| b.message.clone())
                        .unwrap_or(text);
                    (body, message)
                }
                Err(e) => (None, format!("unreadable error body: {}", e)),
            };

            info!(
                http_status = status,
                method = request.method.as_str(),
                url = request.url.as_str(),
                duration_ms = start.elapsed().as_millis() as u64,
                "code assist request failed"
            );
            return Err(Error::Remote {
                status,
                message,
                body,
            });
        }

        debug!(
            http_status = resp.status().as_u16(),
            url = request.url.as_str(),
            duration_ms = start.elapsed().as_millis() as u64,
            "code assist response headers received"
        );
        Ok(resp)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(
        &self,
        request: TransportRequest,
        cancel: Option<&CancellationToken>,
    ) -> Result<serde_json::Value> {
        let resp = self.send(request, cancel).await?;
        let text = until_cancelled(cancel, async {
            resp.text()
                .await
                .map_err(|e| Error::Transport(TransportError::Http(e)))
        })
        .await?;

        if text.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }

    async fn execute_stream(
        &self,
        request: TransportRequest,
        cancel: Option<&CancellationToken>,
    ) -> Result<BoxStream<'static, Bytes>> {
        let resp = self.send(request, cancel).await?;
        let byte_stream = resp
            .bytes_stream()
            .map_err(|e| Error::Transport(TransportError::Http(e)));
        Ok(Box::pin(byte_stream))
    }
}

fn parse_proxy(proxy_url: &str) -> Result<Proxy> {
    Proxy::all(proxy_url).map_err(|e| {
        Error::configuration_with_context(
            "invalid proxy URL",
            ErrorContext::new()
                .with_field_path(PROXY_ENV_VAR)
                .with_details(e.to_string())
                .with_source("http_transport"),
        )
    })
}

/// Race `fut` against the token. The future is dropped once the token fires.
async fn until_cancelled<T, F>(cancel: Option<&CancellationToken>, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match cancel {
        Some(token) => tokio::select! {
            biased;
            _ = token.cancelled() => Err(Error::Cancelled),
            res = fut => res,
        },
        None => fut.await,
    }
}
