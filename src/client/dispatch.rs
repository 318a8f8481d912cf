//! Call dispatch: unary GET/POST and streaming POST.
//!
//! Single attempt, no retry. Transport failures reach the caller unchanged.

use crate::audit::{AuditCategory, AuditEntry, AuditQueue};
use crate::pipeline::decode::SseLineDecoder;
use crate::pipeline::{PipelineBuilder, Transform};
use crate::transport::TransportRequest;
use crate::{BoxStream, PipeResult, Result};
use futures::StreamExt;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::core::{Call, CodeAssistClient};
use super::endpoint::EndpointExt;

impl CodeAssistClient {
    /// GET `{endpoint}/{version}:{method}` and return the JSON body as-is.
    pub async fn request_get(
        &self,
        method: &str,
        cancel: Option<CancellationToken>,
    ) -> Result<Value> {
        self.call(Call::get(method).with_cancel(cancel)).await
    }

    /// POST `body` to `{endpoint}/{version}:{method}` and return the JSON body as-is.
    pub async fn request_post(
        &self,
        method: &str,
        body: Value,
        cancel: Option<CancellationToken>,
    ) -> Result<Value> {
        self.call(Call::post(method, body).with_cancel(cancel)).await
    }

    /// GET a long-running operation by name (`operations/...`).
    pub async fn request_get_operation(
        &self,
        name: &str,
        cancel: Option<CancellationToken>,
    ) -> Result<Value> {
        let request = TransportRequest::get(self.operation_url(name));
        self.execute_unary(name, request, cancel).await
    }

    /// Execute a unary call: POST when it carries a body, GET otherwise.
    pub async fn call(&self, call: Call) -> Result<Value> {
        let url = self.method_url(&call.method);
        let request = match call.body {
            Some(body) => TransportRequest::post(url, body),
            None => TransportRequest::get(url),
        };
        self.execute_unary(&call.method, request, call.cancel).await
    }

    /// POST with `alt=sse` and decode the response into a lazy stream of messages.
    ///
    /// The stream is single-pass. Each message is reported to the audit logger
    /// as it is yielded; a fired `cancel` ends the stream at the next line wait.
    pub async fn request_streaming_post(
        &self,
        method: &str,
        body: Value,
        cancel: Option<CancellationToken>,
    ) -> Result<BoxStream<'static, Value>> {
        self.call_stream(Call::post(method, body).with_cancel(cancel))
            .await
    }

    pub async fn call_stream(&self, call: Call) -> Result<BoxStream<'static, Value>> {
        let body = call.body.unwrap_or(Value::Null);
        let request = TransportRequest::post(self.method_url(&call.method), body)
            .with_query("alt", "sse")
            .with_headers(&self.config.extra_headers);

        self.audit.send(AuditEntry::new(
            AuditCategory::StreamRequest,
            call.method.as_str(),
            request_payload(&request),
        ));

        let start = Instant::now();
        let bytes = match self
            .transport
            .execute_stream(request, call.cancel.as_ref())
            .await
        {
            Ok(bytes) => bytes,
            Err(e) => {
                info!(
                    method = call.method.as_str(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    error = %e,
                    "code assist streaming call failed"
                );
                return Err(e);
            }
        };
        debug!(
            method = call.method.as_str(),
            duration_ms = start.elapsed().as_millis() as u64,
            "code assist stream opened"
        );

        let pipeline = PipelineBuilder::new()
            .set_decoder(Box::new(SseLineDecoder::new()))
            .add_transform(Box::new(AuditTap {
                queue: Arc::clone(&self.audit),
                method: call.method,
            }))
            .build()?;

        pipeline.process_stream(bytes, call.cancel).await
    }

    async fn execute_unary(
        &self,
        label: &str,
        request: TransportRequest,
        cancel: Option<CancellationToken>,
    ) -> Result<Value> {
        let request = request.with_headers(&self.config.extra_headers);

        self.audit.send(AuditEntry::new(
            AuditCategory::Request,
            label,
            request_payload(&request),
        ));

        let start = Instant::now();
        let body = match self.transport.execute(request, cancel.as_ref()).await {
            Ok(body) => body,
            Err(e) => {
                info!(
                    method = label,
                    duration_ms = start.elapsed().as_millis() as u64,
                    error = %e,
                    "code assist call failed"
                );
                return Err(e);
            }
        };
        debug!(
            method = label,
            duration_ms = start.elapsed().as_millis() as u64,
            "code assist call completed"
        );

        self.audit
            .send(AuditEntry::new(AuditCategory::Response, label, body.clone()));
        Ok(body)
    }
}

fn request_payload(request: &TransportRequest) -> Value {
    json!({
        "http_method": request.method.as_str(),
        "url": request.url,
        "body": request.body,
    })
}

/// Reports every decoded message to the audit logger before passing it on.
struct AuditTap {
    queue: Arc<AuditQueue>,
    method: String,
}

#[async_trait::async_trait]
impl Transform for AuditTap {
    async fn transform(
        &self,
        input: BoxStream<'static, Value>,
    ) -> PipeResult<BoxStream<'static, Value>> {
        let queue = Arc::clone(&self.queue);
        let method = self.method.clone();
        let tapped = input.map(move |item| {
            if let Ok(message) = &item {
                queue.send(AuditEntry::new(
                    AuditCategory::StreamResponse,
                    method.as_str(),
                    message.clone(),
                ));
            }
            item
        });
        Ok(Box::pin(tapped))
    }
}
