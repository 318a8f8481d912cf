//! # code-assist-rpc
//!
//! Streaming RPC client for the Code Assist generative-AI backend.
//!
//! ## Overview
//!
//! Every backend method is addressed as `{endpoint}/{version}:{method}` and called
//! either as a unary JSON request or as a streaming POST whose body is a
//! line-oriented `data: ` protocol. The client:
//!
//! - **Resolves endpoints** per call, honoring a runtime override
//! - **Dispatches** unary GET/POST and streaming POST calls through a pluggable [`transport::Transport`]
//! - **Decodes streams lazily**: one JSON message per blank-line-delimited block, nothing buffered beyond the message in flight
//! - **Cancels cooperatively** via [`tokio_util::sync::CancellationToken`]
//! - **Audits** every request and response through an optional [`audit::AuditLogger`]
//!
//! Failures propagate verbatim; there is no retry layer. The single exception
//! is the tier lookup, where a `SECURITY_POLICY_VIOLATED` rejection resolves to
//! the standard tier.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use code_assist_rpc::transport::StaticToken;
//! use code_assist_rpc::types::{Content, GenerateContentParams};
//! use code_assist_rpc::CodeAssistClient;
//! use futures::StreamExt;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> code_assist_rpc::Result<()> {
//!     let client = CodeAssistClient::builder()
//!         .token_source(Arc::new(StaticToken("ya29.token".into())))
//!         .project_id("my-project")
//!         .build()?;
//!
//!     let params = GenerateContentParams::new("gemini-2.5-pro", vec![Content::user("Hello")]);
//!     let mut stream = client.generate_content_stream(&params, "prompt-1", None).await?;
//!     while let Some(chunk) = stream.next().await {
//!         print!("{}", chunk?.text().unwrap_or_default());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | Client, builder, dispatch, error classification |
//! | [`transport`] | Transport trait and reqwest implementation |
//! | [`pipeline`] | Streaming decoder and transforms |
//! | [`audit`] | Audit logging side channel |
//! | [`config`] | Endpoint constants and client configuration |
//! | [`convert`] | Wire request/response converters |
//! | [`types`] | Caller-facing request and response types |

pub mod audit;
pub mod client;
pub mod config;
pub mod convert;
pub mod pipeline;
pub mod transport;
pub mod types;

// Re-export main types for convenience
pub use audit::{AuditEntry, AuditLogger};
pub use client::{Call, CodeAssistClient, CodeAssistClientBuilder, EndpointExt, TierLookup};
pub use config::{ClientConfig, CODE_ASSIST_API_VERSION, CODE_ASSIST_ENDPOINT};
pub use tokio_util::sync::CancellationToken;

use futures::Stream;
use std::pin::Pin;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// A specialized Result for pipeline operations
pub type PipeResult<T> = std::result::Result<T, Error>;

/// A unified pinned, boxed stream that emits `PipeResult<T>`
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = PipeResult<T>> + Send + 'a>>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
