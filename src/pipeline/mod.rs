//! Streaming response pipeline.
//!
//! ```text
//! Raw Bytes → line framing → Decoder → Transforms → JSON messages
//!     │                         │           │
//!   HTTP                   pseudo-SSE    audit tap,
//!                          framing       per-call hooks
//! ```
//!
//! Every stage is lazy: nothing is read from the transport until the consumer
//! polls the returned stream, and at most one in-flight message is buffered.
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`Pipeline`] | Decoder plus ordered transforms |
//! | [`Decoder`] | Trait for stream decoding |
//! | [`Transform`] | Trait for pass-through or rewriting stages |
//! | [`decode`] | The `data: ` line decoder |

pub mod decode;


use crate::{BoxStream, PipeResult};
use tokio_util::sync::CancellationToken;

/// Transformer interface applied to decoded messages.
#[async_trait::async_trait]
pub trait Transform: Send + Sync {
    /// A transform takes a stream of JSON values and returns a new stream of JSON values
    async fn transform(
        &self,
        input: BoxStream<'static, serde_json::Value>,
    ) -> PipeResult<BoxStream<'static, serde_json::Value>>;
}

/// Decoder trait for stream decoding
#[async_trait::async_trait]
pub trait Decoder: Send + Sync {
    /// Decode a byte stream into JSON values, stopping early once `cancel` fires.
    async fn decode_stream(
        &self,
        input: BoxStream<'static, bytes::Bytes>,
        cancel: Option<CancellationToken>,
    ) -> PipeResult<BoxStream<'static, serde_json::Value>>;
}

/// Pipeline error types
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A non-blank line without the payload prefix.
    #[error("Unexpected line in stream: {line:?}")]
    Protocol { line: String },

    #[error("Malformed JSON message: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Line framing failed: {0}")]
    Framing(#[from] tokio_util::codec::LinesCodecError),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Pipeline builder
pub struct PipelineBuilder {
    decoder: Option<Box<dyn Decoder>>,
    transforms: Vec<Box<dyn Transform>>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self {
            decoder: None,
            transforms: Vec::new(),
        }
    }

    pub fn set_decoder(mut self, decoder: Box<dyn Decoder>) -> Self {
        self.decoder = Some(decoder);
        self
    }

    pub fn add_transform(mut self, transform: Box<dyn Transform>) -> Self {
        self.transforms.push(transform);
        self
    }

    pub fn build(self) -> Result<Pipeline, PipelineError> {
        Ok(Pipeline {
            decoder: self
                .decoder
                .ok_or_else(|| PipelineError::Configuration("Decoder is required".to_string()))?,
            transforms: self.transforms,
        })
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Pipeline that processes streaming responses
pub struct Pipeline {
    decoder: Box<dyn Decoder>,
    transforms: Vec<Box<dyn Transform>>,
}

impl Pipeline {
    /// Process a byte stream through the pipeline
    pub async fn process_stream(
        &self,
        input: BoxStream<'static, bytes::Bytes>,
        cancel: Option<CancellationToken>,
    ) -> PipeResult<BoxStream<'static, serde_json::Value>> {
        let mut stream = self.decoder.decode_stream(input, cancel).await?;

        for transform in &self.transforms {
            stream = transform.transform(stream).await?;
        }

        Ok(stream)
    }
}
