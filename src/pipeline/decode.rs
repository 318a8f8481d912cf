//! Streaming decoder (Bytes -> lines -> JSON Value)
//!
//! The backend speaks a minimal subset of server-sent events:
//! - a line starting with `data: ` carries one fragment of a JSON message;
//! - an empty line closes the message: fragments are trimmed, joined with `\n`
//!   and parsed;
//! - any other line is a protocol violation and ends the stream with an error.
//!
//! Fragments still pending when the input ends are discarded, never flushed.

use crate::pipeline::{Decoder, PipelineError};
use crate::{BoxStream, Error, PipeResult};
use bytes::Bytes;
use futures::{stream, StreamExt, TryStreamExt};
use serde_json::Value;
use std::io;
use tokio_util::codec::{FramedRead, LinesCodec, LinesCodecError};
use tokio_util::io::StreamReader;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Prefix of payload-carrying lines.
pub const DATA_PREFIX: &str = "data: ";

/// Decoder for the `data: ` line protocol.
#[derive(Debug, Default, Clone, Copy)]
pub struct SseLineDecoder;

impl SseLineDecoder {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl Decoder for SseLineDecoder {
    async fn decode_stream(
        &self,
        input: BoxStream<'static, Bytes>,
        cancel: Option<CancellationToken>,
    ) -> PipeResult<BoxStream<'static, Value>> {
        Ok(decode_lines(frame_lines(input), cancel))
    }
}

/// Split a byte stream into lines without the trailing `\n` / `\r\n`.
///
/// Chunk boundaries may fall anywhere, including inside a multi-byte character.
pub fn frame_lines(input: BoxStream<'static, Bytes>) -> BoxStream<'static, String> {
    let reader = StreamReader::new(input.map_err(|e| io::Error::new(io::ErrorKind::Other, e)));
    let lines = FramedRead::new(reader, LinesCodec::new()).map_err(framing_error);
    Box::pin(lines)
}

// Transport errors travel through the reader as `io::Error`; unwrap them so the
// consumer sees the original failure.
fn framing_error(err: LinesCodecError) -> Error {
    match err {
        LinesCodecError::Io(io_err) => {
            let kind = io_err.kind();
            let io_err = match io_err.into_inner() {
                Some(inner) => match inner.downcast::<Error>() {
                    Ok(original) => return *original,
                    Err(inner) => io::Error::new(kind, inner),
                },
                None => io::Error::from(kind),
            };
            Error::Pipeline(PipelineError::Framing(LinesCodecError::Io(io_err)))
        }
        other => Error::Pipeline(PipelineError::Framing(other)),
    }
}

struct LineState {
    lines: BoxStream<'static, String>,
    pending: Vec<String>,
    cancel: Option<CancellationToken>,
    finished: bool,
}

/// Decode framed lines into JSON messages.
///
/// The returned stream is lazy and single-pass. When `cancel` fires while the
/// decoder is waiting for the next line, the stream ends without an error.
pub fn decode_lines(
    lines: BoxStream<'static, String>,
    cancel: Option<CancellationToken>,
) -> BoxStream<'static, Value> {
    let state = LineState {
        lines,
        pending: Vec::new(),
        cancel,
        finished: false,
    };

    let stream = stream::unfold(state, |mut st| async move {
        if st.finished {
            return None;
        }

        loop {
            let next = match &st.cancel {
                Some(token) => tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        debug!(pending = st.pending.len(), "stream decoding cancelled");
                        return None;
                    }
                    line = st.lines.next() => line,
                },
                None => st.lines.next().await,
            };

            let line = match next {
                Some(Ok(line)) => line,
                Some(Err(e)) => {
                    st.finished = true;
                    return Some((Err(e), st));
                }
                None => {
                    if !st.pending.is_empty() {
                        debug!(
                            fragments = st.pending.len(),
                            "stream ended inside an unterminated message; discarding"
                        );
                    }
                    return None;
                }
            };

            if line.is_empty() {
                if st.pending.is_empty() {
                    continue;
                }
                let joined = st.pending.join("\n");
                st.pending.clear();
                return match serde_json::from_str::<Value>(&joined) {
                    Ok(v) => Some((Ok(v), st)),
                    Err(e) => {
                        st.finished = true;
                        Some((Err(PipelineError::Json(e).into()), st))
                    }
                };
            }

            if let Some(payload) = line.strip_prefix(DATA_PREFIX) {
                let fragment = payload.trim().to_string();
                st.pending.push(fragment);
                continue;
            }

            st.finished = true;
            return Some((Err(PipelineError::Protocol { line }.into()), st));
        }
    });

    Box::pin(stream.fuse())
}
