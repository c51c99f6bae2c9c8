//! Streaming chat completion client.
//!
//! Posts a batch of frames to the completion endpoint and relays the SSE
//! response as synthesized realtime events.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::time::Duration;

use futures_util::{Stream, StreamExt, pin_mut};
use reqwest::{Client, StatusCode};
use tracing::{debug, error, info, trace, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::protocol::Event;

use super::request::{CompletionRequest, ContentPart};
use super::sse::{LineBuffer, SseLine, delta_content};
use super::synth::ResponseSynthesizer;

// ============================================================================
// Types
// ============================================================================

/// Sink for synthesized events. Delivery is fire-and-forget.
pub type EventSink<'a> = &'a (dyn Fn(Event) + Send + Sync);

// ============================================================================
// CompletionClient
// ============================================================================

/// HTTP client for the streaming completion endpoint.
#[derive(Clone)]
pub struct CompletionClient {
    /// Shared HTTP client with the request timeout applied.
    http: Client,
    /// POST target.
    endpoint: Url,
    /// Model name sent with every request.
    model: String,
    /// Bearer credential.
    api_key: Option<String>,
}

impl fmt::Debug for CompletionClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionClient")
            .field("endpoint", &self.endpoint.as_str())
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

impl CompletionClient {
    /// Creates a client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] if the HTTP client cannot be built.
    pub fn new(
        endpoint: Url,
        model: impl Into<String>,
        api_key: Option<String>,
        request_timeout: Duration,
    ) -> Result<Self> {
        let http = Client::builder().timeout(request_timeout).build()?;

        Ok(Self {
            http,
            endpoint,
            model: model.into(),
            api_key,
        })
    }

    /// Sends `content` as one streaming request and relays the response.
    ///
    /// Returns the full accumulated text.
    ///
    /// # Errors
    ///
    /// - [`Error::Http`] if the request cannot be sent
    /// - [`Error::Api`] with the raw body if the status is not 200
    pub async fn stream_content(
        &self,
        content: Vec<ContentPart>,
        emit: EventSink<'_>,
    ) -> Result<String> {
        let body = CompletionRequest::streaming(&self.model, content);

        let mut request = self.http.post(self.endpoint.clone()).json(&body);
        if let Some(key) = self.api_key.as_deref().filter(|k| !k.is_empty()) {
            request = request.bearer_auth(key);
        }

        debug!(endpoint = %self.endpoint, model = %self.model, "Sending batch request");

        let response = request.send().await.map_err(|e| {
            error!(error = %e, "Failed to send batch request");
            Error::from(e)
        })?;

        let status = response.status();
        info!(status = status.as_u16(), "Got completion response");

        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_else(|e| {
                warn!(status = status.as_u16(), error = %e, "Failed to read error body");
                String::new()
            });
            error!(status = status.as_u16(), body = %body, "Completion API error");
            return Err(Error::api(status.as_u16(), body));
        }

        Ok(relay_stream(response.bytes_stream(), emit).await)
    }
}

// ============================================================================
// Stream Relay
// ============================================================================

/// Consumes an SSE byte stream and emits the synthesized event sequence.
///
/// `response.created` and `response.output_item.added` go out before the
/// first chunk is read; `response.text.done` and `response.done` go out
/// after `[DONE]`, end of stream, or a read error. Returns the full text.
pub async fn relay_stream<S, B, E>(stream: S, emit: EventSink<'_>) -> String
where
    S: Stream<Item = std::result::Result<B, E>>,
    B: AsRef<[u8]>,
    E: fmt::Display,
{
    let synth = ResponseSynthesizer::new();
    emit(synth.created());
    emit(synth.output_item_added());

    pin_mut!(stream);

    let mut lines = LineBuffer::new();
    let mut full_text = String::new();
    let mut finished = false;

    'read: while let Some(chunk) = stream.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                warn!(error = %e, "Error reading completion stream");
                break;
            }
        };

        for line in lines.push(chunk.as_ref()) {
            if !relay_line(&line, &synth, &mut full_text, emit) {
                finished = true;
                break 'read;
            }
        }
    }

    if !finished && let Some(tail) = lines.finish() {
        relay_line(&tail, &synth, &mut full_text, emit);
    }

    debug!(len = full_text.len(), "Completion stream finished");

    emit(synth.text_done(&full_text));
    emit(synth.done());

    full_text
}

/// Handles one line. Returns `false` on the `[DONE]` terminator.
fn relay_line(
    line: &str,
    synth: &ResponseSynthesizer,
    full_text: &mut String,
    emit: EventSink<'_>,
) -> bool {
    match SseLine::parse(line) {
        SseLine::Done => false,
        SseLine::Data(chunk) => {
            if let Some(delta) = delta_content(&chunk) {
                full_text.push_str(delta);
                emit(synth.text_delta(delta));
            }
            true
        }
        SseLine::Skip => {
            trace!(line = %line, "Skipping stream line");
            true
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
