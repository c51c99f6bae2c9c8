//! Streaming completion adapter.
//!
//! Turns a batch of video frames into one streaming chat completion
//! request and replays the server-sent-event response as realtime
//! `response.*` events, so handlers see the same shapes whether a response
//! came over the WebSocket or over HTTP.
//!
//! # Flow
//!
//! ```text
//! frames ──► frame_content ──► POST (stream: true) ──► SSE lines
//!                                                         │
//!           response.created / output_item.added ◄────────┤
//!           response.text.delta (per increment)  ◄────────┤
//!           response.text.done / response.done   ◄────────┘
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `client` | HTTP request and stream relay |
//! | `request` | Request body and content parts |
//! | `sse` | Line splitting and `data:` classification |
//! | `synth` | Synthesized event construction |

// ============================================================================
// Submodules
// ============================================================================

/// HTTP client and stream relay.
pub mod client;

/// Request body types.
pub mod request;

/// Server-sent-event parsing.
pub mod sse;

/// Synthesized response events.
pub mod synth;

// ============================================================================
// Re-exports
// ============================================================================

pub use client::{CompletionClient, EventSink, relay_stream};
pub use request::{ChatMessage, CompletionRequest, ContentPart, ImageUrl, frame_content};
pub use sse::{LineBuffer, SseLine, delta_content};
pub use synth::ResponseSynthesizer;
