//! GLM Realtime - Realtime event client with batched video completions.
//!
//! This library connects to a realtime endpoint over WebSocket, exchanges
//! JSON events with it, and batches video frames into streaming chat
//! completion requests whose responses are replayed as realtime events.
//!
//! # Architecture
//!
//! The client has two inbound paths that share one event handler:
//!
//! - **Live**: a background receive loop reads events off the WebSocket
//! - **Batch**: buffered frames are posted to the completion endpoint and
//!   the SSE response is turned into `response.*` events
//!
//! Key design principles:
//!
//! - Each [`RealtimeClient`] owns one connection, one receive loop and one
//!   frame buffer
//! - Connection state and the frame buffer are separate lock domains
//! - No automatic retry; a failed connection is reported, not repaired
//!
//! # Quick Start
//!
//! ```no_run
//! use glm_realtime::{Event, RealtimeClient, Result, event_type};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = RealtimeClient::builder()
//!         .url("wss://open.bigmodel.cn/api/paas/v4/realtime")
//!         .api_key("your-api-key")
//!         .on_event(|event| {
//!             if event.is(event_type::RESPONSE_TEXT_DELTA) {
//!                 print!("{}", event.delta);
//!             }
//!             Ok(())
//!         })
//!         .build()?;
//!
//!     client.connect().await?;
//!     client.send(Event::new(event_type::RESPONSE_CREATE)).await?;
//!
//!     let frame: Vec<u8> = std::fs::read("frame.jpg")?;
//!     client.send_frame_by_video(Event::video_frame(frame)).await?;
//!     client.flush_video_frames().await?;
//!
//!     client.wait().await;
//!     client.disconnect().await
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | [`RealtimeClient`], [`ClientBuilder`], receive loop, frame batching |
//! | [`completion`] | Streaming completion request and SSE relay |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`protocol`] | Realtime event types |
//! | [`transport`] | WebSocket transport layer |

// ============================================================================
// Modules
// ============================================================================

/// Realtime session client.
///
/// Use [`RealtimeClient::builder()`] to create a configured client.
pub mod client;

/// Streaming completion adapter.
///
/// Turns frame batches into `response.*` events.
pub mod completion;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers for synthesized events.
///
/// Newtype wrappers prevent mixing incompatible IDs at compile time.
pub mod identifiers;

/// Realtime protocol message types.
pub mod protocol;

/// WebSocket transport layer.
///
/// Capability traits plus the tokio-tungstenite implementation.
pub mod transport;

#[cfg(test)]
mod testing;

// ============================================================================
// Re-exports
// ============================================================================

// Client types
pub use client::{ClientBuilder, ClientConfig, EventHandler, RealtimeClient, WaitStatus};

// Completion types
pub use completion::{CompletionClient, ContentPart};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{EventId, ItemId, ResponseId};

// Protocol types
pub use protocol::{BetaFields, ErrorDetail, Event, Item, Session, TtsCloned, event_type};

// Transport types
pub use transport::{Dialer, Transport, WsDialer};
