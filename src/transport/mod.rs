//! WebSocket transport layer.
//!
//! The client only ever talks to the remote end through the [`Transport`]
//! and [`Dialer`] capabilities defined here, so the connection engine can
//! run against the real WebSocket implementation or an in-memory one.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐                              ┌─────────────────┐
//! │  RealtimeClient  │         WebSocket            │  Realtime       │
//! │                  │◄────────────────────────────►│  Server         │
//! │  Dialer          │   Authorization: Bearer ...  │                 │
//! │  → Transport     │   one JSON event per frame   │                 │
//! └──────────────────┘                              └─────────────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. `Dialer::dial` - Handshake with optional bearer credential
//! 2. `Transport::read_text` / `Transport::write_text` - Independent, concurrent
//! 3. `Transport::close` - Wakes any pending read with [`Error::ConnectionClosed`]
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `connection` | tokio-tungstenite dialer and transport |

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

#[cfg(doc)]
use crate::error::Error;
use crate::error::Result;

// ============================================================================
// Submodules
// ============================================================================

/// WebSocket dialer and transport.
pub mod connection;

// ============================================================================
// Re-exports
// ============================================================================

pub use connection::{WsDialer, WsTransport};

// ============================================================================
// Capabilities
// ============================================================================

/// A live, full-duplex, message-oriented connection.
///
/// Reads and writes may run concurrently from different tasks.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Reads the next text message.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionClosed`] once the transport is closed
    /// - [`Error::InvalidEvent`] if a message is not valid UTF-8
    /// - [`Error::WebSocket`] on protocol or I/O failure
    async fn read_text(&self) -> Result<String>;

    /// Writes one text message.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionClosed`] once the transport is closed
    /// - [`Error::WebSocket`] on protocol or I/O failure
    async fn write_text(&self, text: String) -> Result<()>;

    /// Closes the transport. Closing twice is a no-op.
    async fn close(&self) -> Result<()>;
}

/// Opens [`Transport`]s.
#[async_trait]
pub trait Dialer: Send + Sync {
    /// Performs the handshake against `url`.
    ///
    /// `api_key` is attached as `Authorization: Bearer <key>` when present.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`] if the handshake fails.
    async fn dial(&self, url: &Url, api_key: Option<&str>) -> Result<Arc<dyn Transport>>;
}
