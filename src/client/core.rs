//! Core client handle and accessors.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::{Mutex as AsyncMutex, RwLock as AsyncRwLock, watch};
use tracing::{info, warn};

use crate::completion::CompletionClient;
use crate::error::Result;
use crate::protocol::Event;
use crate::transport::{Dialer, Transport};

use super::builder::{ClientBuilder, ClientConfig, DEFAULT_INSTRUCTIONS};
use super::frames::FrameBuffer;

// ============================================================================
// Types
// ============================================================================

/// Callback invoked for every live and synthesized event.
///
/// May run concurrently from the receive loop and from flushing callers.
pub type EventHandler = Arc<dyn Fn(&Event) -> Result<()> + Send + Sync>;

/// Connection state guarded by one async lock.
#[derive(Default)]
pub(crate) struct ConnectionState {
    /// Open transport; `Some` exactly while connected.
    pub transport: Option<Arc<dyn Transport>>,
    /// Incremented on every successful connect.
    pub generation: u64,
    /// Completion signal of the most recent receive loop.
    pub loop_done: Option<watch::Receiver<bool>>,
}

/// Internal shared state for a client.
pub(crate) struct ClientInner {
    /// Validated configuration.
    pub config: ClientConfig,
    /// Opens transports on connect.
    pub dialer: Arc<dyn Dialer>,
    /// Batch completion client.
    pub completion: CompletionClient,
    /// Connection lock domain.
    pub state: AsyncRwLock<ConnectionState>,
    /// Registered callback.
    pub handler: RwLock<Option<EventHandler>>,
    /// Prompt for the next flush.
    pub instructions: RwLock<String>,
    /// Frame buffer lock domain.
    pub frames: FrameBuffer,
    /// Held across drain-and-dispatch when flushes are serialized.
    pub flush_gate: Option<AsyncMutex<()>>,
}

// ============================================================================
// RealtimeClient
// ============================================================================

/// A handle to a realtime session.
///
/// Cloning is cheap; all clones share one connection, frame buffer and
/// handler.
#[derive(Clone)]
pub struct RealtimeClient {
    pub(crate) inner: Arc<ClientInner>,
}

impl fmt::Debug for RealtimeClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RealtimeClient")
            .field("url", &self.inner.config.url.as_str())
            .field("buffered_frames", &self.inner.frames.len())
            .finish_non_exhaustive()
    }
}

impl RealtimeClient {
    /// Creates a configuration builder.
    #[inline]
    #[must_use]
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Assembles a disconnected client from validated parts.
    pub(crate) fn from_parts(
        config: ClientConfig,
        dialer: Arc<dyn Dialer>,
        handler: Option<EventHandler>,
    ) -> Result<Self> {
        let completion = CompletionClient::new(
            config.completion_endpoint.clone(),
            config.completion_model.clone(),
            config.api_key.clone(),
            config.request_timeout,
        )?;

        let flush_gate = config.serialize_flushes.then(|| AsyncMutex::new(()));
        let instructions = RwLock::new(config.instructions.clone());

        Ok(Self {
            inner: Arc::new(ClientInner {
                config,
                dialer,
                completion,
                state: AsyncRwLock::new(ConnectionState::default()),
                handler: RwLock::new(handler),
                instructions,
                frames: FrameBuffer::new(),
                flush_gate,
            }),
        })
    }
}

// ============================================================================
// Accessors
// ============================================================================

impl RealtimeClient {
    /// Returns the configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Returns the number of frames waiting for the next flush.
    #[inline]
    #[must_use]
    pub fn buffered_frames(&self) -> usize {
        self.inner.frames.len()
    }

    /// Returns the prompt the next flush will use.
    #[must_use]
    pub fn instructions(&self) -> String {
        let current = self.inner.instructions.read();
        if current.is_empty() {
            DEFAULT_INSTRUCTIONS.to_string()
        } else {
            current.clone()
        }
    }

    /// Overwrites the instructions. Takes effect on the next flush.
    pub fn set_instructions(&self, instructions: impl Into<String>) {
        let instructions = instructions.into();
        info!(len = instructions.len(), "Instructions updated");
        *self.inner.instructions.write() = instructions;
    }
}

// ============================================================================
// Event Handler
// ============================================================================

impl RealtimeClient {
    /// Registers or replaces the event handler.
    pub fn set_event_handler<F>(&self, handler: F)
    where
        F: Fn(&Event) -> Result<()> + Send + Sync + 'static,
    {
        *self.inner.handler.write() = Some(Arc::new(handler));
    }

    /// Removes the event handler. Live events are then read and dropped.
    pub fn clear_event_handler(&self) {
        *self.inner.handler.write() = None;
    }

    /// Returns the current handler, if any.
    pub(crate) fn event_handler(&self) -> Option<EventHandler> {
        self.inner.handler.read().clone()
    }

    /// Delivers a synthesized event. Handler errors are logged only.
    pub(crate) fn deliver_synthesized(&self, event: &Event) {
        let Some(handler) = self.event_handler() else {
            return;
        };

        if let Err(e) = handler(event) {
            warn!(
                event_type = %event.event_type,
                error = %e,
                "Handler failed on synthesized event"
            );
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
