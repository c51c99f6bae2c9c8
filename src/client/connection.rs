//! Connection lifecycle: connect, disconnect, send, wait.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::error::{Error, Result};
use crate::protocol::Event;

use super::core::RealtimeClient;
use super::receiver;

// ============================================================================
// Types
// ============================================================================

/// Why [`RealtimeClient::wait`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitStatus {
    /// The receive loop has terminated.
    Exited,
    /// The wait timeout elapsed first; the loop keeps running.
    TimedOut,
    /// No receive loop was ever started.
    NotStarted,
}

// ============================================================================
// RealtimeClient - Connection
// ============================================================================

impl RealtimeClient {
    /// Opens the connection and starts the receive loop.
    ///
    /// Returns immediately if already connected.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`] if the handshake fails; the client
    /// stays disconnected and nothing is retried.
    pub async fn connect(&self) -> Result<()> {
        let mut state = self.inner.state.write().await;
        if state.transport.is_some() {
            debug!("Already connected");
            return Ok(());
        }

        let config = &self.inner.config;
        info!(url = %config.url, "Connecting");

        let transport = self
            .inner
            .dialer
            .dial(&config.url, config.api_key.as_deref())
            .await
            .inspect_err(|e| error!(url = %config.url, error = %e, "Dial failed"))?;

        state.generation += 1;
        let generation = state.generation;
        let (done_tx, done_rx) = watch::channel(false);

        state.transport = Some(Arc::clone(&transport));
        state.loop_done = Some(done_rx);

        tokio::spawn(receiver::run(self.clone(), transport, generation, done_tx));
        drop(state);

        info!(generation, "Connected");
        Ok(())
    }

    /// Closes the connection. No-op when not connected.
    ///
    /// Does not wait for the receive loop to exit.
    ///
    /// # Errors
    ///
    /// Returns the transport error if closing fails; the client is
    /// disconnected regardless.
    pub async fn disconnect(&self) -> Result<()> {
        let transport = self.inner.state.write().await.transport.take();

        let Some(transport) = transport else {
            debug!("Already disconnected");
            return Ok(());
        };

        info!("Disconnecting");
        transport
            .close()
            .await
            .inspect_err(|e| warn!(error = %e, "Error closing transport"))
    }

    /// Returns `true` while a transport is open.
    pub async fn is_connected(&self) -> bool {
        self.inner.state.read().await.transport.is_some()
    }

    /// Sends one event.
    ///
    /// The client timestamp is stamped if unset. A failed write leaves the
    /// client marked connected.
    ///
    /// # Errors
    ///
    /// - [`Error::NotConnected`] if not connected; nothing is written
    /// - [`Error::Json`] if the event cannot be encoded
    /// - the transport error if the write fails
    pub async fn send(&self, mut event: Event) -> Result<()> {
        let transport = self
            .inner
            .state
            .read()
            .await
            .transport
            .clone()
            .ok_or(Error::NotConnected)?;

        event.stamp_client_timestamp();
        let text = event.to_json()?;

        debug!(event_type = %event.event_type, "Sending event");

        transport.write_text(text).await.inspect_err(|e| {
            error!(event_type = %event.event_type, error = %e, "Send failed");
        })
    }

    /// Waits for the receive loop to exit, up to the configured wait
    /// timeout. A timeout does not stop the loop.
    pub async fn wait(&self) -> WaitStatus {
        let done = self.inner.state.read().await.loop_done.clone();

        let Some(mut done) = done else {
            debug!("No receive loop to wait for");
            return WaitStatus::NotStarted;
        };

        let limit = self.inner.config.wait_timeout;
        match timeout(limit, done.wait_for(|finished| *finished)).await {
            Ok(_) => {
                debug!("Receive loop exited");
                WaitStatus::Exited
            }
            Err(_) => {
                info!(timeout_ms = limit.as_millis() as u64, "Wait timed out");
                WaitStatus::TimedOut
            }
        }
    }
}

// ============================================================================
// Internal
// ============================================================================

impl RealtimeClient {
    /// Returns `true` while `generation`'s transport is still the open one.
    pub(crate) async fn is_current(&self, generation: u64) -> bool {
        let state = self.inner.state.read().await;
        state.transport.is_some() && state.generation == generation
    }

    /// Disconnects only if `generation` is still the open connection.
    pub(crate) async fn disconnect_generation(&self, generation: u64) {
        let transport = {
            let mut state = self.inner.state.write().await;
            if state.generation != generation {
                return;
            }
            state.transport.take()
        };

        if let Some(transport) = transport
            && let Err(e) = transport.close().await
        {
            warn!(generation, error = %e, "Error closing transport");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
