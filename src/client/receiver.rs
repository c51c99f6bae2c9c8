//! Receive loop.
//!
//! One task per connection. It reads events off the transport it was
//! started with and hands them to the event handler in arrival order.
//!
//! # Termination
//!
//! | Cause | Disconnects |
//! |-------|-------------|
//! | Transport closed or replaced | no (already disconnected) |
//! | Read error or idle timeout | yes |
//! | Session limit reached | yes |
//! | Undecodable message | yes |
//! | Handler error | yes |

use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;
use tokio::time::{Instant, timeout};
use tracing::{debug, error, info, trace, warn};

use crate::error::Error;
use crate::protocol::{Event, event_type};
use crate::transport::Transport;

use super::core::RealtimeClient;

// ============================================================================
// Types
// ============================================================================

/// Reason the loop stopped.
enum LoopExit {
    Superseded,
    ReadFailed(Error),
    Idle(Error),
    SessionLimit,
    Decode(Error),
    Handler(Error),
}

impl fmt::Display for LoopExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Superseded => f.write_str("connection closed"),
            Self::ReadFailed(e) => write!(f, "read failed: {e}"),
            Self::Idle(e) => write!(f, "idle: {e}"),
            Self::SessionLimit => f.write_str("session limit reached"),
            Self::Decode(e) => write!(f, "undecodable message: {e}"),
            Self::Handler(e) => write!(f, "handler error: {e}"),
        }
    }
}

// ============================================================================
// Loop
// ============================================================================

/// Runs until the connection ends, then signals `done`.
pub(crate) async fn run(
    client: RealtimeClient,
    transport: Arc<dyn Transport>,
    generation: u64,
    done: watch::Sender<bool>,
) {
    debug!(generation, "Receive loop started");

    let exit = receive(&client, transport.as_ref(), generation).await;

    match &exit {
        LoopExit::Superseded => debug!(generation, "Receive loop finished: {exit}"),
        LoopExit::Handler(_) | LoopExit::Decode(_) => {
            error!(generation, "Receive loop terminated: {exit}");
        }
        _ => info!(generation, "Receive loop terminated: {exit}"),
    }

    if !matches!(exit, LoopExit::Superseded) {
        client.disconnect_generation(generation).await;
    }

    done.send_replace(true);
}

async fn receive(client: &RealtimeClient, transport: &dyn Transport, generation: u64) -> LoopExit {
    let config = client.config();
    let deadline = config.session_limit.map(|limit| Instant::now() + limit);

    loop {
        if !client.is_current(generation).await {
            return LoopExit::Superseded;
        }

        let mut read_window = config.read_timeout;
        if let Some(deadline) = deadline {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return LoopExit::SessionLimit;
            }
            read_window = read_window.min(remaining);
        }

        let text = match timeout(read_window, transport.read_text()).await {
            Ok(Ok(text)) => text,
            Ok(Err(e)) if e.is_validation_error() => return LoopExit::Decode(e),
            Ok(Err(e)) => {
                return if client.is_current(generation).await {
                    LoopExit::ReadFailed(e)
                } else {
                    LoopExit::Superseded
                };
            }
            Err(_) => {
                if deadline.is_some_and(|d| Instant::now() >= d) {
                    return LoopExit::SessionLimit;
                }
                let waited = u64::try_from(read_window.as_millis()).unwrap_or(u64::MAX);
                return LoopExit::Idle(Error::timeout("websocket read", waited));
            }
        };

        let event = match Event::from_json(&text) {
            Ok(event) => event,
            Err(e) => return LoopExit::Decode(e),
        };

        trace!(event_type = %event.event_type, "Event received");

        if event.is(event_type::SESSION_UPDATE)
            && let Some(instructions) = event.session_instructions()
        {
            client.set_instructions(instructions);
        }

        let Some(handler) = client.event_handler() else {
            trace!(event_type = %event.event_type, "No handler registered, dropping event");
            continue;
        };

        if let Err(e) = handler(&event) {
            warn!(event_type = %event.event_type, error = %e, "Handler rejected event");
            return LoopExit::Handler(e);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
