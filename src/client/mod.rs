//! Realtime session client.
//!
//! A [`RealtimeClient`] owns one WebSocket connection, a background receive
//! loop and a video frame buffer. Live events and events synthesized from
//! batched frames reach the same [`EventHandler`].
//!
//! # Module Structure
//!
//! | Module | Description |
//! |--------|-------------|
//! | `builder` | Configuration and validation |
//! | `core` | Client handle, instructions, handler registration |
//! | `connection` | Connect, disconnect, send, wait |
//! | `receiver` | Background receive loop |
//! | `frames` | Frame buffer |
//! | `video` | Frame submission and batch flush |
//!
//! # Example
//!
//! ```ignore
//! let client = RealtimeClient::builder()
//!     .url("wss://open.bigmodel.cn/api/paas/v4/realtime")
//!     .api_key(key)
//!     .on_event(|event| {
//!         if let Some(text) = &event.text {
//!             println!("{text}");
//!         }
//!         Ok(())
//!     })
//!     .build()?;
//!
//! client.connect().await?;
//! client.send_frame_by_video(Event::video_frame(jpeg)).await?;
//! client.flush_video_frames().await?;
//! client.wait().await;
//! ```

// ============================================================================
// Submodules
// ============================================================================

pub mod builder;
mod connection;
mod core;
mod frames;
mod receiver;
mod video;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::{ClientBuilder, ClientConfig};
pub use connection::WaitStatus;
pub use core::{EventHandler, RealtimeClient};
pub use frames::FrameBuffer;
