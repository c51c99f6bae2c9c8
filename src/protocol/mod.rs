//! Realtime protocol message types.
//!
//! One JSON [`Event`] per WebSocket text frame, in both directions.
//!
//! # Protocol Overview
//!
//! | Message | Direction | Purpose |
//! |---------|-----------|---------|
//! | client events | Local → Remote | Session config, audio/video input, response requests |
//! | server events | Remote → Local | Session acks, response deltas, errors |
//! | synthesized events | Batch path → Local | `response.*` events built from a completion stream |
//!
//! # Event Naming
//!
//! Event types follow `resource.action` format:
//!
//! - `session.update`
//! - `input_audio_buffer.append_video_frame`
//! - `response.text.delta`

// ============================================================================
// Submodules
// ============================================================================

/// Event message types.
pub mod event;

// ============================================================================
// Re-exports
// ============================================================================

pub use event::{BetaFields, ErrorDetail, Event, Item, Session, TtsCloned, event_type, now_millis};
