//! Video frame batching.
//!
//! Frames are buffered locally instead of going over the WebSocket. Once
//! the buffer reaches the configured threshold, the appending caller
//! flushes it as one streaming completion request and the response is
//! replayed to the event handler as `response.*` events.

use std::mem;

use tracing::{debug, info, trace};

use crate::completion::frame_content;
use crate::error::{Error, Result};
use crate::protocol::{Event, event_type};

use super::core::RealtimeClient;

// ============================================================================
// RealtimeClient - Video
// ============================================================================

impl RealtimeClient {
    /// Buffers one video frame, flushing when the threshold is reached.
    ///
    /// The flush, if any, runs on the caller's task and its result is
    /// returned.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidEvent`] if the event is not a video-frame append or
    ///   carries no frame; nothing is buffered
    /// - any flush error, see [`flush_video_frames`](Self::flush_video_frames)
    pub async fn send_frame_by_video(&self, mut event: Event) -> Result<()> {
        if !event.is(event_type::INPUT_VIDEO_FRAME_APPEND) {
            return Err(Error::invalid_event(format!(
                "expected {}, got {}",
                event_type::INPUT_VIDEO_FRAME_APPEND,
                event.event_type
            )));
        }
        if event.video_frame.is_empty() {
            return Err(Error::invalid_event("video frame is empty"));
        }

        event.stamp_client_timestamp();

        let bytes = event.video_frame.len();
        let count = self.inner.frames.push(mem::take(&mut event.video_frame));
        debug!(frames = count, bytes, "Video frame collected");

        let threshold = self.inner.config.frame_threshold;
        if count >= threshold {
            info!(frames = count, threshold, "Frame threshold reached, flushing");
            return self.flush_video_frames().await;
        }

        Ok(())
    }

    /// Sends every buffered frame as one batch request.
    ///
    /// The buffer is empty afterwards whatever the outcome; frames of a
    /// failed batch are not requeued. An empty buffer is a no-op.
    ///
    /// # Errors
    ///
    /// - [`Error::Http`] if the request cannot be sent
    /// - [`Error::Api`] if the endpoint answers with a non-200 status
    pub async fn flush_video_frames(&self) -> Result<()> {
        let _gate = match &self.inner.flush_gate {
            Some(gate) => Some(gate.lock().await),
            None => None,
        };

        let frames = self.inner.frames.drain();
        if frames.is_empty() {
            debug!("No frames to flush");
            return Ok(());
        }

        info!(frames = frames.len(), "Flushing video frames");
        for (index, frame) in frames.iter().enumerate() {
            trace!(index, bytes = frame.len(), "Batch frame");
        }

        let content = frame_content(&self.instructions(), &frames);
        let deliver = |event: Event| self.deliver_synthesized(&event);

        let text = self.inner.completion.stream_content(content, &deliver).await?;
        debug!(len = text.len(), "Batch response complete");

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
