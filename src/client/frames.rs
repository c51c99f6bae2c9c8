//! Pending video frame buffer.

use std::mem;

use parking_lot::Mutex;

// ============================================================================
// FrameBuffer
// ============================================================================

/// Ordered queue of raw frame payloads.
///
/// Every frame pushed is returned by exactly one [`drain`](Self::drain),
/// in push order.
#[derive(Debug, Default)]
pub struct FrameBuffer {
    frames: Mutex<Vec<Vec<u8>>>,
}

impl FrameBuffer {
    /// Creates an empty buffer.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a frame and returns the length after the append.
    pub fn push(&self, frame: Vec<u8>) -> usize {
        let mut frames = self.frames.lock();
        frames.push(frame);
        frames.len()
    }

    /// Removes and returns every buffered frame.
    #[must_use]
    pub fn drain(&self) -> Vec<Vec<u8>> {
        mem::take(&mut *self.frames.lock())
    }

    /// Returns the number of buffered frames.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.lock().len()
    }

    /// Returns `true` if no frames are buffered.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.lock().is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================
