//! Server-sent-event line handling.
//!
//! The completion stream is line oriented. Only `data: ` lines matter:
//! `data: [DONE]` ends the stream and every other payload is a JSON chunk.
//! Anything else, including chunks that fail to parse, is skipped.

use serde_json::Value;

// ============================================================================
// SseLine
// ============================================================================

/// Classification of one stream line.
#[derive(Debug, Clone, PartialEq)]
pub enum SseLine {
    /// A parsed JSON chunk.
    Data(Value),
    /// The `[DONE]` terminator.
    Done,
    /// Comment, blank, non-data or malformed line.
    Skip,
}

impl SseLine {
    /// Classifies a raw line. Surrounding whitespace is ignored.
    #[must_use]
    pub fn parse(line: &str) -> Self {
        let Some(data) = line.trim().strip_prefix("data: ") else {
            return Self::Skip;
        };

        if data == "[DONE]" {
            return Self::Done;
        }

        serde_json::from_str(data).map_or(Self::Skip, Self::Data)
    }
}

/// Returns the non-empty text increment at `choices[0].delta.content`.
#[must_use]
pub fn delta_content(chunk: &Value) -> Option<&str> {
    chunk
        .get("choices")?
        .get(0)?
        .get("delta")?
        .get("content")?
        .as_str()
        .filter(|s| !s.is_empty())
}

// ============================================================================
// LineBuffer
// ============================================================================

/// Reassembles lines from arbitrarily split byte chunks.
///
/// Splitting happens on raw bytes, so a multi-byte character cut across
/// two chunks is decoded intact.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    /// Creates an empty buffer.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a chunk and returns every line it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);

        let mut lines = Vec::new();
        let mut start = 0;
        while let Some(offset) = self.pending[start..].iter().position(|&b| b == b'\n') {
            let end = start + offset;
            lines.push(String::from_utf8_lossy(&self.pending[start..end]).into_owned());
            start = end + 1;
        }
        self.pending.drain(..start);

        lines
    }

    /// Returns the unterminated tail, if any.
    #[must_use]
    pub fn finish(self) -> Option<String> {
        if self.pending.is_empty() {
            None
        } else {
            Some(String::from_utf8_lossy(&self.pending).into_owned())
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
