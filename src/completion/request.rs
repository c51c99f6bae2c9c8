//! Chat completion request body.
//!
//! # Format
//!
//! ```json
//! {
//!   "model": "glm-4.5v",
//!   "messages": [{
//!     "role": "user",
//!     "content": [
//!       { "type": "text", "text": "..." },
//!       { "type": "image_url", "image_url": { "url": "data:image/jpeg;base64,..." } }
//!     ]
//!   }],
//!   "stream": true
//! }
//! ```

// ============================================================================
// Imports
// ============================================================================

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;

// ============================================================================
// ContentPart
// ============================================================================

/// One part of a multi-part user message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    /// Plain text prompt.
    Text {
        /// Prompt text.
        text: String,
    },
    /// Image referenced by URL.
    ImageUrl {
        /// Image location.
        image_url: ImageUrl,
    },
}

/// Image location, usually a `data:` URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageUrl {
    /// URL of the image.
    pub url: String,
}

impl ContentPart {
    /// Creates a text part.
    #[inline]
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Creates an image part embedding a JPEG frame as a base64 data URL.
    #[must_use]
    pub fn jpeg(frame: &[u8]) -> Self {
        Self::ImageUrl {
            image_url: ImageUrl {
                url: format!("data:image/jpeg;base64,{}", STANDARD.encode(frame)),
            },
        }
    }
}

/// Builds the content array for a batch of frames.
///
/// The prompt comes first, then one image part per frame in the given order.
#[must_use]
pub fn frame_content(prompt: &str, frames: &[Vec<u8>]) -> Vec<ContentPart> {
    let mut content = Vec::with_capacity(frames.len() + 1);
    content.push(ContentPart::text(prompt));
    content.extend(frames.iter().map(|frame| ContentPart::jpeg(frame)));
    content
}

// ============================================================================
// CompletionRequest
// ============================================================================

/// A chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    /// Author role.
    pub role: String,
    /// Message parts.
    pub content: Vec<ContentPart>,
}

impl ChatMessage {
    /// Creates a user message.
    #[inline]
    #[must_use]
    pub fn user(content: Vec<ContentPart>) -> Self {
        Self {
            role: "user".to_string(),
            content,
        }
    }
}

/// Body of a chat completion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionRequest {
    /// Model name.
    pub model: String,
    /// Conversation.
    pub messages: Vec<ChatMessage>,
    /// Whether the server should stream SSE chunks.
    pub stream: bool,
}

impl CompletionRequest {
    /// Creates a streaming request with a single user message.
    #[must_use]
    pub fn streaming(model: impl Into<String>, content: Vec<ContentPart>) -> Self {
        Self {
            model: model.into(),
            messages: vec![ChatMessage::user(content)],
            stream: true,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
