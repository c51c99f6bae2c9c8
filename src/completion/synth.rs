//! Synthesized `response.*` events.
//!
//! A [`ResponseSynthesizer`] owns one response id and one item id, so every
//! event it builds correlates exactly like a live server response would.

use crate::identifiers::{EventId, ItemId, ResponseId};
use crate::protocol::{Event, event_type, now_millis};

// ============================================================================
// ResponseSynthesizer
// ============================================================================

/// Builds the event sequence for one batch response.
///
/// Sequence: `response.created`, `response.output_item.added`,
/// zero or more `response.text.delta`, `response.text.done`, `response.done`.
#[derive(Debug, Clone)]
pub struct ResponseSynthesizer {
    response_id: ResponseId,
    item_id: ItemId,
}

impl Default for ResponseSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseSynthesizer {
    /// Creates a synthesizer with fresh correlation ids.
    #[must_use]
    pub fn new() -> Self {
        Self {
            response_id: ResponseId::generate(),
            item_id: ItemId::generate(),
        }
    }

    /// Returns the response id shared by all events.
    #[inline]
    #[must_use]
    pub fn response_id(&self) -> &ResponseId {
        &self.response_id
    }

    /// Returns the item id shared by item-level events.
    #[inline]
    #[must_use]
    pub fn item_id(&self) -> &ItemId {
        &self.item_id
    }

    /// `response.created`
    #[must_use]
    pub fn created(&self) -> Event {
        self.response_event(event_type::RESPONSE_CREATED)
    }

    /// `response.output_item.added`
    #[must_use]
    pub fn output_item_added(&self) -> Event {
        self.item_event(event_type::RESPONSE_OUTPUT_ITEM_ADDED)
    }

    /// `response.text.delta` carrying one increment.
    #[must_use]
    pub fn text_delta(&self, delta: &str) -> Event {
        Event {
            delta: delta.to_owned(),
            ..self.item_event(event_type::RESPONSE_TEXT_DELTA)
        }
    }

    /// `response.text.done` carrying the full text.
    #[must_use]
    pub fn text_done(&self, text: &str) -> Event {
        Event {
            text: Some(text.to_owned()),
            ..self.item_event(event_type::RESPONSE_TEXT_DONE)
        }
    }

    /// `response.done`
    #[must_use]
    pub fn done(&self) -> Event {
        self.response_event(event_type::RESPONSE_DONE)
    }

    fn response_event(&self, kind: &str) -> Event {
        Event {
            event_id: EventId::generate().into(),
            client_timestamp: now_millis(),
            response_id: self.response_id.to_string(),
            ..Event::new(kind)
        }
    }

    fn item_event(&self, kind: &str) -> Event {
        Event {
            item_id: self.item_id.to_string(),
            ..self.response_event(kind)
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
