//! Type-safe correlation identifiers.
//!
//! Synthesized events carry freshly generated identifiers so they correlate
//! the same way server-issued ones do. Each newtype wraps a prefixed UUID:
//!
//! | Type | Format |
//! |------|--------|
//! | [`EventId`] | `event_<uuid>` |
//! | [`ResponseId`] | `resp_<uuid>` |
//! | [`ItemId`] | `item_<uuid>` |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Macro
// ============================================================================

macro_rules! prefixed_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Generates a new random identifier.
            #[inline]
            #[must_use]
            pub fn generate() -> Self {
                Self(format!(concat!($prefix, "_{}"), Uuid::new_v4().simple()))
            }

            /// Returns the identifier as a string slice.
            #[inline]
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<$name> for String {
            #[inline]
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

// ============================================================================
// Identifiers
// ============================================================================

prefixed_id!(
    /// Identifier of a single event.
    EventId,
    "event"
);

prefixed_id!(
    /// Identifier shared by every event of one response.
    ResponseId,
    "resp"
);

prefixed_id!(
    /// Identifier of a conversation item within a response.
    ItemId,
    "item"
);

// ============================================================================
// Tests
// ============================================================================
