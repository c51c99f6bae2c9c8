//! Shared utilities for demos.
//!
//! Provides common functionality used across all demos:
//! - Command-line argument parsing
//! - Logging initialization
//! - Event file loading

#![allow(dead_code)]

// ============================================================================
// Imports
// ============================================================================

use std::fs;
use std::path::PathBuf;

use glm_realtime::{Event, Result};
use tracing_subscriber::EnvFilter;

// ============================================================================
// Types
// ============================================================================

/// Command-line arguments for demos.
#[derive(Debug, Clone)]
pub struct Args {
    pub debug: bool,
    pub input: Option<PathBuf>,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse() -> Self {
        let args: Vec<String> = std::env::args().skip(1).collect();
        Self {
            debug: args.iter().any(|a| a == "--debug"),
            input: args.iter().find(|a| !a.starts_with("--")).map(PathBuf::from),
        }
    }
}

// ============================================================================
// Functions
// ============================================================================

/// Initialize tracing/logging.
pub fn init_logging(debug: bool) {
    let filter = if debug {
        "glm_realtime=debug"
    } else {
        "glm_realtime=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();
}

/// Loads one event per line. Lines not starting with `{` are skipped.
pub fn load_events(path: &PathBuf) -> Result<Vec<Event>> {
    let text = fs::read_to_string(path)?;
    text.lines()
        .filter(|line| line.starts_with('{'))
        .map(Event::from_json)
        .collect()
}

/// Renders an event for printing with bulky payloads elided.
pub fn summarize(event: &Event) -> String {
    let mut event = event.clone();
    if !event.audio.is_empty() {
        event.audio = "<audio>".into();
    }
    if event.event_type.starts_with("response.audio.") && !event.delta.is_empty() {
        event.delta = "<audio>".into();
    }
    event.video_frame.clear();
    if let Some(cloned) = event
        .session
        .as_mut()
        .and_then(|s| s.beta_fields.as_mut())
        .and_then(|b| b.tts_cloned.as_mut())
    {
        cloned.audio = "<audio>".into();
    }
    event.to_json().unwrap_or_default()
}
