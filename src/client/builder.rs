//! Builder pattern for client configuration.
//!
//! Provides a fluent API for configuring and creating [`RealtimeClient`]
//! instances. All configuration is explicit; nothing is read from the
//! environment unless [`ClientBuilder::from_env`] is used.
//!
//! # Example
//!
//! ```no_run
//! use glm_realtime::RealtimeClient;
//!
//! # fn example() -> glm_realtime::Result<()> {
//! let client = RealtimeClient::builder()
//!     .url("wss://open.bigmodel.cn/api/paas/v4/realtime")
//!     .api_key("your-api-key")
//!     .on_event(|event| {
//!         println!("{}", event.event_type);
//!         Ok(())
//!     })
//!     .build()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::env;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use url::Url;

use crate::error::{Error, Result};
use crate::protocol::Event;
use crate::transport::{Dialer, WsDialer};

use super::core::{EventHandler, RealtimeClient};

// ============================================================================
// Constants
// ============================================================================

/// Prompt used when no instructions are configured.
pub const DEFAULT_INSTRUCTIONS: &str = "请描述这个视频的内容";

/// Frames buffered before an automatic flush.
pub const DEFAULT_FRAME_THRESHOLD: usize = 10;

/// Streaming chat completion endpoint.
pub const DEFAULT_COMPLETION_ENDPOINT: &str = "https://open.bigmodel.cn/api/paas/v4/chat/completions";

/// Vision-capable model used for batched frames.
pub const DEFAULT_COMPLETION_MODEL: &str = "glm-4.5v";

/// Per-read deadline in the receive loop.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(15);

/// Upper bound for `wait`.
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for one batch completion round trip.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Environment variable holding the realtime endpoint.
pub const ENV_URL: &str = "ZHIPU_REALTIME_URL";

/// Environment variable holding the API key.
pub const ENV_API_KEY: &str = "ZHIPU_API_KEY";

// ============================================================================
// ClientConfig
// ============================================================================

/// Validated client configuration.
#[derive(Clone)]
pub struct ClientConfig {
    /// Realtime WebSocket endpoint.
    pub url: Url,
    /// Bearer credential for the handshake and batch requests.
    pub api_key: Option<String>,
    /// Initial instructions.
    pub instructions: String,
    /// Buffered frame count that triggers a flush.
    pub frame_threshold: usize,
    /// Batch completion endpoint.
    pub completion_endpoint: Url,
    /// Batch completion model.
    pub completion_model: String,
    /// Per-read deadline; a read that exceeds it ends the receive loop.
    pub read_timeout: Duration,
    /// Upper bound for `wait`.
    pub wait_timeout: Duration,
    /// Timeout for one batch completion round trip.
    pub request_timeout: Duration,
    /// Hard cap on a receive loop's lifetime, measured from its start.
    pub session_limit: Option<Duration>,
    /// Whether flushes run one at a time.
    pub serialize_flushes: bool,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("url", &self.url.as_str())
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("instructions", &self.instructions)
            .field("frame_threshold", &self.frame_threshold)
            .field("completion_endpoint", &self.completion_endpoint.as_str())
            .field("completion_model", &self.completion_model)
            .field("read_timeout", &self.read_timeout)
            .field("wait_timeout", &self.wait_timeout)
            .field("request_timeout", &self.request_timeout)
            .field("session_limit", &self.session_limit)
            .field("serialize_flushes", &self.serialize_flushes)
            .finish()
    }
}

// ============================================================================
// ClientBuilder
// ============================================================================

/// Builder for configuring a [`RealtimeClient`].
///
/// Use [`RealtimeClient::builder()`] to create a new builder.
#[derive(Clone)]
pub struct ClientBuilder {
    url: Option<String>,
    api_key: Option<String>,
    instructions: Option<String>,
    frame_threshold: usize,
    completion_endpoint: String,
    completion_model: String,
    read_timeout: Duration,
    wait_timeout: Duration,
    request_timeout: Duration,
    session_limit: Option<Duration>,
    serialize_flushes: bool,
    handler: Option<EventHandler>,
    dialer: Option<Arc<dyn Dialer>>,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self {
            url: None,
            api_key: None,
            instructions: None,
            frame_threshold: DEFAULT_FRAME_THRESHOLD,
            completion_endpoint: DEFAULT_COMPLETION_ENDPOINT.to_string(),
            completion_model: DEFAULT_COMPLETION_MODEL.to_string(),
            read_timeout: DEFAULT_READ_TIMEOUT,
            wait_timeout: DEFAULT_WAIT_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            session_limit: None,
            serialize_flushes: false,
            handler: None,
            dialer: None,
        }
    }
}

impl fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("url", &self.url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("frame_threshold", &self.frame_threshold)
            .field("has_handler", &self.handler.is_some())
            .field("has_dialer", &self.dialer.is_some())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// ClientBuilder Implementation
// ============================================================================

impl ClientBuilder {
    /// Creates a new builder with default settings and no endpoint.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder pre-filled from `ZHIPU_REALTIME_URL` and
    /// `ZHIPU_API_KEY`. Unset variables are left unset.
    #[must_use]
    pub fn from_env() -> Self {
        let mut builder = Self::new();
        if let Ok(url) = env::var(ENV_URL) {
            builder.url = Some(url);
        }
        if let Ok(key) = env::var(ENV_API_KEY) {
            builder.api_key = Some(key);
        }
        builder
    }

    /// Sets the realtime WebSocket endpoint (`ws://` or `wss://`).
    #[inline]
    #[must_use]
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Sets the bearer credential.
    #[inline]
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the initial instructions used as the batch prompt.
    #[inline]
    #[must_use]
    pub fn instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    /// Sets how many buffered frames trigger an automatic flush.
    #[inline]
    #[must_use]
    pub fn frame_threshold(mut self, threshold: usize) -> Self {
        self.frame_threshold = threshold;
        self
    }

    /// Sets the batch completion endpoint.
    #[inline]
    #[must_use]
    pub fn completion_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.completion_endpoint = endpoint.into();
        self
    }

    /// Sets the batch completion model.
    #[inline]
    #[must_use]
    pub fn completion_model(mut self, model: impl Into<String>) -> Self {
        self.completion_model = model.into();
        self
    }

    /// Sets the per-read deadline of the receive loop.
    #[inline]
    #[must_use]
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Sets how long `wait` blocks at most.
    #[inline]
    #[must_use]
    pub fn wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = timeout;
        self
    }

    /// Sets the batch request timeout.
    #[inline]
    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Caps every receive loop at `limit` from its start, even while
    /// messages keep arriving.
    #[inline]
    #[must_use]
    pub fn session_limit(mut self, limit: Duration) -> Self {
        self.session_limit = Some(limit);
        self
    }

    /// Runs at most one flush at a time when `true`.
    #[inline]
    #[must_use]
    pub fn serialize_flushes(mut self, serialize: bool) -> Self {
        self.serialize_flushes = serialize;
        self
    }

    /// Registers the event handler.
    ///
    /// The handler runs for live and synthesized events. An error returned
    /// for a live event disconnects the client.
    #[must_use]
    pub fn on_event<F>(mut self, handler: F) -> Self
    where
        F: Fn(&Event) -> Result<()> + Send + Sync + 'static,
    {
        self.handler = Some(Arc::new(handler));
        self
    }

    /// Replaces the transport dialer. Defaults to [`WsDialer`].
    #[inline]
    #[must_use]
    pub fn dialer(mut self, dialer: Arc<dyn Dialer>) -> Self {
        self.dialer = Some(dialer);
        self
    }

    /// Builds the client with validation.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the URL is missing or not `ws`/`wss`
    /// - [`Error::Config`] if the completion endpoint is not `http`/`https`
    /// - [`Error::Config`] if the threshold or a timeout is zero
    /// - [`Error::Http`] if the HTTP client cannot be built
    pub fn build(self) -> Result<RealtimeClient> {
        let config = self.validate()?;
        let dialer = self.dialer.unwrap_or_else(|| Arc::new(WsDialer));

        RealtimeClient::from_parts(config, dialer, self.handler)
    }
}

// ============================================================================
// Validation
// ============================================================================

impl ClientBuilder {
    /// Validates the builder into a [`ClientConfig`].
    fn validate(&self) -> Result<ClientConfig> {
        Ok(ClientConfig {
            url: self.validate_url()?,
            api_key: self.api_key.clone().filter(|k| !k.is_empty()),
            instructions: self
                .instructions
                .clone()
                .filter(|i| !i.is_empty())
                .unwrap_or_else(|| DEFAULT_INSTRUCTIONS.to_string()),
            frame_threshold: self.validate_threshold()?,
            completion_endpoint: self.validate_completion_endpoint()?,
            completion_model: self.completion_model.clone(),
            read_timeout: non_zero("read_timeout", self.read_timeout)?,
            wait_timeout: non_zero("wait_timeout", self.wait_timeout)?,
            request_timeout: non_zero("request_timeout", self.request_timeout)?,
            session_limit: self.session_limit,
            serialize_flushes: self.serialize_flushes,
        })
    }

    fn validate_url(&self) -> Result<Url> {
        let raw = self.url.as_deref().ok_or_else(|| {
            Error::config(format!(
                "Realtime URL is required. Use .url() or set {ENV_URL}.\n\
                 Example: RealtimeClient::builder().url(\"wss://host/realtime\")"
            ))
        })?;

        let url = Url::parse(raw)?;
        match url.scheme() {
            "ws" | "wss" => Ok(url),
            scheme => Err(Error::config(format!(
                "Realtime URL must use ws:// or wss://, got {scheme}://"
            ))),
        }
    }

    fn validate_completion_endpoint(&self) -> Result<Url> {
        let url = Url::parse(&self.completion_endpoint)?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            scheme => Err(Error::config(format!(
                "Completion endpoint must use http:// or https://, got {scheme}://"
            ))),
        }
    }

    fn validate_threshold(&self) -> Result<usize> {
        if self.frame_threshold == 0 {
            return Err(Error::config("frame_threshold must be at least 1"));
        }
        Ok(self.frame_threshold)
    }
}

fn non_zero(name: &str, value: Duration) -> Result<Duration> {
    if value.is_zero() {
        return Err(Error::config(format!("{name} must be greater than zero")));
    }
    Ok(value)
}

// ============================================================================
// Tests
// ============================================================================
