//! In-process test doubles.
//!
//! | Type | Stands in for |
//! |------|---------------|
//! | [`MockDialer`] / [`MockTransport`] | The realtime WebSocket endpoint |
//! | [`SseServer`] | The streaming completion endpoint |

// ============================================================================
// Imports
// ============================================================================

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Mutex as AsyncMutex, mpsc, watch};
use url::Url;

use crate::error::{Error, Result};
use crate::protocol::Event;
use crate::transport::{Dialer, Transport};

// ============================================================================
// MockTransport
// ============================================================================

/// Scripted transport. Inbound messages are queued with [`push`](Self::push);
/// outbound messages are recorded.
pub struct MockTransport {
    inbound_tx: mpsc::UnboundedSender<String>,
    inbound_rx: AsyncMutex<mpsc::UnboundedReceiver<String>>,
    sent: Mutex<Vec<String>>,
    closes: AtomicUsize,
    closed: watch::Sender<bool>,
    fail_writes: AtomicBool,
}

impl MockTransport {
    pub fn new() -> Self {
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        Self {
            inbound_tx,
            inbound_rx: AsyncMutex::new(inbound_rx),
            sent: Mutex::new(Vec::new()),
            closes: AtomicUsize::new(0),
            closed: watch::Sender::new(false),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Queues a raw inbound message.
    pub fn push(&self, text: impl Into<String>) {
        let _ = self.inbound_tx.send(text.into());
    }

    /// Queues an encoded inbound event.
    pub fn push_event(&self, event: &Event) {
        self.push(event.to_json().expect("event encodes"));
    }

    /// Outbound messages in write order.
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().clone()
    }

    /// Outbound messages decoded as events.
    pub fn sent_events(&self) -> Vec<Event> {
        self.sent()
            .iter()
            .map(|text| Event::from_json(text).expect("sent event decodes"))
            .collect()
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    /// Makes every following write fail.
    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn read_text(&self) -> Result<String> {
        let mut closed = self.closed.subscribe();
        let mut inbound = self.inbound_rx.lock().await;

        tokio::select! {
            biased;
            _ = closed.wait_for(|c| *c) => Err(Error::ConnectionClosed),
            message = inbound.recv() => message.ok_or(Error::ConnectionClosed),
        }
    }

    async fn write_text(&self, text: String) -> Result<()> {
        if self.is_closed() || self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::ConnectionClosed);
        }
        self.sent.lock().push(text);
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        self.closed.send_replace(true);
        Ok(())
    }
}

// ============================================================================
// MockDialer
// ============================================================================

/// Dialer handing out a fresh [`MockTransport`] per dial.
#[derive(Default)]
pub struct MockDialer {
    dials: AtomicUsize,
    fail: AtomicBool,
    api_keys: Mutex<Vec<Option<String>>>,
    transports: Mutex<Vec<Arc<MockTransport>>>,
}

impl MockDialer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Makes every following dial fail.
    pub fn fail(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    pub fn dial_count(&self) -> usize {
        self.dials.load(Ordering::SeqCst)
    }

    /// Credentials passed to each dial.
    pub fn api_keys(&self) -> Vec<Option<String>> {
        self.api_keys.lock().clone()
    }

    /// The most recently dialed transport.
    pub fn transport(&self) -> Arc<MockTransport> {
        self.transports
            .lock()
            .last()
            .cloned()
            .expect("no transport dialed yet")
    }
}

#[async_trait]
impl Dialer for MockDialer {
    async fn dial(&self, _url: &Url, api_key: Option<&str>) -> Result<Arc<dyn Transport>> {
        self.dials.fetch_add(1, Ordering::SeqCst);
        self.api_keys.lock().push(api_key.map(str::to_owned));

        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::connection("dial refused"));
        }

        let transport = Arc::new(MockTransport::new());
        self.transports.lock().push(Arc::clone(&transport));
        Ok(transport)
    }
}

// ============================================================================
// SseServer
// ============================================================================

/// One request received by [`SseServer`].
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// Request line and headers.
    pub head: String,
    /// JSON body.
    pub body: Value,
}

impl RecordedRequest {
    /// Looks up a header value, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.head.lines().skip(1).find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.trim().eq_ignore_ascii_case(name).then(|| value.trim())
        })
    }
}

/// Minimal HTTP/1.1 server answering every request with a fixed status
/// and body.
pub struct SseServer {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl SseServer {
    pub async fn start(status: u16, body: impl Into<String>) -> Self {
        Self::spawn(status, body.into(), 0).await
    }

    /// Like [`start`](Self::start), but the declared `Content-Length` runs
    /// past the body, so reading the body fails on the client.
    pub async fn start_truncated(status: u16, body: impl Into<String>) -> Self {
        Self::spawn(status, body.into(), 64).await
    }

    async fn spawn(status: u16, body: String, missing: usize) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let requests = Arc::new(Mutex::new(Vec::new()));

        let recorded = Arc::clone(&requests);
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let recorded = Arc::clone(&recorded);
                let body = body.clone();
                tokio::spawn(async move {
                    let _ = serve(stream, status, &body, missing, &recorded).await;
                });
            }
        });

        Self { addr, requests }
    }

    pub fn endpoint(&self) -> String {
        format!("http://{}/api/paas/v4/chat/completions", self.addr)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }
}

async fn serve(
    mut stream: TcpStream,
    status: u16,
    body: &str,
    missing: usize,
    recorded: &Mutex<Vec<RecordedRequest>>,
) -> Option<()> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let head_end = loop {
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos;
        }
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).into_owned();
    let content_length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    let body_start = head_end + 4;
    while buf.len() < body_start + content_length {
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let end = buf.len().min(body_start + content_length);
    let request_body = serde_json::from_slice(&buf[body_start..end]).unwrap_or(Value::Null);

    let response = format!(
        "HTTP/1.1 {status} Status\r\n\
         Content-Type: text/event-stream\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\r\n{body}",
        body.len() + missing
    );

    // Visible to the test before the client sees the response.
    recorded.lock().push(RecordedRequest {
        head,
        body: request_body,
    });
    stream.write_all(response.as_bytes()).await.ok()?;
    let _ = stream.shutdown().await;

    Some(())
}
