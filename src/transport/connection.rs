//! WebSocket dialer and transport.
//!
//! [`WsTransport`] splits the stream so a pending read never blocks a
//! write. Closing flips a watch flag that every pending read selects on,
//! so a read parked on a silent socket returns as soon as the transport
//! is closed locally.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{Mutex, watch};
use tokio_tungstenite::tungstenite::Error as WsError;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
use tokio_tungstenite::{WebSocketStream, connect_async};
use tracing::{debug, error, info, trace};
use url::Url;

use crate::error::{Error, Result};

use super::{Dialer, Transport};

// ============================================================================
// WsDialer
// ============================================================================

/// Dials WebSocket endpoints with tokio-tungstenite.
///
/// Supports `ws://` and `wss://` (native TLS).
#[derive(Debug, Default, Clone, Copy)]
pub struct WsDialer;

#[async_trait]
impl Dialer for WsDialer {
    async fn dial(&self, url: &Url, api_key: Option<&str>) -> Result<Arc<dyn Transport>> {
        let mut request = url.as_str().into_client_request()?;

        if let Some(key) = api_key.filter(|k| !k.is_empty()) {
            let value = HeaderValue::from_str(&format!("Bearer {key}"))
                .map_err(|e| Error::config(format!("API key is not a valid header value: {e}")))?;
            request.headers_mut().insert(AUTHORIZATION, value);
        }

        let (stream, response) = connect_async(request).await.map_err(|e| {
            error!(url = %url, error = %e, "WebSocket dial failed");
            Error::connection(format!("WebSocket dial to {url} failed: {e}"))
        })?;

        debug!(url = %url, status = %response.status(), "WebSocket handshake completed");

        Ok(Arc::new(WsTransport::new(stream)))
    }
}

// ============================================================================
// WsTransport
// ============================================================================

/// [`Transport`] over a tokio-tungstenite [`WebSocketStream`].
pub struct WsTransport<S> {
    /// Outbound half.
    writer: Mutex<SplitSink<WebSocketStream<S>, Message>>,
    /// Inbound half.
    reader: Mutex<SplitStream<WebSocketStream<S>>>,
    /// Set once by `close`.
    closed: watch::Sender<bool>,
}

impl<S> WsTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wraps an established WebSocket stream.
    #[must_use]
    pub fn new(stream: WebSocketStream<S>) -> Self {
        let (writer, reader) = stream.split();
        let (closed, _) = watch::channel(false);

        Self {
            writer: Mutex::new(writer),
            reader: Mutex::new(reader),
            closed,
        }
    }

    /// Returns `true` once `close` has been called.
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }
}

#[async_trait]
impl<S> Transport for WsTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    async fn read_text(&self) -> Result<String> {
        let mut closed = self.closed.subscribe();
        let mut reader = self.reader.lock().await;

        loop {
            let message = tokio::select! {
                biased;
                _ = closed.wait_for(|closed| *closed) => return Err(Error::ConnectionClosed),
                message = reader.next() => message,
            };

            match message {
                Some(Ok(Message::Text(text))) => return Ok(text.as_str().to_owned()),

                Some(Ok(Message::Binary(data))) => {
                    return std::str::from_utf8(&data).map(str::to_owned).map_err(|e| {
                        Error::invalid_event(format!("binary frame is not valid UTF-8: {e}"))
                    });
                }

                Some(Ok(Message::Close(frame))) => {
                    match frame {
                        Some(frame) => info!(
                            code = u16::from(frame.code),
                            reason = frame.reason.as_str(),
                            "WebSocket closed by remote"
                        ),
                        None => info!("WebSocket closed by remote"),
                    }
                    return Err(Error::ConnectionClosed);
                }

                Some(Err(e)) => return Err(e.into()),

                None => {
                    debug!("WebSocket stream ended");
                    return Err(Error::ConnectionClosed);
                }

                // Ignore Ping, Pong, raw frames
                Some(Ok(_)) => trace!("Skipping control frame"),
            }
        }
    }

    async fn write_text(&self, text: String) -> Result<()> {
        if self.is_closed() {
            return Err(Error::ConnectionClosed);
        }

        let mut writer = self.writer.lock().await;
        writer.send(Message::Text(text.into())).await?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        if self.closed.send_replace(true) {
            return Ok(());
        }

        let mut writer = self.writer.lock().await;
        match writer.close().await {
            Ok(()) | Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use parking_lot::Mutex as SyncMutex;
    use tokio::net::TcpListener;
    use tokio::time::timeout;
    use tokio_tungstenite::tungstenite::Utf8Bytes;
    use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
    use tokio_tungstenite::tungstenite::protocol::CloseFrame;
    use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
    use tokio_tungstenite::{accept_async, accept_hdr_async};

    use crate::client::{RealtimeClient, WaitStatus};

    /// Accepts one WebSocket client, records its Authorization header,
    /// sends `greeting`, then echoes every text frame back.
    async fn spawn_echo_server(greeting: &'static str) -> (Url, Arc<SyncMutex<Option<String>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let auth = Arc::new(SyncMutex::new(None));
        let seen = Arc::clone(&auth);

        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.expect("accept");
            let record_auth = move |req: &Request,
                                    resp: Response|
                  -> std::result::Result<Response, ErrorResponse> {
                *seen.lock() = req
                    .headers()
                    .get(AUTHORIZATION)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_owned);
                Ok(resp)
            };
            let ws = accept_hdr_async(stream, record_auth)
                .await
                .expect("upgrade");

            let (mut tx, mut rx) = ws.split();
            tx.send(Message::Text(greeting.into())).await.expect("greet");
            while let Some(Ok(message)) = rx.next().await {
                if message.is_text() && tx.send(message).await.is_err() {
                    break;
                }
            }
        });

        let url = Url::parse(&format!("ws://{addr}")).expect("url");
        (url, auth)
    }

    /// Accepts any number of clients and plays `script` to each, then
    /// drains until the client goes away.
    async fn spawn_scripted_server(script: Vec<Message>) -> Url {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");

        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let script = script.clone();
                tokio::spawn(async move {
                    let Ok(mut ws) = accept_async(stream).await else {
                        return;
                    };
                    for message in script {
                        if ws.send(message).await.is_err() {
                            return;
                        }
                    }
                    while let Some(Ok(_)) = ws.next().await {}
                });
            }
        });

        Url::parse(&format!("ws://{addr}")).expect("url")
    }

    fn normal_close() -> Message {
        Message::Close(Some(CloseFrame {
            code: CloseCode::Normal,
            reason: Utf8Bytes::from_static("bye"),
        }))
    }

    #[tokio::test]
    async fn test_dial_sends_bearer_and_reads_text() {
        let (url, auth) = spawn_echo_server(r#"{"type":"session.created"}"#).await;

        let transport = WsDialer.dial(&url, Some("secret")).await.expect("dial");
        let greeting = transport.read_text().await.expect("read");

        assert_eq!(greeting, r#"{"type":"session.created"}"#);
        assert_eq!(auth.lock().as_deref(), Some("Bearer secret"));
    }

    #[tokio::test]
    async fn test_dial_without_key_omits_header() {
        let (url, auth) = spawn_echo_server("{}").await;

        let transport = WsDialer.dial(&url, None).await.expect("dial");
        transport.read_text().await.expect("read");

        assert!(auth.lock().is_none());
    }

    #[tokio::test]
    async fn test_write_then_read_echo() {
        let (url, _) = spawn_echo_server("{}").await;
        let transport = WsDialer.dial(&url, None).await.expect("dial");
        transport.read_text().await.expect("greeting");

        transport
            .write_text(r#"{"type":"response.create"}"#.to_owned())
            .await
            .expect("write");

        let echoed = transport.read_text().await.expect("echo");
        assert_eq!(echoed, r#"{"type":"response.create"}"#);
    }

    #[tokio::test]
    async fn test_close_wakes_pending_read() {
        let (url, _) = spawn_echo_server("{}").await;
        let transport = WsDialer.dial(&url, None).await.expect("dial");
        transport.read_text().await.expect("greeting");

        let reader = Arc::clone(&transport);
        let pending = tokio::spawn(async move { reader.read_text().await });

        tokio::time::sleep(Duration::from_millis(50)).await;
        transport.close().await.expect("close");

        let result = timeout(Duration::from_secs(5), pending)
            .await
            .expect("read should return after close")
            .expect("join");
        assert!(matches!(result, Err(Error::ConnectionClosed)));
    }

    #[tokio::test]
    async fn test_read_after_close_ignores_buffered_messages() {
        let url = spawn_scripted_server(vec![
            Message::Text("{}".into()),
            Message::Text(r#"{"type":"late"}"#.into()),
        ])
        .await;
        let transport = WsDialer.dial(&url, None).await.expect("dial");
        transport.read_text().await.expect("first message");

        tokio::time::sleep(Duration::from_millis(50)).await;
        transport.close().await.expect("close");

        let result = transport.read_text().await;
        assert!(matches!(result, Err(Error::ConnectionClosed)));
    }

    #[tokio::test]
    async fn test_close_is_idempotent_and_blocks_writes() {
        let (url, _) = spawn_echo_server("{}").await;
        let transport = WsDialer.dial(&url, None).await.expect("dial");

        transport.close().await.expect("first close");
        transport.close().await.expect("second close");

        let result = transport.write_text("{}".to_owned()).await;
        assert!(matches!(result, Err(Error::ConnectionClosed)));
    }

    #[tokio::test]
    async fn test_remote_close_frame_reads_as_closed() {
        let url = spawn_scripted_server(vec![normal_close()]).await;
        let transport = WsDialer.dial(&url, None).await.expect("dial");

        let result = timeout(Duration::from_secs(5), transport.read_text())
            .await
            .expect("read should return on close frame");

        assert!(matches!(result, Err(Error::ConnectionClosed)));
    }

    #[tokio::test]
    async fn test_remote_close_frame_ends_client_session() {
        let url = spawn_scripted_server(vec![
            Message::Text(r#"{"type":"session.created"}"#.into()),
            normal_close(),
        ])
        .await;

        let client = RealtimeClient::builder()
            .url(url.as_str())
            .wait_timeout(Duration::from_secs(5))
            .build()
            .expect("build");
        client.connect().await.expect("connect");

        assert_eq!(client.wait().await, WaitStatus::Exited);
        assert!(!client.is_connected().await);
    }

    #[tokio::test]
    async fn test_binary_frames_must_be_utf8() {
        let url = spawn_scripted_server(vec![
            Message::Binary(br#"{"type":"response.done"}"#.to_vec().into()),
            Message::Binary(vec![0xff, 0xfe, 0x7b].into()),
        ])
        .await;
        let transport = WsDialer.dial(&url, None).await.expect("dial");

        let text = transport.read_text().await.expect("utf-8 binary");
        assert_eq!(text, r#"{"type":"response.done"}"#);

        let err = transport.read_text().await.unwrap_err();
        assert!(err.is_validation_error());
    }

    #[tokio::test]
    async fn test_dial_refused_is_connection_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        drop(listener);

        let url = Url::parse(&format!("ws://{addr}")).expect("url");
        let result = WsDialer.dial(&url, None).await;

        assert!(matches!(result, Err(Error::Connection { .. })));
    }
}
