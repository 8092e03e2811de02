//! Transport seam for the connection controller.
//!
//! The controller drives any [`Transport`] produced by a [`Connector`], so
//! sessions can run over a real WebSocket ([`WsConnector`]) or a scripted
//! in-memory transport in tests. Frames are text; binary and control
//! frames are handled inside the transport.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::debug;

/// Path the backend serves the debate stream on.
const DEBATE_WS_PATH: &str = "/ws/debate";

/// Transport-level failure.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("websocket error: {0}")]
    Ws(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("invalid endpoint url: {0}")]
    InvalidUrl(String),
}

/// A connected, bidirectional text-frame transport.
#[async_trait]
pub trait Transport: Send {
    /// Send one text frame.
    async fn send(&mut self, text: String) -> Result<(), TransportError>;

    /// Receive the next text frame. `None` means the peer closed the
    /// connection cleanly.
    async fn recv(&mut self) -> Option<Result<String, TransportError>>;

    /// Close the transport. Best-effort, fire-and-forget.
    async fn close(&mut self);
}

/// Opens a fresh [`Transport`] for each session.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    type Conn: Transport + 'static;

    async fn connect(&self) -> Result<Self::Conn, TransportError>;
}

/// Derive the debate WebSocket URL from the backend's HTTP base URL.
pub fn debate_ws_url(base_url: &str) -> Result<String, TransportError> {
    let base = base_url.trim_end_matches('/');
    let ws_base = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{rest}")
    } else if base.starts_with("ws://") || base.starts_with("wss://") {
        base.to_string()
    } else {
        return Err(TransportError::InvalidUrl(base_url.to_string()));
    };
    Ok(format!("{ws_base}{DEBATE_WS_PATH}"))
}

/// WebSocket connector for the debate backend.
pub struct WsConnector {
    url: String,
}

impl WsConnector {
    /// Connector for an explicit `ws://`/`wss://` URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// Connector derived from the backend's HTTP base URL.
    pub fn for_backend(base_url: &str) -> Result<Self, TransportError> {
        Ok(Self::new(debate_ws_url(base_url)?))
    }

    /// The URL this connector dials.
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Connector for WsConnector {
    type Conn = WsTransport;

    async fn connect(&self) -> Result<WsTransport, TransportError> {
        debug!(url = %self.url, "opening websocket");
        let (stream, _response) = connect_async(self.url.as_str()).await?;
        Ok(WsTransport { stream })
    }
}

/// A live WebSocket connection to the backend.
pub struct WsTransport {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl Transport for WsTransport {
    async fn send(&mut self, text: String) -> Result<(), TransportError> {
        self.stream.send(Message::Text(text)).await?;
        Ok(())
    }

    async fn recv(&mut self) -> Option<Result<String, TransportError>> {
        while let Some(frame) = self.stream.next().await {
            match frame {
                Ok(Message::Text(text)) => return Some(Ok(text)),
                Ok(Message::Close(_)) => return None,
                // Control and binary frames are not part of the protocol.
                Ok(_) => continue,
                Err(err) => return Some(Err(err.into())),
            }
        }
        None
    }

    async fn close(&mut self) {
        let _ = self.stream.close(None).await;
    }
}
