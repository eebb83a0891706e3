// Persistent feed connection: one text frame in, one text frame out.
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, trace, warn};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("transport error: {0}")]
    Other(String),
}

/// What a transport hands back on each receive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Closed,
}

#[async_trait]
pub trait FeedTransport: Send {
    async fn send(&mut self, text: String) -> Result<(), TransportError>;

    /// Wait for the next frame. An `Err` is the transport's error signal.
    async fn receive(&mut self) -> Result<Frame, TransportError>;

    /// Release the connection. Safe to call more than once.
    async fn close(&mut self);
}

// lets a caller keep ownership of the transport across a run
#[async_trait]
impl<T: FeedTransport + ?Sized> FeedTransport for &mut T {
    async fn send(&mut self, text: String) -> Result<(), TransportError> {
        (**self).send(text).await
    }

    async fn receive(&mut self) -> Result<Frame, TransportError> {
        (**self).receive().await
    }

    async fn close(&mut self) {
        (**self).close().await
    }
}

pub struct WsTransport {
    url: String,
    socket: Option<WebSocketStream<MaybeTlsStream<TcpStream>>>,
}

impl WsTransport {
    pub async fn connect(url: &str) -> Result<Self, TransportError> {
        info!(url, "Connecting to feed");
        let (socket, response) = connect_async(url).await?;
        debug!(status = %response.status(), "Websocket handshake complete");
        Ok(Self { url: url.to_string(), socket: Some(socket) })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn connected(&self) -> bool {
        self.socket.is_some()
    }
}

#[async_trait]
impl FeedTransport for WsTransport {
    async fn send(&mut self, text: String) -> Result<(), TransportError> {
        let socket = self
            .socket
            .as_mut()
            .ok_or_else(|| TransportError::Other("websocket not connected".into()))?;
        socket.send(Message::Text(text)).await?;
        Ok(())
    }

    async fn receive(&mut self) -> Result<Frame, TransportError> {
        let socket = self
            .socket
            .as_mut()
            .ok_or_else(|| TransportError::Other("websocket not connected".into()))?;
        loop {
            match socket.next().await {
                Some(Ok(Message::Text(text))) => return Ok(Frame::Text(text)),
                Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes) {
                    Ok(text) => return Ok(Frame::Text(text)),
                    Err(e) => return Err(TransportError::Other(format!("non utf-8 binary frame: {}", e))),
                },
                Some(Ok(Message::Close(reason))) => {
                    info!(?reason, "Websocket closed by server");
                    return Ok(Frame::Closed);
                }
                // pings are answered by tungstenite on the next read/write
                Some(Ok(other)) => trace!(?other, "Skipping control frame"),
                Some(Err(e)) => return Err(e.into()),
                None => return Ok(Frame::Closed),
            }
        }
    }

    async fn close(&mut self) {
        if let Some(mut socket) = self.socket.take() {
            if let Err(e) = socket.close(None).await {
                warn!(error = %e, url = %self.url, "Error while closing websocket");
            } else {
                info!(url = %self.url, "Websocket closed");
            }
        }
    }
}
