// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Message transport underneath the WebSocket remote client.
//!
//! The trait keeps the remote client testable against an in-memory
//! transport; production uses [`WebSocketTransport`].

use std::future::Future;
use std::pin::Pin;

use futures_util::{SinkExt, StreamExt};
use ot_core::{ClientMessage, ServerMessage};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

/// Error type for transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("not connected")]
    NotConnected,

    #[error("send failed: {0}")]
    SendFailed(String),

    #[error("receive failed: {0}")]
    ReceiveFailed(String),

    #[error("malformed message: {0}")]
    Malformed(String),
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Boxed future returned by transport methods.
pub type TransportFuture<'a, T> = Pin<Box<dyn Future<Output = TransportResult<T>> + Send + 'a>>;

/// A bidirectional, message-framed connection to the remote.
pub trait Transport: Send + Sync {
    fn connect(&mut self, url: &str) -> TransportFuture<'_, ()>;

    fn disconnect(&mut self) -> TransportFuture<'_, ()>;

    fn send(&mut self, msg: ClientMessage) -> TransportFuture<'_, ()>;

    /// Receives the next server message. `None` once the peer closed.
    fn recv(&mut self) -> TransportFuture<'_, Option<ServerMessage>>;

    fn is_connected(&self) -> bool;
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// WebSocket transport over tokio-tungstenite, carrying JSON text frames.
#[derive(Default)]
pub struct WebSocketTransport {
    ws: Option<WsStream>,
}

impl WebSocketTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn decode(payload: &[u8]) -> TransportResult<ServerMessage> {
        let text =
            std::str::from_utf8(payload).map_err(|e| TransportError::Malformed(e.to_string()))?;
        ServerMessage::from_json(text).map_err(|e| TransportError::Malformed(e.to_string()))
    }
}

impl Transport for WebSocketTransport {
    fn connect(&mut self, url: &str) -> TransportFuture<'_, ()> {
        let url = url.to_string();
        Box::pin(async move {
            let (ws, _) = tokio_tungstenite::connect_async(url.as_str())
                .await
                .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;
            self.ws = Some(ws);
            Ok(())
        })
    }

    fn disconnect(&mut self) -> TransportFuture<'_, ()> {
        Box::pin(async move {
            if let Some(mut ws) = self.ws.take() {
                // The peer may already be gone; closing is best effort.
                let _ = ws.close(None).await;
            }
            Ok(())
        })
    }

    fn send(&mut self, msg: ClientMessage) -> TransportFuture<'_, ()> {
        Box::pin(async move {
            let json = msg.to_json().map_err(|e| TransportError::Malformed(e.to_string()))?;
            let ws = self.ws.as_mut().ok_or(TransportError::NotConnected)?;
            if let Err(e) = ws.send(Message::Text(json.into())).await {
                self.ws = None;
                return Err(TransportError::SendFailed(e.to_string()));
            }
            Ok(())
        })
    }

    fn recv(&mut self) -> TransportFuture<'_, Option<ServerMessage>> {
        Box::pin(async move {
            loop {
                let ws = self.ws.as_mut().ok_or(TransportError::NotConnected)?;
                let frame = match ws.next().await {
                    Some(Ok(frame)) => frame,
                    Some(Err(e)) => {
                        self.ws = None;
                        return Err(TransportError::ReceiveFailed(e.to_string()));
                    }
                    None => {
                        self.ws = None;
                        return Ok(None);
                    }
                };
                match frame {
                    Message::Text(text) => return Self::decode(text.as_bytes()).map(Some),
                    Message::Binary(bytes) => return Self::decode(&bytes).map(Some),
                    Message::Close(_) => {
                        self.ws = None;
                        return Ok(None);
                    }
                    // tungstenite answers pings itself
                    _ => continue,
                }
            }
        })
    }

    fn is_connected(&self) -> bool {
        self.ws.is_some()
    }
}
