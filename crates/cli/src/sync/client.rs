// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Remote client: pull-since-cursor and push-single-change.
//!
//! [`RemoteClient`] is the seam the engine talks to. [`WsRemote`] implements
//! it as request/response pairs over a [`Transport`], matched by request id
//! and bounded by a per-call timeout.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use ot_core::{ClientMessage, PullBatch, PushAck, PushRequest, RejectReason, RemoteEntity, ServerMessage};
use tokio::sync::Mutex;

use super::transport::{Transport, TransportError, WebSocketTransport};
use crate::config::RemoteConfig;

/// Failure reported by the remote or on the way to it.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RemoteError {
    /// Unreachable, timed out or temporarily unavailable. Retryable.
    #[error("network error: {0}")]
    Network(String),

    /// Credentials refused. Aborts the cycle.
    #[error("authentication failed: {0}\n  hint: refresh the connection's credentials")]
    Auth(String),

    /// The record changed remotely since the pushed base version.
    #[error("remote conflict: {message}")]
    Conflict {
        message: String,
        remote_version: Option<String>,
        remote: Option<Box<RemoteEntity>>,
    },

    /// The payload was refused. Never retried.
    #[error("rejected by remote: {0}")]
    Validation(String),
}

impl RemoteError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, RemoteError::Network(_))
    }
}

impl From<TransportError> for RemoteError {
    fn from(err: TransportError) -> Self {
        RemoteError::Network(err.to_string())
    }
}

/// Boxed future returned by [`RemoteClient`] methods.
pub type RemoteFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, RemoteError>> + Send + 'a>>;

/// The remote tracker as seen by the sync engine.
pub trait RemoteClient: Send + Sync + 'static {
    /// Fetches the changes after `cursor`; `None` asks for a full resync.
    fn pull<'a>(&'a self, connection_id: &'a str, cursor: Option<&'a str>)
        -> RemoteFuture<'a, PullBatch>;

    /// Sends one local change.
    fn push<'a>(&'a self, connection_id: &'a str, request: &'a PushRequest)
        -> RemoteFuture<'a, PushAck>;
}

/// [`RemoteClient`] speaking JSON messages over a WebSocket.
///
/// Connects lazily and reconnects on the next call after a failure.
pub struct WsRemote<T: Transport = WebSocketTransport> {
    url: String,
    timeout: Duration,
    transport: Mutex<T>,
    next_request: AtomicU64,
}

impl WsRemote<WebSocketTransport> {
    pub fn new(config: &RemoteConfig) -> Self {
        Self::with_transport(&config.url, config.request_timeout(), WebSocketTransport::new())
    }
}

impl<T: Transport> WsRemote<T> {
    /// Create a remote client over a custom transport (for testing).
    pub fn with_transport(url: &str, timeout: Duration, transport: T) -> Self {
        WsRemote {
            url: url.to_string(),
            timeout,
            transport: Mutex::new(transport),
            next_request: AtomicU64::new(1),
        }
    }

    fn next_id(&self) -> u64 {
        self.next_request.fetch_add(1, Ordering::Relaxed)
    }

    /// Sends `msg` and waits for the reply carrying the same request id.
    async fn roundtrip(&self, msg: ClientMessage) -> Result<ServerMessage, RemoteError> {
        let mut transport = self.transport.lock().await;

        let exchange = exchange(&mut *transport, &self.url, msg);
        let outcome = tokio::time::timeout(self.timeout, exchange).await;
        match outcome {
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(e)) => {
                let _ = transport.disconnect().await;
                Err(e)
            }
            Err(_) => {
                let _ = transport.disconnect().await;
                Err(RemoteError::Network(format!(
                    "request timed out after {}ms",
                    self.timeout.as_millis()
                )))
            }
        }
    }
}

async fn exchange<T: Transport>(
    transport: &mut T,
    url: &str,
    msg: ClientMessage,
) -> Result<ServerMessage, RemoteError> {
    let request_id = msg.request_id();
    if !transport.is_connected() {
        transport.connect(url).await?;
    }
    transport.send(msg).await?;
    loop {
        match transport.recv().await? {
            Some(reply) if reply.request_id() == request_id => return Ok(reply),
            // Late reply to an earlier, timed-out request.
            Some(_) => continue,
            None => return Err(RemoteError::Network("connection closed".into())),
        }
    }
}

/// Maps a rejection onto the error the engine acts on.
fn rejection(reply: ServerMessage) -> RemoteError {
    match reply {
        ServerMessage::Rejected { reason, message, remote_version, remote, .. } => match reason {
            RejectReason::Auth => RemoteError::Auth(message),
            RejectReason::Conflict => {
                RemoteError::Conflict { message, remote_version, remote: remote.map(Box::new) }
            }
            RejectReason::Validation => RemoteError::Validation(message),
            RejectReason::Unavailable => RemoteError::Network(message),
        },
        other => RemoteError::Network(format!("unexpected reply: {:?}", other)),
    }
}

impl<T: Transport + 'static> RemoteClient for WsRemote<T> {
    fn pull<'a>(
        &'a self,
        connection_id: &'a str,
        cursor: Option<&'a str>,
    ) -> RemoteFuture<'a, PullBatch> {
        Box::pin(async move {
            let msg = ClientMessage::pull(self.next_id(), connection_id, cursor.map(String::from));
            match self.roundtrip(msg).await? {
                ServerMessage::PullResponse { batch, .. } => Ok(batch),
                other => Err(rejection(other)),
            }
        })
    }

    fn push<'a>(
        &'a self,
        connection_id: &'a str,
        request: &'a PushRequest,
    ) -> RemoteFuture<'a, PushAck> {
        Box::pin(async move {
            let msg = ClientMessage::push(self.next_id(), connection_id, request.clone());
            match self.roundtrip(msg).await? {
                ServerMessage::PushResponse { ack, .. } => Ok(ack),
                other => Err(rejection(other)),
            }
        })
    }
}
