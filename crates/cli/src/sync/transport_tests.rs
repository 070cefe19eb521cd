// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::transport::{Transport, TransportError, TransportFuture};
use ot_core::{ClientMessage, PullBatch, ServerMessage};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// In-memory transport. Replies are scripted up front; sent messages are
/// recorded.
#[derive(Clone, Default)]
pub struct MockTransport {
    connected: bool,
    incoming: Arc<Mutex<VecDeque<ServerMessage>>>,
    outgoing: Arc<Mutex<Vec<ClientMessage>>>,
    connects: Arc<Mutex<u32>>,
    connect_should_fail: bool,
    /// Block forever in recv once the script is exhausted.
    stall_when_empty: bool,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_incoming(&self, msg: ServerMessage) {
        self.incoming.lock().unwrap().push_back(msg);
    }

    pub fn get_outgoing(&self) -> Vec<ClientMessage> {
        self.outgoing.lock().unwrap().clone()
    }

    pub fn connect_count(&self) -> u32 {
        *self.connects.lock().unwrap()
    }

    pub fn set_connect_fail(&mut self, fail: bool) {
        self.connect_should_fail = fail;
    }

    pub fn set_stall_when_empty(&mut self, stall: bool) {
        self.stall_when_empty = stall;
    }
}

impl Transport for MockTransport {
    fn connect(&mut self, _url: &str) -> TransportFuture<'_, ()> {
        Box::pin(async move {
            *self.connects.lock().unwrap() += 1;
            if self.connect_should_fail {
                return Err(TransportError::ConnectionFailed("mock failure".into()));
            }
            self.connected = true;
            Ok(())
        })
    }

    fn disconnect(&mut self) -> TransportFuture<'_, ()> {
        Box::pin(async move {
            self.connected = false;
            Ok(())
        })
    }

    fn send(&mut self, msg: ClientMessage) -> TransportFuture<'_, ()> {
        let outgoing = Arc::clone(&self.outgoing);
        Box::pin(async move {
            outgoing.lock().unwrap().push(msg);
            Ok(())
        })
    }

    fn recv(&mut self) -> TransportFuture<'_, Option<ServerMessage>> {
        let incoming = Arc::clone(&self.incoming);
        let stall = self.stall_when_empty;
        Box::pin(async move {
            let msg = incoming.lock().unwrap().pop_front();
            if msg.is_none() && stall {
                std::future::pending::<()>().await;
            }
            Ok(msg)
        })
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

#[tokio::test]
async fn test_mock_transport_connect() {
    let mut transport = MockTransport::new();
    assert!(!transport.is_connected());

    transport.connect("ws://localhost:1234").await.unwrap();
    assert!(transport.is_connected());

    transport.disconnect().await.unwrap();
    assert!(!transport.is_connected());
}

#[tokio::test]
async fn test_mock_transport_send_recv() {
    let mut transport = MockTransport::new();
    transport.connect("ws://localhost:1234").await.unwrap();

    transport.send(ClientMessage::pull(1, "conn", None)).await.unwrap();
    transport.queue_incoming(ServerMessage::pull_response(1, PullBatch::default()));

    assert_eq!(transport.get_outgoing(), vec![ClientMessage::pull(1, "conn", None)]);
    let reply = transport.recv().await.unwrap();
    assert_eq!(reply, Some(ServerMessage::pull_response(1, PullBatch::default())));
    assert_eq!(transport.recv().await.unwrap(), None);
}

#[tokio::test]
async fn test_mock_transport_connect_failure() {
    let mut transport = MockTransport::new();
    transport.set_connect_fail(true);

    let err = transport.connect("ws://localhost:1234").await.unwrap_err();
    assert!(matches!(err, TransportError::ConnectionFailed(_)));
    assert!(!transport.is_connected());
}

#[tokio::test]
async fn test_websocket_transport_send_requires_connection() {
    use super::transport::WebSocketTransport;

    let mut transport = WebSocketTransport::new();
    assert!(!transport.is_connected());
    let err = transport.send(ClientMessage::pull(1, "conn", None)).await.unwrap_err();
    assert!(matches!(err, TransportError::NotConnected));
    // disconnecting an unconnected transport is harmless
    transport.disconnect().await.unwrap();
}
