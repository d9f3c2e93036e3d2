//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Shared helpers for the server integration tests

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::timeout;
use wirelink_protocol::{DEFAULT_MAX_LINE_LENGTH, Identity, LineReader, LineWriter};
use wirelink_service::{LinkServer, ServerConfig};

pub const WAIT: Duration = Duration::from_secs(5);
pub const QUIET: Duration = Duration::from_millis(150);

/// Server events recorded through the hub
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Connected(Identity),
    Disconnected(Identity),
    Message(Identity, String),
}

pub struct TestServer {
    pub server: Arc<LinkServer>,
    pub events: mpsc::UnboundedReceiver<Event>,
}

impl TestServer {
    pub async fn start() -> Self {
        Self::start_with(ServerConfig::new("127.0.0.1:0".parse().unwrap())).await
    }

    pub async fn start_with(config: ServerConfig) -> Self {
        let server = Arc::new(LinkServer::bind(config).await.unwrap());
        let (tx, events) = mpsc::unbounded_channel();
        {
            let tx = tx.clone();
            server.on_client_connect(move |id| {
                let _ = tx.send(Event::Connected(id));
            });
        }
        {
            let tx = tx.clone();
            server.on_client_disconnect(move |id| {
                let _ = tx.send(Event::Disconnected(id));
            });
        }
        server.subscribe(move |id, line| {
            let _ = tx.send(Event::Message(id, line.to_string()));
        });
        let _ = server.spawn();
        Self { server, events }
    }

    pub fn addr(&self) -> SocketAddr {
        self.server.local_addr()
    }

    /// Connect a raw client and wait until the server has registered it
    pub async fn connect(&mut self) -> RawClient {
        let client = RawClient::connect(self.addr()).await;
        assert_eq!(self.next_event().await, Event::Connected(client.id));
        client
    }

    pub async fn next_event(&mut self) -> Event {
        timeout(WAIT, self.events.recv())
            .await
            .expect("timed out waiting for server event")
            .expect("event channel closed")
    }

    pub async fn assert_no_event(&mut self) {
        if let Ok(event) = timeout(QUIET, self.events.recv()).await {
            panic!("unexpected server event: {event:?}");
        }
    }
}

/// Client speaking the wire protocol directly
pub struct RawClient {
    pub id: Identity,
    pub reader: LineReader,
    pub writer: LineWriter,
}

impl RawClient {
    pub async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.unwrap();
        let (mut reader, writer) =
            wirelink_protocol::split(stream, DEFAULT_MAX_LINE_LENGTH).unwrap();
        let handshake = timeout(WAIT, reader.next_line())
            .await
            .expect("timed out waiting for handshake")
            .expect("closed before handshake")
            .unwrap();
        let id = handshake.parse().unwrap();
        Self { id, reader, writer }
    }

    pub async fn send(&self, line: &str) {
        self.writer.send_line(line).await.unwrap();
    }

    pub async fn recv(&mut self) -> String {
        timeout(WAIT, self.reader.next_line())
            .await
            .expect("timed out waiting for line")
            .expect("stream closed")
            .unwrap()
    }

    pub async fn assert_silent(&mut self) {
        if let Ok(Some(line)) = timeout(QUIET, self.reader.next_line()).await {
            panic!("unexpected line: {line:?}");
        }
    }

    pub async fn assert_closed(&mut self) {
        let next = timeout(WAIT, self.reader.next_line())
            .await
            .expect("timed out waiting for close");
        if let Some(Ok(line)) = next {
            panic!("unexpected line before close: {line:?}");
        }
    }
}
