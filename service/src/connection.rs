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

//! Server-side view of a single client connection

use crate::{ConnectionInfo, ConnectionState, Result};
use metrics::counter;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, instrument, trace};
use wirelink_protocol::{Identity, LineWriter};

/// A registered client connection
///
/// Cheap to clone; clones share the writer and the counters. The receive side of the
/// socket is owned by the connection's worker task, not by this handle.
#[derive(Clone)]
pub struct Connection {
    writer: LineWriter,

    // Metadata
    id: Identity,
    created_at: Instant,

    // Counters
    lines_sent: Arc<AtomicU64>,
    lines_received: Arc<AtomicU64>,
}

impl Connection {
    pub(crate) fn new(id: Identity, writer: LineWriter) -> Self {
        Self {
            writer,
            id,
            created_at: Instant::now(),
            lines_sent: Arc::new(AtomicU64::new(0)),
            lines_received: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Get the client identity
    pub fn id(&self) -> Identity {
        self.id
    }

    /// Get the peer address
    pub fn peer_addr(&self) -> SocketAddr {
        self.writer.peer_addr()
    }

    /// Get when the connection was accepted
    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// Get lines written to the client
    pub fn lines_sent(&self) -> u64 {
        self.lines_sent.load(Ordering::Relaxed)
    }

    /// Get lines read from the client
    pub fn lines_received(&self) -> u64 {
        self.lines_received.load(Ordering::Relaxed)
    }

    pub(crate) fn record_received(&self) {
        self.lines_received.fetch_add(1, Ordering::Relaxed);
        counter!("wirelink.lines.received").increment(1);
    }

    /// Write one line to the client
    #[instrument(skip(self, line), fields(connection_id = %self.id))]
    pub async fn send_line(&self, line: &str) -> Result<()> {
        self.writer.send_line(line).await?;
        self.lines_sent.fetch_add(1, Ordering::Relaxed);
        counter!("wirelink.lines.sent").increment(1);
        trace!(len = line.len(), "Line sent");
        Ok(())
    }

    /// Close the socket, ending the connection's receive loop
    #[instrument(skip(self), fields(connection_id = %self.id))]
    pub async fn close(&self) -> Result<()> {
        debug!("Closing connection");
        self.writer.close().await?;
        Ok(())
    }

    /// Check if the socket has been closed
    pub fn is_closed(&self) -> bool {
        self.writer.is_closed()
    }

    /// Get a snapshot of this connection
    pub fn info(&self) -> ConnectionInfo {
        ConnectionInfo {
            id: self.id,
            state: if self.is_closed() {
                ConnectionState::Removed
            } else {
                ConnectionState::Connected
            },
            peer_addr: self.peer_addr(),
            created_at: self.created_at,
            lines_sent: self.lines_sent(),
            lines_received: self.lines_received(),
        }
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("peer_addr", &self.peer_addr())
            .field("closed", &self.is_closed())
            .finish()
    }
}
