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

//! Core types for the relay server

use std::fmt;
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use wirelink_protocol::Identity;

/// Whether a connection is still registered with the server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Registered and accepting lines
    Connected,
    /// Removed from the registry; its socket is closed or closing
    Removed,
}

impl ConnectionState {
    /// Check if the connection is still registered
    pub fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connected => write!(f, "connected"),
            Self::Removed => write!(f, "removed"),
        }
    }
}

/// Outcome of writing a line to a single client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The line was written to the client's socket
    Delivered,
    /// No client with that identity is registered; nothing was written
    Dropped,
}

impl Delivery {
    /// Check if the line reached a client
    pub fn is_delivered(self) -> bool {
        matches!(self, Self::Delivered)
    }
}

/// Connection information snapshot
#[derive(Debug, Clone)]
pub struct ConnectionInfo {
    /// Identity assigned at handshake
    pub id: Identity,
    /// Current state
    pub state: ConnectionState,
    /// Peer address
    pub peer_addr: SocketAddr,
    /// When the connection was accepted
    pub created_at: Instant,
    /// Lines written to the client
    pub lines_sent: u64,
    /// Lines read from the client
    pub lines_received: u64,
}

impl ConnectionInfo {
    /// Get the connection duration
    pub fn duration(&self) -> Duration {
        self.created_at.elapsed()
    }
}

/// Server snapshot for non-blocking debug information
#[derive(Debug, Clone)]
pub struct ServerSnapshot {
    /// Number of registered clients
    pub active_connections: usize,
    /// Total connections since server start
    pub total_connections: u64,
    /// Server bind address
    pub bind_address: SocketAddr,
    /// Whether the accept loop is running
    pub running: bool,
    /// Server uptime
    pub uptime: Duration,
    /// Server start time
    pub started_at: Instant,
}

impl fmt::Display for ServerSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LinkServer {{ active: {}, total: {}, addr: {}, running: {}, uptime: {:?} }}",
            self.active_connections,
            self.total_connections,
            self.bind_address,
            self.running,
            self.uptime
        )
    }
}
