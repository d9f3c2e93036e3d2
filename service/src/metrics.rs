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

//! Lock-free metrics for the relay server
//!
//! Every recording method updates an in-process atomic (readable through
//! [`ServerMetrics::snapshot`]) and forwards the same event to the global
//! `metrics` recorder, if one is installed.

use metrics::{counter, gauge, histogram};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Lock-free server metrics
#[derive(Debug)]
pub struct ServerMetrics {
    // Connection counts
    total_connections: AtomicU64,
    active_connections: AtomicU64,
    rejected_connections: AtomicU64,
    kicked_clients: AtomicU64,

    // Routing
    direct_messages: AtomicU64,
    global_messages: AtomicU64,
    dropped_messages: AtomicU64,
    invalid_targets: AtomicU64,
    hub_messages: AtomicU64,

    // Timing (stored as nanoseconds)
    total_connection_duration_ns: AtomicU64,

    started_at: Instant,
}

impl Default for ServerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerMetrics {
    /// Create a new metrics instance
    pub fn new() -> Self {
        Self {
            total_connections: AtomicU64::new(0),
            active_connections: AtomicU64::new(0),
            rejected_connections: AtomicU64::new(0),
            kicked_clients: AtomicU64::new(0),
            direct_messages: AtomicU64::new(0),
            global_messages: AtomicU64::new(0),
            dropped_messages: AtomicU64::new(0),
            invalid_targets: AtomicU64::new(0),
            hub_messages: AtomicU64::new(0),
            total_connection_duration_ns: AtomicU64::new(0),
            started_at: Instant::now(),
        }
    }

    // Connection tracking

    /// Record a client being registered
    pub fn connection_opened(&self) {
        self.total_connections.fetch_add(1, Ordering::Relaxed);
        self.active_connections.fetch_add(1, Ordering::Relaxed);
        counter!("wirelink.connections.total").increment(1);
        gauge!("wirelink.connections.active").increment(1.0);
    }

    /// Record a client being removed from the registry
    pub fn connection_closed(&self, duration: Duration) {
        self.active_connections.fetch_sub(1, Ordering::Relaxed);
        self.total_connection_duration_ns
            .fetch_add(duration.as_nanos() as u64, Ordering::Relaxed);
        gauge!("wirelink.connections.active").decrement(1.0);
        histogram!("wirelink.connections.duration").record(duration.as_secs_f64());
    }

    /// Record a socket turned away at the connection limit
    pub fn connection_rejected(&self) {
        self.rejected_connections.fetch_add(1, Ordering::Relaxed);
        counter!("wirelink.connections.rejected").increment(1);
    }

    /// Record a client removed by a kick
    pub fn client_kicked(&self) {
        self.kicked_clients.fetch_add(1, Ordering::Relaxed);
        counter!("wirelink.clients.kicked").increment(1);
    }

    /// Get the current number of registered clients
    pub fn active_connections(&self) -> u64 {
        self.active_connections.load(Ordering::Relaxed)
    }

    /// Get the total number of connections since server start
    pub fn total_connections(&self) -> u64 {
        self.total_connections.load(Ordering::Relaxed)
    }

    // Routing

    /// Record a direct message forwarded to its target
    pub fn direct_message(&self) {
        self.direct_messages.fetch_add(1, Ordering::Relaxed);
        counter!("wirelink.messages.direct").increment(1);
    }

    /// Record a global message fanned out to other clients
    pub fn global_message(&self) {
        self.global_messages.fetch_add(1, Ordering::Relaxed);
        counter!("wirelink.messages.global").increment(1);
    }

    /// Record a line that could not be delivered to its target
    pub fn message_dropped(&self) {
        self.dropped_messages.fetch_add(1, Ordering::Relaxed);
        counter!("wirelink.messages.dropped").increment(1);
    }

    /// Record a direct message whose target failed to parse
    pub fn invalid_target(&self) {
        self.invalid_targets.fetch_add(1, Ordering::Relaxed);
        counter!("wirelink.messages.invalid_target").increment(1);
    }

    /// Record a line delivered to the hub subscribers
    pub fn hub_message(&self) {
        self.hub_messages.fetch_add(1, Ordering::Relaxed);
        counter!("wirelink.messages.hub").increment(1);
    }

    // Snapshot

    /// Get a point-in-time view of all metrics
    ///
    /// Counters are read individually, so a snapshot taken while traffic is
    /// flowing may be slightly skewed between fields.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            total_connections: self.total_connections.load(Ordering::Relaxed),
            active_connections: self.active_connections.load(Ordering::Relaxed),
            rejected_connections: self.rejected_connections.load(Ordering::Relaxed),
            kicked_clients: self.kicked_clients.load(Ordering::Relaxed),
            direct_messages: self.direct_messages.load(Ordering::Relaxed),
            global_messages: self.global_messages.load(Ordering::Relaxed),
            dropped_messages: self.dropped_messages.load(Ordering::Relaxed),
            invalid_targets: self.invalid_targets.load(Ordering::Relaxed),
            hub_messages: self.hub_messages.load(Ordering::Relaxed),
            uptime: self.started_at.elapsed(),
            avg_connection_duration: self.average_connection_duration(),
        }
    }

    fn average_connection_duration(&self) -> Duration {
        let total = self.total_connections.load(Ordering::Relaxed);
        if total == 0 {
            return Duration::ZERO;
        }
        let total_ns = self.total_connection_duration_ns.load(Ordering::Relaxed);
        Duration::from_nanos(total_ns / total)
    }
}

/// A snapshot of server metrics at a point in time
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    /// Total connections since server start
    pub total_connections: u64,
    /// Currently registered clients
    pub active_connections: u64,
    /// Sockets closed at the connection limit
    pub rejected_connections: u64,
    /// Clients removed by a kick
    pub kicked_clients: u64,
    /// Direct messages delivered
    pub direct_messages: u64,
    /// Global messages relayed
    pub global_messages: u64,
    /// Direct lines addressed to unregistered identities or too long to forward
    pub dropped_messages: u64,
    /// Direct messages with an unparseable target
    pub invalid_targets: u64,
    /// Lines handed to hub subscribers
    pub hub_messages: u64,
    /// Server uptime
    pub uptime: Duration,
    /// Average connection duration
    pub avg_connection_duration: Duration,
}

impl MetricsSnapshot {
    /// Total lines routed between clients
    pub fn routed_messages(&self) -> u64 {
        self.direct_messages + self.global_messages
    }

    /// Routed messages per second
    pub fn messages_per_sec(&self) -> f64 {
        if self.uptime.is_zero() {
            return 0.0;
        }
        self.routed_messages() as f64 / self.uptime.as_secs_f64()
    }
}
