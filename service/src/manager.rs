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

//! Connection manager: registration, routing and removal

use crate::worker::ConnectionWorker;
use crate::{
    Connection, ConnectionInfo, Delivery, Registry, Result, ServerConfig, ServerHub,
    ServerMetrics, ServiceError,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::net::TcpStream;
use tracing::{debug, info, instrument, warn};
use wirelink_protocol::{Command, INVALID_IDENTITY_NOTICE, Identity};

/// Line written to a client that is being kicked
const KICK_LINE: &str = "KICK";

/// Result of a broadcast operation
#[derive(Debug, Clone, Default)]
pub struct BroadcastResult {
    /// Number of clients the line was addressed to
    pub total: usize,
    /// Number of successful writes
    pub succeeded: usize,
    /// Number of failed writes
    pub failed: usize,
    /// Errors that occurred (identity and error message)
    pub errors: Vec<(Identity, String)>,
}

impl BroadcastResult {
    /// Check if every write succeeded
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

/// What the receive loop should do after a line has been dispatched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Dispatch {
    /// Keep reading
    Continue,
    /// The client asked to leave and has been removed
    Stop,
}

/// Owns the registry and hub and implements every server-side routing rule
///
/// Removal is claimed through [`Registry::remove`], so disconnect callbacks and the
/// active-connection gauge are updated exactly once per client no matter how many paths
/// (read error, `DISCONNECT`, kick, shutdown) race to remove it.
#[derive(Debug)]
pub struct ConnectionManager {
    config: ServerConfig,
    registry: Registry,
    hub: ServerHub,
    metrics: Arc<ServerMetrics>,
    closing: AtomicBool,
}

impl ConnectionManager {
    /// Create a new connection manager
    pub fn new(config: ServerConfig, metrics: Arc<ServerMetrics>) -> Self {
        Self {
            config,
            registry: Registry::new(),
            hub: ServerHub::new(),
            metrics,
            closing: AtomicBool::new(false),
        }
    }

    /// Get the registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Get the subscriber hub
    pub fn hub(&self) -> &ServerHub {
        &self.hub
    }

    /// Get the metrics
    pub fn metrics(&self) -> &Arc<ServerMetrics> {
        &self.metrics
    }

    /// Get the number of registered clients
    pub fn connection_count(&self) -> usize {
        self.registry.len()
    }

    /// Get a snapshot of one client
    pub fn info(&self, id: &Identity) -> Option<ConnectionInfo> {
        self.registry.get(id).map(|connection| connection.info())
    }

    /// Get snapshots of every registered client
    pub fn infos(&self) -> Vec<ConnectionInfo> {
        self.registry.infos()
    }

    /// Check if the manager has stopped admitting clients
    pub fn is_closing(&self) -> bool {
        self.closing.load(Ordering::SeqCst)
    }

    /// Handshake a freshly accepted socket and start its receive loop
    ///
    /// The identity line is written before the connection is registered, so it is always
    /// the first line the client reads. Connect callbacks fire once registration succeeds.
    #[instrument(skip(self, stream))]
    pub async fn admit(self: &Arc<Self>, stream: TcpStream) -> Result<Identity> {
        if self.is_closing() {
            return Err(ServiceError::ServerStopped);
        }
        if self.registry.len() >= self.config.max_connections {
            self.metrics.connection_rejected();
            return Err(ServiceError::MaxConnectionsReached(
                self.config.max_connections,
            ));
        }

        let (reader, writer) = wirelink_protocol::split(stream, self.config.max_line_length)?;
        let id = self.unused_identity();
        let connection = Connection::new(id, writer);

        if let Err(e) = connection.send_line(&id.to_string()).await {
            if let Err(close_err) = connection.close().await {
                debug!(%id, error = %close_err, "Close after failed handshake also failed");
            }
            return Err(e);
        }

        self.registry.insert(connection.clone());
        self.metrics.connection_opened();
        self.hub.notify_connect(id);
        info!(%id, peer_addr = %connection.peer_addr(), "Client connected");

        let worker = ConnectionWorker::new(
            connection,
            reader,
            Arc::clone(self),
            self.config.idle_timeout,
        );
        tokio::spawn(worker.run());

        // A shutdown sweep may have run between the closing check and registration.
        if self.is_closing() {
            self.kick_client(id).await?;
            return Err(ServiceError::ServerStopped);
        }

        Ok(id)
    }

    fn unused_identity(&self) -> Identity {
        loop {
            let id = Identity::generate();
            if !self.registry.contains(&id) {
                return id;
            }
        }
    }

    /// Route one inbound line from `sender`
    #[instrument(skip(self, line), fields(sender = %sender))]
    pub(crate) async fn dispatch(&self, sender: Identity, line: &str) -> Dispatch {
        let command = Command::parse(line);
        match &command {
            Command::Direct { target, payload } => match command.target_identity() {
                Some(Ok(target)) => self.forward(sender, target, payload).await,
                _ => {
                    warn!(target = %target, "Direct message with invalid target identity");
                    self.metrics.invalid_target();
                    if let Err(e) = self.send_to_client(sender, INVALID_IDENTITY_NOTICE).await {
                        warn!(error = %e, "Failed to notify sender of invalid target");
                    }
                }
            },
            Command::Global { payload } => {
                let line = Command::broadcast(sender, payload.as_str()).to_string();
                let result = self.broadcast(Some(sender), &line).await;
                self.metrics.global_message();
                debug!(
                    delivered = result.succeeded,
                    failed = result.failed,
                    "Global message relayed"
                );
            }
            Command::Disconnect => {
                info!("Client requested disconnect");
                self.remove_connection(sender).await;
                return Dispatch::Stop;
            }
            _ => {
                self.metrics.hub_message();
                self.hub.notify_message(sender, line);
            }
        }
        Dispatch::Continue
    }

    async fn forward(&self, sender: Identity, target: Identity, payload: &str) {
        let line = Command::forwarded(sender, payload).to_string();
        match self.send_to_client(target, &line).await {
            Ok(Delivery::Delivered) => self.metrics.direct_message(),
            Ok(Delivery::Dropped) => {}
            Err(e) => {
                self.metrics.message_dropped();
                warn!(%target, error = %e, "Failed to forward direct message");
            }
        }
    }

    /// Write one line to a registered client
    ///
    /// Lines addressed to an unregistered identity are dropped without error.
    pub async fn send_to_client(&self, id: Identity, line: &str) -> Result<Delivery> {
        let Some(connection) = self.registry.get(&id) else {
            debug!(%id, "Client not registered, dropping line");
            self.metrics.message_dropped();
            return Ok(Delivery::Dropped);
        };
        connection.send_line(line).await?;
        Ok(Delivery::Delivered)
    }

    /// Write one line to every registered client except `except`
    ///
    /// Writes run concurrently; a failure on one client does not affect the others.
    pub async fn broadcast(&self, except: Option<Identity>, line: &str) -> BroadcastResult {
        let mut result = BroadcastResult::default();

        let sends = self
            .registry
            .connections()
            .into_iter()
            .filter(|connection| Some(connection.id()) != except)
            .map(|connection| async move {
                let outcome = connection.send_line(line).await;
                (connection.id(), outcome)
            })
            .collect::<Vec<_>>();
        result.total = sends.len();

        for (id, outcome) in futures_util::future::join_all(sends).await {
            match outcome {
                Ok(()) => result.succeeded += 1,
                Err(e) => {
                    warn!(%id, error = %e, "Broadcast write failed");
                    result.failed += 1;
                    result.errors.push((id, e.to_string()));
                }
            }
        }

        result
    }

    /// Kick a client: send `KICK`, remove it, then close its socket
    ///
    /// Returns `Ok(false)` if the client was not registered, including when it has already
    /// been kicked. A close failure is returned after removal has completed.
    #[instrument(skip(self))]
    pub async fn kick_client(&self, id: Identity) -> Result<bool> {
        let Some(connection) = self.registry.remove(&id) else {
            warn!(%id, "Client not found or already disconnected");
            return Ok(false);
        };

        if let Err(e) = connection.send_line(KICK_LINE).await {
            warn!(%id, error = %e, "Failed to send kick notice");
        }
        self.finish_removal(&connection);
        self.metrics.client_kicked();
        info!(%id, "Client has been kicked");

        connection.close().await?;
        Ok(true)
    }

    /// Kick every registered client
    ///
    /// Returns the number of clients kicked.
    pub async fn kick_all(&self) -> usize {
        let kicks = self
            .registry
            .identities()
            .into_iter()
            .map(|id| async move { (id, self.kick_client(id).await) })
            .collect::<Vec<_>>();

        let mut kicked = 0;
        for (id, outcome) in futures_util::future::join_all(kicks).await {
            match outcome {
                Ok(true) => kicked += 1,
                Ok(false) => {}
                Err(e) => {
                    kicked += 1;
                    warn!(%id, error = %e, "Error closing kicked client");
                }
            }
        }
        kicked
    }

    /// Remove a client and close its socket
    ///
    /// Safe to call more than once; only the first call for a registration has any effect.
    /// Returns whether this call performed the removal.
    #[instrument(skip(self))]
    pub async fn remove_connection(&self, id: Identity) -> bool {
        let Some(connection) = self.registry.remove(&id) else {
            return false;
        };

        self.finish_removal(&connection);
        info!(%id, "Client disconnected");

        if let Err(e) = connection.close().await {
            warn!(%id, error = %e, "Error closing client socket");
        }
        true
    }

    fn finish_removal(&self, connection: &Connection) {
        self.metrics
            .connection_closed(connection.created_at().elapsed());
        self.hub.notify_disconnect(connection.id());
    }

    /// Stop admitting clients and kick every registered one
    pub(crate) async fn shut_down(&self) -> usize {
        self.closing.store(true, Ordering::SeqCst);
        self.kick_all().await
    }
}
