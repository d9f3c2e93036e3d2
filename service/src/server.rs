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

//! Relay server
//!
//! The [`LinkServer`] owns the listening socket and the accept loop and coordinates with the
//! [`ConnectionManager`], which handles everything after a socket is accepted.

use crate::{
    BroadcastResult, ConnectionInfo, ConnectionManager, Delivery, Result, ServerConfig,
    ServerMetrics, ServerSnapshot, ServiceError,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tokio::net::TcpListener;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use wirelink_protocol::Identity;

/// Line relay server
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use wirelink_service::{LinkServer, ServerConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let server = Arc::new(LinkServer::bind(ServerConfig::for_port(7070)).await?);
///     server.subscribe(|sender, line| println!("{sender}: {line}"));
///
///     let accept_loop = server.spawn();
///     tokio::signal::ctrl_c().await?;
///     server.stop().await;
///     accept_loop.await??;
///     Ok(())
/// }
/// ```
pub struct LinkServer {
    /// Server configuration
    config: ServerConfig,
    /// Connection manager
    manager: Arc<ConnectionManager>,
    /// Server metrics
    metrics: Arc<ServerMetrics>,
    /// Listening socket until the accept loop takes ownership of it
    listener: Mutex<Option<TcpListener>>,
    /// Actual bind address
    bind_address: SocketAddr,
    /// Server start time
    started_at: Instant,
    /// Set while the accept loop is running
    running: AtomicBool,
    /// Cancelled once by `stop()`
    shutdown: CancellationToken,
    /// Flips to true when the accept loop has dropped the listener
    listener_closed: watch::Sender<bool>,
}

impl LinkServer {
    /// Bind the listening socket
    ///
    /// Connections queue in the socket backlog until [`LinkServer::start`] runs the accept loop.
    pub async fn bind(config: ServerConfig) -> Result<Self> {
        config.validate()?;

        let listener = TcpListener::bind(config.bind_address)
            .await
            .map_err(|source| ServiceError::Bind {
                address: config.bind_address,
                source,
            })?;
        let actual_addr = listener.local_addr()?;

        let metrics = Arc::new(ServerMetrics::new());
        let manager = Arc::new(ConnectionManager::new(config.clone(), metrics.clone()));

        info!("Wirelink server bound to {}", actual_addr);

        Ok(Self {
            config,
            manager,
            metrics,
            listener: Mutex::new(Some(listener)),
            bind_address: actual_addr,
            started_at: Instant::now(),
            running: AtomicBool::new(false),
            shutdown: CancellationToken::new(),
            listener_closed: watch::Sender::new(false),
        })
    }

    /// Run the accept loop until [`LinkServer::stop`] is called
    ///
    /// Returns `Ok(())` after a stop. An accept failure ends the loop with
    /// [`ServiceError::Accept`]; failures on individual connections never do.
    pub async fn start(&self) -> Result<()> {
        let listener = {
            let mut slot = self.listener.lock().await;
            if self.shutdown.is_cancelled() {
                return Err(ServiceError::ServerStopped);
            }
            if self.running.swap(true, Ordering::SeqCst) {
                return Err(ServiceError::AlreadyRunning);
            }
            match slot.take() {
                Some(listener) => listener,
                None => {
                    self.running.store(false, Ordering::SeqCst);
                    return Err(ServiceError::ServerStopped);
                }
            }
        };

        info!("Starting Wirelink server on {}", self.bind_address);
        let result = self.accept_loop(listener).await;

        self.running.store(false, Ordering::SeqCst);
        self.listener_closed.send_replace(true);
        info!("Accept loop terminated");
        result
    }

    /// Run [`LinkServer::start`] on a new task
    pub fn spawn(self: &Arc<Self>) -> JoinHandle<Result<()>> {
        let server = Arc::clone(self);
        tokio::spawn(async move { server.start().await })
    }

    async fn accept_loop(&self, listener: TcpListener) -> Result<()> {
        loop {
            let accepted = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => return Ok(()),
                accepted = listener.accept() => accepted,
            };

            match accepted {
                Ok((socket, peer_addr)) => {
                    debug!("Accepted connection from {}", peer_addr);
                    match self.manager.admit(socket).await {
                        Ok(id) => debug!(%id, %peer_addr, "Handshake complete"),
                        Err(ServiceError::MaxConnectionsReached(max)) => warn!(
                            "Connection limit reached ({}), rejecting connection from {}",
                            max, peer_addr
                        ),
                        Err(e) => warn!(%peer_addr, error = %e, "Failed to admit connection"),
                    }
                }
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                    return Err(ServiceError::Accept(e));
                }
            }
        }
    }

    /// Stop the server
    ///
    /// Kicks every registered client, then closes the listening socket. Returns once the
    /// listener has been released; a later connection attempt is refused. Calling `stop`
    /// again has no effect.
    pub async fn stop(&self) {
        if self.shutdown.is_cancelled() {
            return;
        }
        info!("Shutting down Wirelink server");
        self.running.store(false, Ordering::SeqCst);

        let kicked = self.manager.shut_down().await;
        self.shutdown.cancel();

        // Either drop the listener ourselves or wait for the accept loop to drop it.
        if self.listener.lock().await.take().is_none() {
            let mut closed = self.listener_closed.subscribe();
            if closed.wait_for(|closed| *closed).await.is_err() {
                warn!("Listener state channel closed before shutdown completed");
            }
        }

        info!(kicked, "Wirelink server shutdown complete");
    }

    /// Receive lines that the server does not route itself
    pub fn subscribe<F>(&self, callback: F)
    where
        F: Fn(Identity, &str) + Send + Sync + 'static,
    {
        self.manager.hub().subscribe(callback);
    }

    /// Be told when a client finishes its handshake
    pub fn on_client_connect<F>(&self, callback: F)
    where
        F: Fn(Identity) + Send + Sync + 'static,
    {
        self.manager.hub().on_client_connect(callback);
    }

    /// Be told when a client is removed
    pub fn on_client_disconnect<F>(&self, callback: F)
    where
        F: Fn(Identity) + Send + Sync + 'static,
    {
        self.manager.hub().on_client_disconnect(callback);
    }

    /// Write one line to a client, if it is registered
    pub async fn send_to_client(&self, id: Identity, line: &str) -> Result<Delivery> {
        self.manager.send_to_client(id, line).await
    }

    /// Write one line to every registered client
    pub async fn broadcast(&self, line: &str) -> BroadcastResult {
        self.manager.broadcast(None, line).await
    }

    /// Kick a client
    ///
    /// Returns `Ok(false)` if no such client is registered.
    pub async fn kick_client(&self, id: Identity) -> Result<bool> {
        self.manager.kick_client(id).await
    }

    /// Check if the accept loop is running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Get the address the server is listening on
    pub fn local_addr(&self) -> SocketAddr {
        self.bind_address
    }

    /// Get the number of registered clients
    pub fn connection_count(&self) -> usize {
        self.manager.connection_count()
    }

    /// Get identities of every registered client
    pub fn identities(&self) -> Vec<Identity> {
        self.manager.registry().identities()
    }

    /// Get a snapshot of one client
    pub fn connection_info(&self, id: &Identity) -> Option<ConnectionInfo> {
        self.manager.info(id)
    }

    /// Get a snapshot of the server state
    pub fn snapshot(&self) -> ServerSnapshot {
        ServerSnapshot {
            active_connections: self.manager.connection_count(),
            total_connections: self.metrics.total_connections(),
            bind_address: self.bind_address,
            running: self.is_running(),
            uptime: self.started_at.elapsed(),
            started_at: self.started_at,
        }
    }

    /// Get the server metrics
    pub fn metrics(&self) -> Arc<ServerMetrics> {
        self.metrics.clone()
    }

    /// Get the connection manager
    pub fn manager(&self) -> Arc<ConnectionManager> {
        self.manager.clone()
    }

    /// Get the server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

impl std::fmt::Debug for LinkServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkServer")
            .field("bind_address", &self.bind_address)
            .field("running", &self.is_running())
            .field("connection_count", &self.connection_count())
            .field("uptime", &self.started_at.elapsed())
            .finish()
    }
}

impl Drop for LinkServer {
    fn drop(&mut self) {
        if self.running.load(Ordering::SeqCst) {
            warn!("LinkServer dropped while still running");
            self.running.store(false, Ordering::SeqCst);
            self.shutdown.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::net::TcpStream;
    use tracing_test::traced_test;

    fn local_config() -> ServerConfig {
        ServerConfig::new("127.0.0.1:0".parse().unwrap())
    }

    async fn wait_until_running(server: &LinkServer) {
        while !server.is_running() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    #[tokio::test]
    async fn test_server_lifecycle() {
        let server = Arc::new(LinkServer::bind(local_config()).await.unwrap());
        assert!(!server.is_running());
        assert_ne!(server.local_addr().port(), 0);

        let accept_loop = server.spawn();
        wait_until_running(&server).await;

        server.stop().await;
        assert!(!server.is_running());
        accept_loop.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_server_snapshot() {
        let server = LinkServer::bind(local_config()).await.unwrap();
        let snapshot = server.snapshot();

        assert_eq!(snapshot.active_connections, 0);
        assert_eq!(snapshot.total_connections, 0);
        assert!(!snapshot.running);
    }

    #[tokio::test]
    async fn test_server_double_start() {
        let server = Arc::new(LinkServer::bind(local_config()).await.unwrap());
        let accept_loop = server.spawn();
        wait_until_running(&server).await;

        assert!(matches!(
            server.start().await,
            Err(ServiceError::AlreadyRunning)
        ));

        server.stop().await;
        accept_loop.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_start_after_stop_fails() {
        let server = LinkServer::bind(local_config()).await.unwrap();
        server.stop().await;
        server.stop().await;

        assert!(matches!(server.start().await, Err(ServiceError::ServerStopped)));
    }

    #[tokio::test]
    async fn test_stop_closes_listener_without_start() {
        let server = LinkServer::bind(local_config()).await.unwrap();
        let addr = server.local_addr();
        server.stop().await;

        assert!(TcpStream::connect(addr).await.is_err());
    }

    #[tokio::test]
    async fn test_bind_conflict_is_fatal() {
        let first = LinkServer::bind(local_config()).await.unwrap();
        let taken = local_config().with_bind_address(first.local_addr());

        assert!(matches!(
            LinkServer::bind(taken).await,
            Err(ServiceError::Bind { .. })
        ));
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let config = local_config().with_max_connections(0);
        assert!(matches!(
            LinkServer::bind(config).await,
            Err(ServiceError::InvalidConfig(_))
        ));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_kick_is_logged() {
        let server = Arc::new(LinkServer::bind(local_config()).await.unwrap());
        let accept_loop = server.spawn();

        let stream = TcpStream::connect(server.local_addr()).await.unwrap();
        let (mut reader, _writer) = wirelink_protocol::split(stream, 1024).unwrap();
        let id: Identity = reader.next_line().await.unwrap().unwrap().parse().unwrap();
        while server.connection_info(&id).is_none() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        assert!(server.kick_client(id).await.unwrap());
        assert_eq!(reader.next_line().await.unwrap().unwrap(), "KICK");
        assert!(logs_contain("Client has been kicked"));

        server.stop().await;
        accept_loop.await.unwrap().unwrap();
        assert!(logs_contain("Wirelink server shutdown complete"));
    }
}
