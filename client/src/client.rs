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

//! Relay client implementation

use crate::{ClientConfig, ClientError, ClientHub, Result};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, instrument, warn};
use wirelink_protocol::{Command, Identity, LineReader, LineWriter};

/// Line sent to the server before a voluntary close
const DISCONNECT_LINE: &str = "DISCONNECT";

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ConnectionState {
    /// Not connected
    Disconnected = 0,
    /// A `connect()` call is making attempts
    Connecting = 1,
    /// Handshake complete, receive loop running
    Connected = 2,
}

impl ConnectionState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Connecting,
            2 => Self::Connected,
            _ => Self::Disconnected,
        }
    }
}

/// An established connection
struct Session {
    id: Identity,
    writer: LineWriter,
    receiver: JoinHandle<()>,
}

/// State shared between the client handle and its receive loop
struct Shared {
    hub: ClientHub,
    state: AtomicU8,
    session: Mutex<Option<Session>>,
    identity: Mutex<Option<Identity>>,
    /// Serializes `connect()` and `disconnect()`
    transition: tokio::sync::Mutex<()>,
}

impl Shared {
    fn session(&self) -> MutexGuard<'_, Option<Session>> {
        self.session.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn set_state(&self, state: ConnectionState) {
        self.state.store(state as u8, Ordering::SeqCst);
    }

    fn set_identity(&self, id: Identity) {
        *self
            .identity
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(id);
    }

    /// Clear the session if it is still the one identified by `id`
    fn end_session(&self, id: Identity) {
        let mut session = self.session();
        if session.as_ref().is_some_and(|current| current.id == id) {
            *session = None;
            self.set_state(ConnectionState::Disconnected);
        }
    }
}

/// Relay client
///
/// Connects to a [`LinkServer`](https://docs.rs/wirelink-service), learns the identity the
/// server assigned to it, and exchanges lines with other clients through the server.
///
/// # Example
///
/// ```no_run
/// use wirelink_client::{ClientConfig, LinkClient};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = LinkClient::new(ClientConfig::new("localhost", 7070));
///     client.subscribe(|line| println!("{line}"));
///     client.on_kick(|| println!("kicked"));
///
///     let id = client.connect().await?;
///     println!("connected as {id}");
///     client.send_broadcast("hello everyone").await?;
///     client.disconnect().await?;
///     Ok(())
/// }
/// ```
pub struct LinkClient {
    config: ClientConfig,
    shared: Arc<Shared>,
}

impl LinkClient {
    /// Create a disconnected client
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            shared: Arc::new(Shared {
                hub: ClientHub::new(),
                state: AtomicU8::new(ConnectionState::Disconnected as u8),
                session: Mutex::new(None),
                identity: Mutex::new(None),
                transition: tokio::sync::Mutex::new(()),
            }),
        }
    }

    /// Get the client configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Get the subscriber hub
    pub fn hub(&self) -> &ClientHub {
        &self.shared.hub
    }

    /// Get the current connection state
    pub fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.shared.state.load(Ordering::SeqCst))
    }

    /// Check if the client is connected
    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Get the identity most recently assigned by the server
    ///
    /// `None` until the first successful connect; kept after a disconnect.
    pub fn identity(&self) -> Option<Identity> {
        *self
            .shared
            .identity
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Receive every line from the server except the kick signal
    pub fn subscribe<F>(&self, callback: F)
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.shared.hub.subscribe(callback);
    }

    /// Be told when the server kicks this client
    pub fn on_kick<F>(&self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.shared.hub.on_kick(callback);
    }

    /// Connect to the server
    ///
    /// Makes up to `max_retries` attempts, sleeping `retry_delay` between them. An attempt
    /// fails if the socket cannot be opened or the server's first line is not a valid identity.
    /// Returns [`ClientError::RetriesExhausted`] when every attempt fails. Calling `connect` on
    /// a connected client returns the current identity without reconnecting.
    #[instrument(skip(self), fields(server = %self.config.address()))]
    pub async fn connect(&self) -> Result<Identity> {
        self.config.validate()?;
        let _transition = self.shared.transition.lock().await;

        if let Some(session) = self.shared.session().as_ref() {
            debug!(id = %session.id, "Already connected");
            return Ok(session.id);
        }

        self.shared.set_state(ConnectionState::Connecting);
        let max = self.config.max_retries;
        let mut attempt = 0;

        while attempt < max {
            attempt += 1;
            match self.establish().await {
                Ok((id, reader, writer)) => {
                    self.install_session(id, reader, writer);
                    info!(%id, "Connected to server");
                    return Ok(id);
                }
                Err(e) => {
                    warn!(error = %e, "Connection failed. Attempt {}/{}", attempt, max);
                    if attempt < max {
                        sleep(self.config.retry_delay).await;
                    }
                }
            }
        }

        self.shared.set_state(ConnectionState::Disconnected);
        error!("Max retries reached. Could not connect to the server.");
        Err(ClientError::RetriesExhausted(attempt))
    }

    /// One connection attempt: open the socket and read the handshake line
    async fn establish(&self) -> Result<(Identity, LineReader, LineWriter)> {
        let attempt = async {
            let stream = TcpStream::connect(self.config.address()).await?;
            let (mut reader, writer) =
                wirelink_protocol::split(stream, self.config.max_line_length)?;

            let line = match reader.next_line().await {
                Some(line) => line?,
                None => return Err(ClientError::ConnectionClosed),
            };
            let id = line
                .parse::<Identity>()
                .map_err(|_| ClientError::HandshakeFailed(line))?;
            Ok::<_, ClientError>((id, reader, writer))
        };

        match self.config.connect_timeout {
            Some(limit) => timeout(limit, attempt)
                .await
                .map_err(|_| ClientError::ConnectionTimeout)?,
            None => attempt.await,
        }
    }

    fn install_session(&self, id: Identity, reader: LineReader, writer: LineWriter) {
        // Hold the session lock across the spawn so the receive loop cannot end its session
        // before it has been installed.
        let mut session = self.shared.session();
        let receiver = tokio::spawn(receive_loop(
            self.shared.clone(),
            id,
            reader,
            writer.clone(),
        ));
        *session = Some(Session {
            id,
            writer,
            receiver,
        });
        self.shared.set_identity(id);
        self.shared.set_state(ConnectionState::Connected);
    }

    fn writer(&self) -> Result<LineWriter> {
        self.shared
            .session()
            .as_ref()
            .map(|session| session.writer.clone())
            .ok_or(ClientError::NotConnected)
    }

    /// Send one raw line
    pub async fn send(&self, line: &str) -> Result<()> {
        self.writer()?.send_line(line).await?;
        Ok(())
    }

    /// Send `payload` to the client with identity `target`
    pub async fn send_to(&self, target: Identity, payload: &str) -> Result<()> {
        self.send(&Command::direct(target, payload).to_string()).await
    }

    /// Send `payload` to every other connected client
    pub async fn send_broadcast(&self, payload: &str) -> Result<()> {
        self.send(&Command::global(payload).to_string()).await
    }

    /// Disconnect from the server
    ///
    /// Sends `DISCONNECT`, closes the stream and waits for the receive loop to finish.
    /// Disconnecting a client that is not connected does nothing.
    #[instrument(skip(self))]
    pub async fn disconnect(&self) -> Result<()> {
        let _transition = self.shared.transition.lock().await;

        let Some(session) = self.shared.session().take() else {
            debug!("Not connected, nothing to disconnect");
            return Ok(());
        };
        self.shared.set_state(ConnectionState::Disconnected);

        if let Err(e) = session.writer.send_line(DISCONNECT_LINE).await {
            warn!(error = %e, "Failed to send disconnect notice");
        }
        let closed = session.writer.close().await;

        if let Err(e) = session.receiver.await {
            warn!(error = %e, "Receive loop ended abnormally");
        }
        info!(id = %session.id, "Disconnected from server");

        closed?;
        Ok(())
    }
}

impl std::fmt::Debug for LinkClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkClient")
            .field("server", &self.config.address())
            .field("state", &self.state())
            .field("identity", &self.identity())
            .finish()
    }
}

impl Drop for LinkClient {
    fn drop(&mut self) {
        if let Some(session) = self.shared.session().take() {
            debug!(id = %session.id, "LinkClient dropped while connected");
            session.receiver.abort();
        }
    }
}

#[instrument(skip_all, fields(id = %id))]
async fn receive_loop(
    shared: Arc<Shared>,
    id: Identity,
    mut reader: LineReader,
    writer: LineWriter,
) {
    loop {
        match reader.next_line().await {
            Some(Ok(line)) => {
                if Command::parse(&line).is_kick() {
                    info!("Kicked by server");
                    shared.hub.notify_kick();
                    if let Err(e) = writer.close().await {
                        warn!(error = %e, "Error closing connection after kick");
                    }
                    break;
                }
                shared.hub.notify_message(&line);
            }
            Some(Err(e)) => {
                warn!(error = %e, "Read failed");
                break;
            }
            None => {
                debug!("Connection closed");
                break;
            }
        }
    }
    shared.end_session(id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tracing_test::traced_test;

    #[test]
    fn test_state_conversion() {
        for state in [
            ConnectionState::Disconnected,
            ConnectionState::Connecting,
            ConnectionState::Connected,
        ] {
            assert_eq!(ConnectionState::from_u8(state as u8), state);
        }
        assert_eq!(ConnectionState::from_u8(42), ConnectionState::Disconnected);
    }

    #[tokio::test]
    #[traced_test]
    async fn test_retry_attempts_are_logged() {
        let addr = {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap()
        };
        let config = ClientConfig::new(addr.ip().to_string(), addr.port())
            .with_max_retries(2)
            .with_retry_delay(Duration::from_millis(10));
        let client = LinkClient::new(config);

        assert!(matches!(
            client.connect().await,
            Err(ClientError::RetriesExhausted(2))
        ));
        assert!(logs_contain("Connection failed. Attempt 1/2"));
        assert!(logs_contain("Connection failed. Attempt 2/2"));
        assert!(logs_contain("Max retries reached"));
    }

    #[tokio::test]
    async fn test_invalid_config_fails_before_attempting() {
        let client = LinkClient::new(ClientConfig::new("", 7070));
        assert!(matches!(
            client.connect().await,
            Err(ClientError::InvalidConfig(_))
        ));
        assert_eq!(client.state(), ConnectionState::Disconnected);
    }
}
