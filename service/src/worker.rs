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

//! Per-connection receive loop
//!
//! Each registered client gets one worker task. The worker reads lines until the client
//! leaves, the socket fails, the idle timeout elapses, or another path closes the socket,
//! then hands the identity to [`ConnectionManager::remove_connection`].

use crate::manager::Dispatch;
use crate::{Connection, ConnectionManager};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};
use wirelink_protocol::{LineReader, ProtocolError};

/// Why a receive loop ended
#[derive(Debug)]
enum Exit {
    /// Client sent `DISCONNECT`; removal already happened during dispatch
    Requested,
    /// Peer closed the stream or the socket was closed locally
    Closed,
    /// No line arrived within the idle timeout
    Idle,
    /// Read failed
    Failed(ProtocolError),
}

pub(crate) struct ConnectionWorker {
    connection: Connection,
    reader: LineReader,
    manager: Arc<ConnectionManager>,
    idle_timeout: Option<Duration>,
}

impl ConnectionWorker {
    pub(crate) fn new(
        connection: Connection,
        reader: LineReader,
        manager: Arc<ConnectionManager>,
        idle_timeout: Option<Duration>,
    ) -> Self {
        Self {
            connection,
            reader,
            manager,
            idle_timeout,
        }
    }

    #[instrument(skip(self), fields(connection_id = %self.connection.id()))]
    pub(crate) async fn run(mut self) {
        let exit = self.receive_loop().await;
        let id = self.connection.id();

        match exit {
            Exit::Requested => return,
            Exit::Closed => debug!("Stream closed"),
            Exit::Idle => info!("Idle timeout elapsed, closing connection"),
            Exit::Failed(e) => warn!(error = %e, "Read failed"),
        }

        self.manager.remove_connection(id).await;
    }

    async fn receive_loop(&mut self) -> Exit {
        loop {
            let next = match self.idle_timeout {
                Some(limit) => match timeout(limit, self.reader.next_line()).await {
                    Ok(next) => next,
                    Err(_) => return Exit::Idle,
                },
                None => self.reader.next_line().await,
            };

            match next {
                Some(Ok(line)) => {
                    self.connection.record_received();
                    let flow = self
                        .manager
                        .dispatch(self.connection.id(), &line)
                        .await;
                    if flow == Dispatch::Stop {
                        return Exit::Requested;
                    }
                }
                Some(Err(e)) => return Exit::Failed(e),
                None => return Exit::Closed,
            }
        }
    }
}
