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

//! Split line transport over a TCP stream
//!
//! [`split`] turns a connected [`TcpStream`] into a [`LineReader`] owned by a single receive
//! loop and a cloneable [`LineWriter`] that any task may use. Writes are serialized through a
//! mutex so concurrent senders never interleave bytes on the wire. Both halves share a
//! cancellation token: closing the writer also ends the reader, the same way closing a socket
//! unblocks a thread parked in `read`.

use crate::{LineCodec, ProtocolError, ProtocolResult};
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::Mutex;
use tokio_util::codec::{FramedRead, FramedWrite};
use tokio_util::sync::CancellationToken;
use tracing::{instrument, trace};

/// Split a connected stream into line-oriented halves
pub fn split(
    stream: TcpStream,
    max_line_length: usize,
) -> ProtocolResult<(LineReader, LineWriter)> {
    let peer_addr = stream.peer_addr()?;
    let (read_half, write_half) = stream.into_split();
    let closed = CancellationToken::new();

    let reader = LineReader {
        inner: FramedRead::new(read_half, LineCodec::with_max_length(max_line_length)),
        closed: closed.clone(),
    };
    let writer = LineWriter {
        sink: Arc::new(Mutex::new(FramedWrite::new(
            write_half,
            LineCodec::with_max_length(max_line_length),
        ))),
        closed,
        peer_addr,
    };

    Ok((reader, writer))
}

/// Receiving half of a line transport
#[derive(Debug)]
pub struct LineReader {
    inner: FramedRead<OwnedReadHalf, LineCodec>,
    closed: CancellationToken,
}

impl LineReader {
    /// Read the next line
    ///
    /// Returns `None` once the peer closes the stream or the paired [`LineWriter`] is closed.
    pub async fn next_line(&mut self) -> Option<ProtocolResult<String>> {
        tokio::select! {
            biased;
            _ = self.closed.cancelled() => None,
            next = self.inner.next() => next,
        }
    }

    /// Check if the paired writer has been closed
    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }
}

/// Sending half of a line transport
///
/// Cloning is cheap; every clone writes to the same stream.
#[derive(Clone)]
pub struct LineWriter {
    sink: Arc<Mutex<FramedWrite<OwnedWriteHalf, LineCodec>>>,
    closed: CancellationToken,
    peer_addr: SocketAddr,
}

impl LineWriter {
    /// Address of the remote end
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// Write one line and flush it
    #[instrument(level = "trace", skip(self, line), fields(peer = %self.peer_addr))]
    pub async fn send_line(&self, line: &str) -> ProtocolResult<()> {
        if self.closed.is_cancelled() {
            return Err(ProtocolError::Closed);
        }
        let mut sink = self.sink.lock().await;
        // Re-check under the lock; close() may have won the race.
        if self.closed.is_cancelled() {
            return Err(ProtocolError::Closed);
        }
        sink.send(line).await?;
        trace!("Line sent");
        Ok(())
    }

    /// Close the stream
    ///
    /// Ends the paired reader and shuts down the write direction. Closing an already closed
    /// writer is a no-op.
    #[instrument(level = "trace", skip(self), fields(peer = %self.peer_addr))]
    pub async fn close(&self) -> ProtocolResult<()> {
        if self.closed.is_cancelled() {
            return Ok(());
        }
        self.closed.cancel();
        let mut sink = self.sink.lock().await;
        SinkExt::<&str>::close(&mut *sink).await
    }

    /// Check if the writer has been closed
    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }
}

impl std::fmt::Debug for LineWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineWriter")
            .field("peer_addr", &self.peer_addr)
            .field("closed", &self.is_closed())
            .finish()
    }
}
