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

//! Client error types

use std::io;
use thiserror::Error;
use wirelink_protocol::ProtocolError;

/// Client error type
#[derive(Debug, Error)]
pub enum ClientError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[source] io::Error),

    /// Connection refused
    #[error("Connection refused")]
    ConnectionRefused,

    /// Connection closed by server
    #[error("Connection closed by server")]
    ConnectionClosed,

    /// A connection attempt did not complete in time
    #[error("Connection timeout")]
    ConnectionTimeout,

    /// Protocol or transport error
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The server's first line was not a valid identity
    #[error("Handshake failed: expected an identity, got {0:?}")]
    HandshakeFailed(String),

    /// Not connected
    #[error("Not connected")]
    NotConnected,

    /// Every connection attempt failed
    #[error("Connection failed after {0} attempts")]
    RetriesExhausted(u32),

    /// Configuration failed validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ClientError {
    /// Check if another connection attempt could succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Io(_)
                | Self::ConnectionRefused
                | Self::ConnectionClosed
                | Self::ConnectionTimeout
                | Self::HandshakeFailed(_)
        ) || matches!(self, Self::Protocol(e) if e.is_connection_error())
    }
}

impl From<io::Error> for ClientError {
    fn from(error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::TimedOut => Self::ConnectionTimeout,
            io::ErrorKind::ConnectionRefused => Self::ConnectionRefused,
            io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::UnexpectedEof => Self::ConnectionClosed,
            _ => Self::Io(error),
        }
    }
}

/// Client result type
pub type Result<T> = std::result::Result<T, ClientError>;
