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

//! Error types for the Wirelink server

use std::net::SocketAddr;
use thiserror::Error;
use wirelink_protocol::ProtocolError;

/// Result type for server operations
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Server error types
#[derive(Debug, Error)]
pub enum ServiceError {
    /// I/O error from the underlying TCP stream
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Protocol or transport error on a single connection
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The listening socket could not be opened
    #[error("Failed to bind {address}: {source}")]
    Bind {
        /// Requested bind address
        address: SocketAddr,
        /// Underlying error
        source: std::io::Error,
    },

    /// The accept loop failed and the server stopped listening
    #[error("Failed to accept connection: {0}")]
    Accept(#[source] std::io::Error),

    /// `start()` was called while the accept loop is already running
    #[error("Server already running")]
    AlreadyRunning,

    /// The server has been stopped and cannot accept connections again
    #[error("Server stopped")]
    ServerStopped,

    /// Maximum number of connections reached
    #[error("Maximum connections ({0}) reached")]
    MaxConnectionsReached(usize),

    /// Configuration failed validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ServiceError {
    /// Check if the error is recoverable
    ///
    /// Recoverable errors affect a single connection; the server keeps running.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ServiceError::Io(_)
                | ServiceError::Protocol(_)
                | ServiceError::MaxConnectionsReached(_)
        )
    }

    /// Check if the error is a connection error
    pub fn is_connection_error(&self) -> bool {
        match self {
            ServiceError::Io(_) => true,
            ServiceError::Protocol(e) => e.is_connection_error(),
            _ => false,
        }
    }
}
