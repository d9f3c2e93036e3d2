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

//! Error types for the line protocol

use thiserror::Error;

/// Result type for protocol operations
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors raised while encoding, decoding or transporting protocol lines
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// I/O error from the underlying stream
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Text that should have been an identity could not be parsed
    #[error("Invalid identity: {0:?}")]
    InvalidIdentity(String),

    /// An outgoing line contained a line terminator
    #[error("Line contains an embedded line terminator")]
    EmbeddedNewline,

    /// An outgoing line exceeded the configured maximum length
    #[error("Line exceeds maximum length of {0} bytes")]
    LineTooLong(usize),

    /// The stream has already been closed
    #[error("Stream closed")]
    Closed,
}

impl ProtocolError {
    /// Check if the error indicates the stream is no longer usable
    pub fn is_connection_error(&self) -> bool {
        matches!(self, ProtocolError::Io(_) | ProtocolError::Closed)
    }
}
