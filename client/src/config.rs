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

//! Client configuration

use crate::{ClientError, Result};
use std::time::Duration;
use wirelink_protocol::DEFAULT_MAX_LINE_LENGTH;

/// Relay client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server hostname or IP address
    pub host: String,

    /// Server port
    pub port: u16,

    /// Connection attempts made by one `connect()` call
    pub max_retries: u32,

    /// Delay between consecutive connection attempts
    pub retry_delay: Duration,

    /// Bound on a single attempt, including the handshake read (None for no timeout)
    pub connect_timeout: Option<Duration>,

    /// Longest inbound line accepted, in bytes
    pub max_line_length: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 7070,
            max_retries: 3,
            retry_delay: Duration::from_secs(1),
            connect_timeout: Some(Duration::from_secs(10)),
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
        }
    }
}

impl ClientConfig {
    /// Create a new client configuration for the given server
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Set the number of connection attempts
    pub fn with_max_retries(mut self, max: u32) -> Self {
        self.max_retries = max;
        self
    }

    /// Set the delay between connection attempts
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Set the per-attempt timeout
    pub fn with_connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the maximum inbound line length
    pub fn with_max_line_length(mut self, length: usize) -> Self {
        self.max_line_length = length;
        self
    }

    /// Get the server address as "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Validate the configuration
    ///
    /// `max_retries == 0` is valid: `connect()` then makes no attempt at all.
    pub fn validate(&self) -> Result<()> {
        if self.host.is_empty() {
            return Err(ClientError::InvalidConfig("host must not be empty".to_string()));
        }
        if self.max_line_length == 0 {
            return Err(ClientError::InvalidConfig(
                "max_line_length must be greater than 0".to_string(),
            ));
        }
        if self.connect_timeout == Some(Duration::ZERO) {
            return Err(ClientError::InvalidConfig(
                "connect_timeout must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
