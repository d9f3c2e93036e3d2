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

//! Server configuration
//!
//! # Example
//!
//! ```
//! use wirelink_service::ServerConfig;
//! use std::time::Duration;
//!
//! let config = ServerConfig::for_port(4000)
//!     .with_max_connections(250)
//!     .with_idle_timeout(Some(Duration::from_secs(600)));
//! assert!(config.validate().is_ok());
//! ```

use crate::{Result, ServiceError};
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;
use wirelink_protocol::DEFAULT_MAX_LINE_LENGTH;

/// Port used by [`ServerConfig::default`]
pub const DEFAULT_PORT: u16 = 7070;

/// Relay server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_address: SocketAddr,

    /// Maximum number of concurrent connections
    ///
    /// Connections accepted beyond this limit are closed immediately.
    pub max_connections: usize,

    /// Close a connection after this long without an inbound line (None disables)
    pub idle_timeout: Option<Duration>,

    /// Longest inbound line accepted, in bytes
    pub max_line_length: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::for_port(DEFAULT_PORT)
    }
}

impl ServerConfig {
    /// Create a new server configuration bound to `bind_address`
    pub fn new(bind_address: SocketAddr) -> Self {
        Self {
            bind_address,
            max_connections: 1000,
            idle_timeout: None,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
        }
    }

    /// Listen on every IPv4 interface at `port`
    pub fn for_port(port: u16) -> Self {
        Self::new(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)))
    }

    /// Set the bind address
    pub fn with_bind_address(mut self, addr: SocketAddr) -> Self {
        self.bind_address = addr;
        self
    }

    /// Set the maximum number of connections
    pub fn with_max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    /// Set the idle timeout
    pub fn with_idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Set the maximum inbound line length
    pub fn with_max_line_length(mut self, length: usize) -> Self {
        self.max_line_length = length;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_connections == 0 {
            return Err(ServiceError::InvalidConfig(
                "max_connections must be greater than 0".to_string(),
            ));
        }
        if self.max_line_length == 0 {
            return Err(ServiceError::InvalidConfig(
                "max_line_length must be greater than 0".to_string(),
            ));
        }
        if self.idle_timeout == Some(Duration::ZERO) {
            return Err(ServiceError::InvalidConfig(
                "idle_timeout must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
