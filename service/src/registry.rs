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

//! Identity to connection registry

use crate::{Connection, ConnectionInfo};
use dashmap::DashMap;
use wirelink_protocol::Identity;

/// Concurrent map of registered clients
///
/// Lookups return cloned handles so no shard lock is ever held across an await.
#[derive(Debug, Default)]
pub struct Registry {
    connections: DashMap<Identity, Connection>,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection, returning any connection previously stored under its identity
    pub fn insert(&self, connection: Connection) -> Option<Connection> {
        self.connections.insert(connection.id(), connection)
    }

    /// Remove a connection
    ///
    /// Only one caller ever receives `Some` for a given registration.
    pub fn remove(&self, id: &Identity) -> Option<Connection> {
        self.connections.remove(id).map(|(_, connection)| connection)
    }

    /// Look up a connection
    pub fn get(&self, id: &Identity) -> Option<Connection> {
        self.connections.get(id).map(|entry| entry.value().clone())
    }

    /// Check if an identity is registered
    pub fn contains(&self, id: &Identity) -> bool {
        self.connections.contains_key(id)
    }

    /// Identities registered at the time of the call
    pub fn identities(&self) -> Vec<Identity> {
        self.connections.iter().map(|entry| *entry.key()).collect()
    }

    /// Handles for every registered connection
    pub fn connections(&self) -> Vec<Connection> {
        self.connections
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Snapshots of every registered connection
    pub fn infos(&self) -> Vec<ConnectionInfo> {
        self.connections
            .iter()
            .map(|entry| entry.value().info())
            .collect()
    }

    /// Number of registered connections
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Check if no connections are registered
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}
