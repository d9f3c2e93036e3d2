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

//! Connection identities

use crate::ProtocolError;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Opaque 128-bit token naming one connection
///
/// Identities are generated by the server when it accepts a connection and travel on the wire
/// in their canonical 36 character hyphenated form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identity(Uuid);

impl Identity {
    /// Length of the canonical textual form
    pub const TEXT_LENGTH: usize = 36;

    /// Generate a new random identity
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0.hyphenated(), f)
    }
}

impl FromStr for Identity {
    type Err = ProtocolError;

    /// Parse the canonical hyphenated form, ignoring surrounding whitespace
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        // Uuid::parse_str also accepts simple, braced and urn forms; the wire only allows one.
        if trimmed.len() != Self::TEXT_LENGTH {
            return Err(ProtocolError::InvalidIdentity(s.to_string()));
        }
        Uuid::parse_str(trimmed)
            .map(Self)
            .map_err(|_| ProtocolError::InvalidIdentity(s.to_string()))
    }
}

impl From<Uuid> for Identity {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}
