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

//! Command grammar
//!
//! Each line received on an established connection decodes into exactly one [`Command`]. The
//! decode step is total: a line that does not match any keyword form becomes
//! [`Command::Other`] and is handed to the host application untouched.

use crate::{Identity, ProtocolResult};
use std::fmt;

/// Notice sent back to a client whose directed command named a malformed identity
pub const INVALID_IDENTITY_NOTICE: &str = "Invalid UUID format.";

const TO: &str = "TO ";
const FROM: &str = "FROM ";
const GLOBAL: &str = "GLOBAL";
const DISCONNECT: &str = "DISCONNECT";
const KICK: &str = "KICK";

/// A decoded protocol line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `TO <target>: <payload>` - deliver the payload to a single identity
    ///
    /// The target is kept as received; use [`Command::target_identity`] to validate it.
    Direct {
        /// Target identity text
        target: String,
        /// Message payload
        payload: String,
    },
    /// `GLOBAL: <payload>` - deliver the payload to every other connection
    Global {
        /// Message payload
        payload: String,
    },
    /// `DISCONNECT` - the sender is closing voluntarily
    Disconnect,
    /// `KICK` - the server is terminating the connection
    Kick,
    /// `FROM <sender>: <payload>` - a direct message forwarded by the server
    From {
        /// Identity of the original sender
        sender: Identity,
        /// Message payload
        payload: String,
    },
    /// `GLOBAL <sender>: <payload>` - a broadcast forwarded by the server
    Broadcast {
        /// Identity of the original sender
        sender: Identity,
        /// Message payload
        payload: String,
    },
    /// Any other line, passed through verbatim
    Other(String),
}

impl Command {
    /// Decode a single line (without its terminator)
    pub fn parse(line: &str) -> Command {
        let trimmed = line.trim();
        match trimmed {
            DISCONNECT => return Command::Disconnect,
            KICK => return Command::Kick,
            _ => {}
        }

        if let Some(rest) = trimmed.strip_prefix(TO) {
            if let Some((target, payload)) = rest.split_once(':') {
                return Command::Direct {
                    target: target.trim().to_string(),
                    payload: payload.trim().to_string(),
                };
            }
        } else if let Some(rest) = trimmed.strip_prefix(GLOBAL) {
            if let Some(payload) = rest.strip_prefix(':') {
                return Command::Global {
                    payload: payload.trim().to_string(),
                };
            }
            if let Some((sender, payload)) = rest.strip_prefix(' ').and_then(split_sender) {
                return Command::Broadcast { sender, payload };
            }
        } else if let Some((sender, payload)) = trimmed.strip_prefix(FROM).and_then(split_sender)
        {
            return Command::From { sender, payload };
        }

        Command::Other(line.to_string())
    }

    /// Frame a direct message for `target`
    pub fn direct(target: Identity, payload: impl Into<String>) -> Command {
        Command::Direct {
            target: target.to_string(),
            payload: payload.into(),
        }
    }

    /// Frame a broadcast request
    pub fn global(payload: impl Into<String>) -> Command {
        Command::Global {
            payload: payload.into(),
        }
    }

    /// Frame a direct message as forwarded to its recipient
    pub fn forwarded(sender: Identity, payload: impl Into<String>) -> Command {
        Command::From {
            sender,
            payload: payload.into(),
        }
    }

    /// Frame a broadcast as forwarded to each recipient
    pub fn broadcast(sender: Identity, payload: impl Into<String>) -> Command {
        Command::Broadcast {
            sender,
            payload: payload.into(),
        }
    }

    /// Parse the target of a direct command
    ///
    /// Returns `None` for every other variant.
    pub fn target_identity(&self) -> Option<ProtocolResult<Identity>> {
        match self {
            Command::Direct { target, .. } => Some(target.parse()),
            _ => None,
        }
    }

    /// Check if this is the server's kick signal
    pub fn is_kick(&self) -> bool {
        matches!(self, Command::Kick)
    }
}

fn split_sender(rest: &str) -> Option<(Identity, String)> {
    let (sender, payload) = rest.split_once(':')?;
    let sender = sender.parse().ok()?;
    Some((sender, payload.trim().to_string()))
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Direct { target, payload } => write!(f, "{TO}{target}: {payload}"),
            Command::Global { payload } => write!(f, "{GLOBAL}: {payload}"),
            Command::Disconnect => f.write_str(DISCONNECT),
            Command::Kick => f.write_str(KICK),
            Command::From { sender, payload } => write!(f, "{FROM}{sender}: {payload}"),
            Command::Broadcast { sender, payload } => write!(f, "{GLOBAL} {sender}: {payload}"),
            Command::Other(line) => f.write_str(line),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "550e8400-e29b-41d4-a716-446655440000";

    #[test]
    fn test_parse_direct() {
        let cmd = Command::parse(&format!("TO {ID}: hello"));
        assert_eq!(
            cmd,
            Command::Direct {
                target: ID.to_string(),
                payload: "hello".to_string()
            }
        );
        assert_eq!(cmd.target_identity().unwrap().unwrap().to_string(), ID);
    }

    #[test]
    fn test_parse_direct_payload_keeps_colons() {
        let cmd = Command::parse(&format!("TO {ID}: time is 12:30: lunch"));
        match cmd {
            Command::Direct { payload, .. } => assert_eq!(payload, "time is 12:30: lunch"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_parse_direct_with_malformed_target() {
        let cmd = Command::parse("TO not-a-uuid: x");
        assert!(matches!(cmd, Command::Direct { ref target, .. } if target == "not-a-uuid"));
        assert!(cmd.target_identity().unwrap().is_err());
    }

    #[test]
    fn test_parse_direct_without_separator_is_other() {
        assert_eq!(
            Command::parse("TO nobody"),
            Command::Other("TO nobody".to_string())
        );
    }

    #[test]
    fn test_parse_global() {
        assert_eq!(
            Command::parse("GLOBAL: hi there"),
            Command::Global {
                payload: "hi there".to_string()
            }
        );
        assert_eq!(
            Command::parse("GLOBAL:"),
            Command::Global {
                payload: String::new()
            }
        );
    }

    #[test]
    fn test_parse_keywords() {
        assert_eq!(Command::parse("DISCONNECT"), Command::Disconnect);
        assert_eq!(Command::parse("KICK"), Command::Kick);
        assert_eq!(Command::parse(" KICK \r"), Command::Kick);
        assert!(Command::parse("KICK").is_kick());
        // Keywords are case sensitive and must stand alone.
        assert_eq!(Command::parse("kick"), Command::Other("kick".to_string()));
        assert_eq!(
            Command::parse("KICKED"),
            Command::Other("KICKED".to_string())
        );
    }

    #[test]
    fn test_parse_forwarded_forms() {
        let sender: Identity = ID.parse().unwrap();
        assert_eq!(
            Command::parse(&format!("FROM {ID}: hello")),
            Command::From {
                sender,
                payload: "hello".to_string()
            }
        );
        assert_eq!(
            Command::parse(&format!("GLOBAL {ID}: hi")),
            Command::Broadcast {
                sender,
                payload: "hi".to_string()
            }
        );
        assert_eq!(
            Command::parse("FROM someone: hello"),
            Command::Other("FROM someone: hello".to_string())
        );
    }

    #[test]
    fn test_other_is_verbatim() {
        let line = "  just some text: with a colon  ";
        assert_eq!(Command::parse(line), Command::Other(line.to_string()));
        assert_eq!(Command::parse(line).to_string(), line);
    }

    #[test]
    fn test_display_wire_forms() {
        let id: Identity = ID.parse().unwrap();
        assert_eq!(Command::direct(id, "hello").to_string(), format!("TO {ID}: hello"));
        assert_eq!(Command::global("hi").to_string(), "GLOBAL: hi");
        assert_eq!(Command::forwarded(id, "hello").to_string(), format!("FROM {ID}: hello"));
        assert_eq!(Command::broadcast(id, "hi").to_string(), format!("GLOBAL {ID}: hi"));
        assert_eq!(Command::Disconnect.to_string(), "DISCONNECT");
        assert_eq!(Command::Kick.to_string(), "KICK");
    }
}
