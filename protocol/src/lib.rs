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

//! # Wirelink Line Protocol
//!
//! Shared building blocks for the Wirelink client and server: connection identities, the
//! newline-delimited command grammar, a Tokio line codec and the split transport used to read
//! and write lines over a TCP stream.
//!
//! ## Wire Format
//!
//! Every message is a single UTF-8 line terminated by `\n`. Immediately after accepting a
//! connection the server sends the new connection's [`Identity`] as the first line. After that
//! either side exchanges [`Command`] lines:
//!
//! | Line                       | Meaning                                         |
//! |----------------------------|-------------------------------------------------|
//! | `TO <identity>: <payload>` | Deliver the payload to a single identity        |
//! | `GLOBAL: <payload>`        | Broadcast the payload to every other identity   |
//! | `DISCONNECT`               | The sender is closing voluntarily               |
//! | `KICK`                     | Server to client: forced termination            |
//! | `FROM <identity>: <text>`  | Server to client: a forwarded direct message    |
//! | `GLOBAL <identity>: <text>`| Server to client: a forwarded broadcast         |
//! | anything else              | Opaque payload for the host application         |
//!
//! ## Example
//!
//! ```
//! use wirelink_protocol::{Command, Identity};
//!
//! let target = Identity::generate();
//! let line = Command::direct(target, "hello").to_string();
//!
//! match Command::parse(&line) {
//!     Command::Direct { payload, .. } => assert_eq!(payload, "hello"),
//!     other => panic!("unexpected command {other:?}"),
//! }
//! ```

mod codec;
mod command;
mod error;
mod identity;
mod subscribers;
mod transport;

pub use codec::{DEFAULT_MAX_LINE_LENGTH, LineCodec};
pub use command::{Command, INVALID_IDENTITY_NOTICE};
pub use error::{ProtocolError, ProtocolResult};
pub use identity::Identity;
pub use subscribers::Subscribers;
pub use transport::{LineReader, LineWriter, split};
