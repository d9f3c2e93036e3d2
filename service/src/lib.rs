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

//! Wirelink relay server
//!
//! Accepts TCP clients, assigns each one an [`Identity`](wirelink_protocol::Identity) and
//! relays lines between them:
//!
//! - `TO <identity>: <payload>` is forwarded to that client as `FROM <sender>: <payload>`
//! - `GLOBAL: <payload>` goes to every other client as `GLOBAL <sender>: <payload>`
//! - `DISCONNECT` removes the sender
//! - anything else is handed to the server's subscribers
//!
//! # Architecture
//!
//! ```text
//! LinkServer (accept loop)
//!     ↓
//! ConnectionManager ── Registry, ServerHub
//!     ↓
//! ConnectionWorker (one receive loop per client) → Connection
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use wirelink_service::{LinkServer, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = Arc::new(LinkServer::bind(ServerConfig::for_port(7070)).await?);
//!     server.on_client_connect(|id| println!("{id} joined"));
//!     server.start().await?;
//!     Ok(())
//! }
//! ```

mod config;
mod connection;
mod error;
mod hub;
mod manager;
mod metrics;
mod registry;
mod server;
mod types;
mod worker;

pub use config::{DEFAULT_PORT, ServerConfig};
pub use connection::Connection;
pub use error::{Result, ServiceError};
pub use hub::{ClientCallback, MessageCallback, ServerHub};
pub use manager::{BroadcastResult, ConnectionManager};
pub use metrics::{MetricsSnapshot, ServerMetrics};
pub use registry::Registry;
pub use server::LinkServer;
pub use types::{ConnectionInfo, ConnectionState, Delivery, ServerSnapshot};
