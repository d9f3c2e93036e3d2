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

//! # Wirelink Client
//!
//! Client for the Wirelink line relay. A [`LinkClient`] connects to a relay server (retrying
//! a configurable number of times), learns the [`Identity`] the server assigned it, and then
//! exchanges newline-delimited lines with other clients through the server.
//!
//! ## Quick Start
//!
//! ```no_run
//! use wirelink_client::{ClientConfig, LinkClient};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::new("localhost", 7070)
//!         .with_max_retries(5)
//!         .with_retry_delay(Duration::from_millis(500));
//!
//!     let client = LinkClient::new(config);
//!     client.subscribe(|line| println!("<- {line}"));
//!
//!     let me = client.connect().await?;
//!     println!("assigned identity {me}");
//!     client.send_broadcast("hi all").await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Received lines
//!
//! Subscribers see every line verbatim, including the server's forwarded forms
//! `FROM <sender>: <payload>` and `GLOBAL <sender>: <payload>`; use
//! [`Command::parse`] for structured access. The `KICK` signal is not delivered to
//! subscribers; it runs the [`LinkClient::on_kick`] callbacks and closes the connection.

mod client;
mod config;
mod error;
mod hub;

pub use client::{ConnectionState, LinkClient};
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use hub::{ClientHub, KickCallback, LineCallback};

pub use wirelink_protocol::{Command, Identity};
