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

//! Relay Server Example
//!
//! Runs a Wirelink relay that routes `TO` and `GLOBAL` lines between clients and prints
//! every other line it receives.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p wirelink-service --example relay_server -- 7070
//! ```
//!
//! Then connect with the `relay_client` example, or by hand:
//!
//! ```bash
//! nc localhost 7070
//! ```

use std::sync::Arc;
use std::time::Duration;
use wirelink_service::{DEFAULT_PORT, LinkServer, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let port: u16 = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(DEFAULT_PORT);

    let config = ServerConfig::for_port(port)
        .with_max_connections(100)
        .with_idle_timeout(Some(Duration::from_secs(600)));
    let server = Arc::new(LinkServer::bind(config).await?);

    server.on_client_connect(|id| println!("+ {id}"));
    server.on_client_disconnect(|id| println!("- {id}"));
    server.subscribe(|id, line| println!("{id}: {line}"));

    println!("Wirelink relay listening on {}", server.local_addr());
    println!("Press Ctrl+C to stop the server\n");

    let accept_loop = server.spawn();
    tokio::signal::ctrl_c().await?;

    server.stop().await;
    accept_loop.await??;
    println!("{}", server.snapshot());
    Ok(())
}
