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

//! Relay Client Example
//!
//! Connects to a Wirelink relay and turns stdin into relay commands:
//!
//! - `/to <identity> <message>` sends a direct message
//! - `/all <message>` broadcasts to every other client
//! - `/quit` disconnects
//! - anything else is sent to the server as-is
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p wirelink-client --example relay_client -- localhost 7070
//! ```

use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use wirelink_client::{ClientConfig, Identity, LinkClient};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let host = args.get(1).map(|s| s.as_str()).unwrap_or("localhost");
    let port: u16 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(7070);

    let config = ClientConfig::new(host, port)
        .with_max_retries(5)
        .with_retry_delay(Duration::from_secs(1));
    let client = LinkClient::new(config);

    client.subscribe(|line| println!("<- {line}"));
    client.on_kick(|| println!("=== Kicked by server ==="));

    let id = client.connect().await?;
    println!("=== Connected as {id} ===");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if !client.is_connected() {
            break;
        }

        let result = if line == "/quit" {
            break;
        } else if let Some(rest) = line.strip_prefix("/to ") {
            match rest.split_once(' ') {
                Some((target, message)) => match target.parse::<Identity>() {
                    Ok(target) => client.send_to(target, message).await,
                    Err(e) => {
                        eprintln!("{e}");
                        continue;
                    }
                },
                None => {
                    eprintln!("usage: /to <identity> <message>");
                    continue;
                }
            }
        } else if let Some(message) = line.strip_prefix("/all ") {
            client.send_broadcast(message).await
        } else {
            client.send(&line).await
        };

        if let Err(e) = result {
            eprintln!("send failed: {e}");
        }
    }

    client.disconnect().await?;
    println!("=== Disconnected ===");
    Ok(())
}
