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

//! Benchmarks for Wirelink
//!
//! Covers the per-line hot path (command decoding and line framing) and full relay round
//! trips between real clients over loopback.

use bytes::BytesMut;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;
use tokio::sync::{Mutex, mpsc};
use tokio_util::codec::{Decoder, Encoder};
use wirelink_client::{ClientConfig, Identity, LinkClient};
use wirelink_protocol::{Command, LineCodec};
use wirelink_service::{LinkServer, ServerConfig};

// ============================================================================
// Setup
// ============================================================================

fn runtime() -> Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()
        .unwrap()
}

async fn setup_server() -> Arc<LinkServer> {
    let server = Arc::new(
        LinkServer::bind(ServerConfig::new("127.0.0.1:0".parse().unwrap()))
            .await
            .unwrap(),
    );
    let _ = server.spawn();
    server
}

/// Connect a client whose received lines are forwarded into a channel
async fn connect_client(
    server: &LinkServer,
) -> (LinkClient, Arc<Mutex<mpsc::UnboundedReceiver<String>>>) {
    let addr = server.local_addr();
    let client = LinkClient::new(ClientConfig::new(addr.ip().to_string(), addr.port()));
    let (tx, rx) = mpsc::unbounded_channel();
    client.subscribe(move |line| {
        let _ = tx.send(line.to_string());
    });
    client.connect().await.unwrap();
    (client, Arc::new(Mutex::new(rx)))
}

/// Wait until the server has registered `count` clients
async fn wait_registered(server: &LinkServer, count: usize) {
    while server.connection_count() < count {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
}

// ============================================================================
// Benchmark: Command decoding
// ============================================================================

fn bench_command_parse(c: &mut Criterion) {
    let target = Identity::generate();
    let lines = [
        ("direct", format!("TO {target}: hello there, how are you?")),
        ("global", "GLOBAL: hello everyone".to_string()),
        ("forwarded", format!("FROM {target}: hello there")),
        ("disconnect", "DISCONNECT".to_string()),
        ("other", "just some chatter for the host".to_string()),
    ];

    let mut group = c.benchmark_group("command_parse");
    for (name, line) in &lines {
        group.bench_with_input(BenchmarkId::from_parameter(name), line, |b, line| {
            b.iter(|| black_box(Command::parse(black_box(line))));
        });
    }
    group.finish();
}

// ============================================================================
// Benchmark: Line framing
// ============================================================================

fn bench_line_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("line_codec");

    for payload_size in [16usize, 256, 4096] {
        let line = "x".repeat(payload_size);
        let lines_per_batch = 64;
        let mut batch = BytesMut::new();
        let mut encoder = LineCodec::new();
        for _ in 0..lines_per_batch {
            encoder.encode(line.as_str(), &mut batch).unwrap();
        }
        let batch = batch.freeze();

        group.throughput(Throughput::Bytes(batch.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("decode", payload_size),
            &batch,
            |b, batch| {
                b.iter(|| {
                    let mut codec = LineCodec::new();
                    let mut buffer = BytesMut::from(&batch[..]);
                    let mut decoded = 0;
                    while let Some(line) = codec.decode(&mut buffer).unwrap() {
                        black_box(line);
                        decoded += 1;
                    }
                    assert_eq!(decoded, lines_per_batch);
                });
            },
        );
        group.bench_with_input(
            BenchmarkId::new("encode", payload_size),
            &line,
            |b, line| {
                let mut codec = LineCodec::new();
                let mut buffer = BytesMut::with_capacity(payload_size + 1);
                b.iter(|| {
                    buffer.clear();
                    codec.encode(line.as_str(), &mut buffer).unwrap();
                    black_box(&buffer);
                });
            },
        );
    }
    group.finish();
}

// ============================================================================
// Benchmark: Relay round trips
// ============================================================================

fn bench_direct_round_trip(c: &mut Criterion) {
    let runtime = runtime();
    let (server, sender, receiver, inbox) = runtime.block_on(async {
        let server = setup_server().await;
        let (sender, _) = connect_client(&server).await;
        let (receiver, inbox) = connect_client(&server).await;
        wait_registered(&server, 2).await;
        (server, sender, receiver, inbox)
    });
    let receiver_id = receiver.identity().unwrap();

    c.bench_function("direct_round_trip", |b| {
        b.to_async(&runtime).iter(|| async {
            sender.send_to(receiver_id, "ping").await.unwrap();
            let line = inbox.lock().await.recv().await.unwrap();
            black_box(line);
        });
    });

    runtime.block_on(async {
        server.stop().await;
        drop(receiver);
    });
}

fn bench_global_fan_out(c: &mut Criterion) {
    let runtime = runtime();
    let mut group = c.benchmark_group("global_fan_out");
    group.measurement_time(Duration::from_secs(10));

    for listeners in [1usize, 8, 32] {
        let (server, sender, clients, inboxes) = runtime.block_on(async {
            let server = setup_server().await;
            let (sender, _) = connect_client(&server).await;
            let mut clients = Vec::new();
            let mut inboxes = Vec::new();
            for _ in 0..listeners {
                let (client, inbox) = connect_client(&server).await;
                clients.push(client);
                inboxes.push(inbox);
            }
            wait_registered(&server, listeners + 1).await;
            (server, sender, clients, inboxes)
        });

        group.throughput(Throughput::Elements(listeners as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(listeners),
            &listeners,
            |b, _| {
                b.to_async(&runtime).iter(|| async {
                    sender.send_broadcast("tick").await.unwrap();
                    for inbox in &inboxes {
                        black_box(inbox.lock().await.recv().await.unwrap());
                    }
                });
            },
        );

        runtime.block_on(async {
            server.stop().await;
            drop(clients);
        });
    }
    group.finish();
}

criterion_group!(
    suite_benches,
    bench_command_parse,
    bench_line_codec,
    bench_direct_round_trip,
    bench_global_fan_out,
);

criterion_main!(suite_benches);
