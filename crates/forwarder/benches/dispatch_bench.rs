//! 포워더 벤치마크
//!
//! 필터 판정, 패킷 포맷, 전체 전송 경로의 처리량을 측정합니다.

use std::net::SocketAddr;
use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use sysfwd_core::error::TransportError;
use sysfwd_core::pipeline::Transport;
use sysfwd_core::types::{Facility, FilterMode, LogEvent, Severity};
use sysfwd_forwarder::{FilterEngine, ForwarderConfigBuilder, PacketFormatter, SyslogForwarder};

/// 패킷을 버리는 전송 계층 (소켓 비용 제외)
struct NullTransport {
    endpoint: SocketAddr,
}

impl Transport for NullTransport {
    fn endpoint(&self) -> SocketAddr {
        self.endpoint
    }

    fn send(&self, packet: &[u8]) -> Result<usize, TransportError> {
        Ok(packet.len())
    }
}

const SHORT_MESSAGE: &str = "connected to access point";
const COLORED_MESSAGE: &str = "\x1b[1;33mW (12345) wifi: beacon timeout, reconnecting to ap-floor-3\x1b[0m";

fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter_passes");
    group.throughput(Throughput::Elements(1));

    for size in [1usize, 16, 256] {
        let tags: Vec<String> = (0..size).map(|i| format!("tag{}", i)).collect();
        let engine = FilterEngine::new(FilterMode::Include, &tags);

        group.bench_with_input(BenchmarkId::new("hit", size), &size, |b, _| {
            b.iter(|| engine.passes(black_box("tag0")))
        });
        group.bench_with_input(BenchmarkId::new("miss", size), &size, |b, _| {
            b.iter(|| engine.passes(black_box("unlisted")))
        });
    }

    group.finish();
}

fn bench_format(c: &mut Criterion) {
    let formatter = PacketFormatter::new(Facility::User, "bench-node", true, 1024)
        .expect("formatter should build");

    let mut group = c.benchmark_group("packet_format");
    group.throughput(Throughput::Elements(1));

    group.bench_function("plain", |b| {
        let event = LogEvent::new(Severity::Informational, "wifi", SHORT_MESSAGE);
        b.iter(|| formatter.format(black_box(&event), "", false))
    });

    group.bench_function("strip_colors", |b| {
        let event = LogEvent::new(Severity::Warning, "wifi", COLORED_MESSAGE);
        b.iter(|| formatter.format(black_box(&event), "[direct] ", true))
    });

    group.bench_function("truncate", |b| {
        let long = "x".repeat(4096);
        let event = LogEvent::new(Severity::Debug, "bulk", &long);
        b.iter(|| formatter.format(black_box(&event), "", false))
    });

    group.finish();
}

fn bench_dispatch(c: &mut Criterion) {
    let config = ForwarderConfigBuilder::new()
        .client_id("bench-node")
        .filter_mode(FilterMode::Exclude)
        .filters(vec!["noisy".to_owned()])
        .build()
        .expect("config should build");
    let transport = Arc::new(NullTransport {
        endpoint: "127.0.0.1:514".parse().expect("valid address"),
    });
    let forwarder = SyslogForwarder::builder()
        .config(config)
        .transport(transport)
        .build()
        .expect("forwarder should build");

    let mut group = c.benchmark_group("dispatch");

    group.throughput(Throughput::Elements(1));
    group.bench_function("forwarded", |b| {
        b.iter(|| forwarder.log_direct(black_box(6), "wifi", SHORT_MESSAGE))
    });
    group.bench_function("filtered", |b| {
        b.iter(|| forwarder.log_direct(black_box(6), "noisy", SHORT_MESSAGE))
    });

    // 1000건 반복 처리량
    group.throughput(Throughput::Elements(1000));
    group.bench_function("throughput_1000", |b| {
        b.iter(|| {
            for _ in 0..1000 {
                forwarder.log_direct(black_box(3), "sensor", COLORED_MESSAGE);
            }
        })
    });

    group.finish();
}

criterion_group!(benches, bench_filter, bench_format, bench_dispatch);
criterion_main!(benches);
