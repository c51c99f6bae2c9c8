//! Throughput benchmark suite.
//!
//! Benchmarks the local hot paths of frame batching:
//! - SSE relay: chunked byte streams into synthesized events
//! - Frame buffer: append and drain at different batch sizes
//! - Request body: base64 content parts for a full batch
//!
//! Run with: cargo bench --bench throughput
//! Results saved to: target/criterion/

use std::convert::Infallible;
use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use futures_util::stream;
use glm_realtime::client::FrameBuffer;
use glm_realtime::completion::{frame_content, relay_stream};
use glm_realtime::Event;
use tokio::runtime::Runtime;

// ============================================================================
// Benchmark Parameters
// ============================================================================

const DELTA_COUNTS: &[usize] = &[10, 100, 1000];
const CHUNK_SIZES: &[usize] = &[64, 1024];
const FRAME_COUNTS: &[usize] = &[10, 100];
const FRAME_BYTES: usize = 4096;

// ============================================================================
// Helpers
// ============================================================================

fn sse_body(deltas: usize) -> Vec<u8> {
    let mut body = String::new();
    for i in 0..deltas {
        body.push_str(&format!(
            "data: {{\"choices\":[{{\"delta\":{{\"content\":\"token{i} \"}}}}]}}\n\n"
        ));
    }
    body.push_str("data: [DONE]\n");
    body.into_bytes()
}

// ============================================================================
// Benchmark: SSE Relay
// ============================================================================

fn bench_sse_relay(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    let mut group = c.benchmark_group("sse_relay");

    for &deltas in DELTA_COUNTS {
        let body = sse_body(deltas);
        group.throughput(Throughput::Bytes(body.len() as u64));

        for &chunk in CHUNK_SIZES {
            let id = format!("{deltas}d_{chunk}b");
            group.bench_with_input(BenchmarkId::new("relay", &id), &body, |b, body| {
                b.to_async(&rt).iter(|| async {
                    let parts: Vec<Result<&[u8], Infallible>> =
                        body.chunks(chunk).map(Ok).collect();
                    let sink = |event: Event| {
                        black_box(event);
                    };
                    black_box(relay_stream(stream::iter(parts), &sink).await)
                });
            });
        }
    }

    group.finish();
}

// ============================================================================
// Benchmark: Frame Buffer
// ============================================================================

fn bench_frame_buffer(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_buffer");

    for &count in FRAME_COUNTS {
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("push_drain", count), &count, |b, &count| {
            let buffer = FrameBuffer::new();
            b.iter(|| {
                for _ in 0..count {
                    buffer.push(vec![0u8; FRAME_BYTES]);
                }
                black_box(buffer.drain())
            });
        });
    }

    group.finish();
}

// ============================================================================
// Benchmark: Request Body
// ============================================================================

fn bench_frame_content(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_content");

    for &count in FRAME_COUNTS {
        let frames = vec![vec![0xABu8; FRAME_BYTES]; count];
        group.throughput(Throughput::Bytes((count * FRAME_BYTES) as u64));
        group.bench_with_input(BenchmarkId::new("encode", count), &frames, |b, frames| {
            b.iter(|| black_box(frame_content("describe the scene", frames)));
        });
    }

    group.finish();
}

// ============================================================================
// Main
// ============================================================================

criterion_group!(
    benches,
    bench_sse_relay,
    bench_frame_buffer,
    bench_frame_content
);
criterion_main!(benches);
