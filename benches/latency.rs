//! Producer-side latency of a mixed-argument log line.
//!
//! Mirrors the upstream benchmark shape: one line carrying two string
//! literals, two integers, a byte character and a double, pushed through
//! the ring-buffered logger.

use criterion::{Criterion, criterion_group, criterion_main};
use flashlog::{Config, Level, Mode};

fn producer_latency(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    flashlog::initialize(Config {
        mode: Mode::NonGuaranteed {
            ring_buffer_size_mb: 10,
        },
        log_directory: format!("{}/", dir.path().display()),
        log_file_name: String::from("bench"),
        log_file_roll_size_mb: 64,
        level_threshold: Level::Info,
    })
    .unwrap();

    let mut sequence = 0u32;
    c.bench_function("log_mixed_line", |b| {
        b.iter(|| {
            sequence = sequence.wrapping_add(1);
            flashlog::info!("Logging ", "benchmark ", sequence, 0u32, b'K', -42.42f64);
        })
    });

    flashlog::shutdown();
}

criterion_group!(benches, producer_latency);
criterion_main!(benches);
