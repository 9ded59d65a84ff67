// src/tests/lifecycle.rs

use std::sync::Arc;
use std::thread;

use super::*;
use crate::config::Mode;
use crate::logger::Logger;

#[test]
fn shutdown_drains_everything() {
    let sink = CollectingSink::new();
    let mut logger = Logger::with_sink(Mode::Guaranteed, sink.clone()).unwrap();

    for sequence in 0..5000u64 {
        let mut record = test_record(Level::Info);
        record.arg(sequence);
        logger.add(record);
    }
    logger.shutdown();

    let lines = sink.lines();
    assert_eq!(lines.len(), 5000);
    for (sequence, line) in lines.iter().enumerate() {
        assert_eq!(args_of(line).parse::<usize>().unwrap(), sequence);
    }
}

#[test]
fn drop_is_shutdown() {
    let sink = CollectingSink::new();
    let logger = Logger::with_sink(Mode::Guaranteed, sink.clone()).unwrap();

    for _ in 0..100 {
        logger.add(test_record(Level::Info));
    }
    drop(logger);

    assert_eq!(sink.lines().len(), 100);
}

#[test]
fn shutdown_is_idempotent() {
    let sink = CollectingSink::new();
    let mut logger = Logger::with_sink(Mode::Guaranteed, sink).unwrap();
    logger.add(test_record(Level::Info));
    logger.shutdown();
    logger.shutdown();
}

#[test]
fn ring_mode_accounts_for_every_record() {
    let sink = CollectingSink::new();
    let mut logger = Logger::with_sink(
        Mode::NonGuaranteed {
            ring_buffer_size_mb: 1,
        },
        sink.clone(),
    )
    .unwrap();

    const TOTAL: usize = 20_000;
    for sequence in 0..TOTAL as u64 {
        let mut record = test_record(Level::Info);
        record.arg(sequence);
        logger.add(record);
    }

    // Drops can only happen while pushes are in flight, so the counter is
    // final here.
    let dropped = logger.dropped_count();
    logger.shutdown();

    // Every record was either written to the sink or counted as dropped.
    assert_eq!(sink.lines().len() + dropped, TOTAL);
}

#[test]
fn producers_on_many_threads() {
    const PRODUCERS: u64 = 5;
    const PER_PRODUCER: u64 = 2000;

    let sink = CollectingSink::new();
    let logger = Arc::new(Logger::with_sink(Mode::Guaranteed, sink.clone()).unwrap());

    let handles: Vec<_> = (0..PRODUCERS)
        .map(|producer| {
            let logger = Arc::clone(&logger);
            thread::spawn(move || {
                for sequence in 0..PER_PRODUCER {
                    let mut record = test_record(Level::Info);
                    record.arg(producer * 1_000_000 + sequence);
                    logger.add(record);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let mut logger = Arc::into_inner(logger).unwrap();
    logger.shutdown();

    let lines = sink.lines();
    assert_eq!(lines.len() as u64, PRODUCERS * PER_PRODUCER);

    let mut last_seen = vec![None::<u64>; PRODUCERS as usize];
    for line in &lines {
        let tagged: u64 = args_of(line).parse().unwrap();
        let producer = (tagged / 1_000_000) as usize;
        let sequence = tagged % 1_000_000;
        if let Some(previous) = last_seen[producer] {
            assert!(sequence > previous, "thread subsequence out of order");
        }
        last_seen[producer] = Some(sequence);
    }
}
