//! Logger lifecycle and the drainer thread.
//!
//! A [`Logger`] owns one handoff buffer, one sink and one background
//! drainer thread. Its lifecycle is a one-way state machine:
//!
//! ```text
//! INIT ──(constructor publishes)──▶ READY ──(shutdown)──▶ SHUTDOWN
//! ```
//!
//! The drainer waits out INIT, then pops records and hands them to the sink
//! while READY, sleeping 50 µs when the buffer is empty. On SHUTDOWN it
//! drains the buffer completely and flushes the sink before exiting, so
//! after [`Logger::shutdown`] returns every queued record is on disk.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::buffer::Buffer;
use crate::buffer::ring::RingBuffer;
use crate::buffer::segment::SegmentQueue;
use crate::config::{Config, Mode};
use crate::record::Record;
use crate::sink::{FileSink, Sink};

const INIT: u8 = 0;
const READY: u8 = 1;
const SHUTDOWN: u8 = 2;

/// Drainer sleep while the buffer is empty (and the INIT poll interval).
const IDLE_WAIT: Duration = Duration::from_micros(50);

/// Asynchronous logger: buffer, sink and drainer thread.
///
/// Most applications use the process-wide instance installed by
/// [`initialize`](crate::initialize); embedding code and tests may hold a
/// `Logger` directly and feed it through [`Logger::add`].
pub struct Logger {
    state: Arc<AtomicU8>,
    buffer: Arc<dyn Buffer>,
    drainer: Option<JoinHandle<()>>,
}

impl Logger {
    /// Builds a logger writing to a [`FileSink`] per `config`.
    pub fn new(config: &Config) -> io::Result<Logger> {
        let sink = FileSink::new(
            &config.log_directory,
            &config.log_file_name,
            config.log_file_roll_size_mb,
        )?;
        Logger::with_sink(config.mode.clone(), sink)
    }

    /// Builds a logger draining into an arbitrary [`Sink`].
    ///
    /// The buffer is created first, then the drainer thread starts in INIT
    /// and READY is published last, so the drainer observes a fully
    /// constructed logger.
    pub fn with_sink<S: Sink + 'static>(mode: Mode, sink: S) -> io::Result<Logger> {
        let buffer: Arc<dyn Buffer> = match mode {
            Mode::NonGuaranteed {
                ring_buffer_size_mb,
            } => Arc::new(RingBuffer::new(ring_buffer_size_mb)),
            Mode::Guaranteed => Arc::new(SegmentQueue::new()),
        };
        let state = Arc::new(AtomicU8::new(INIT));

        let drainer = thread::Builder::new()
            .name(String::from("flashlog-drainer"))
            .spawn({
                let state = Arc::clone(&state);
                let buffer = Arc::clone(&buffer);
                move || drain(&state, &*buffer, sink)
            })?;

        state.store(READY, Ordering::Release);
        Ok(Logger {
            state,
            buffer,
            drainer: Some(drainer),
        })
    }

    /// Moves a record into the buffer.
    pub fn add(&self, record: Record) {
        self.buffer.push(record);
    }

    /// Records lost to ring overwrite since construction; always zero in
    /// guaranteed mode.
    pub fn dropped_count(&self) -> usize {
        self.buffer.dropped()
    }

    /// Stops the drainer after it has flushed every queued record.
    ///
    /// Idempotent. Producers must have quiesced before shutdown; records
    /// submitted afterwards are silently discarded by the gate.
    pub fn shutdown(&mut self) {
        self.state.store(SHUTDOWN, Ordering::SeqCst);
        if let Some(drainer) = self.drainer.take() {
            let _ = drainer.join();
        }
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Drainer thread body.
fn drain<S: Sink>(state: &AtomicU8, buffer: &dyn Buffer, mut sink: S) {
    // Wait for the constructor to finish and pull its stores over.
    while state.load(Ordering::Acquire) == INIT {
        thread::sleep(IDLE_WAIT);
    }

    while state.load(Ordering::Acquire) == READY {
        match buffer.try_pop() {
            Some(record) => sink.write(&record),
            None => thread::sleep(IDLE_WAIT),
        }
    }

    // SHUTDOWN: drain whatever is still queued, then flush.
    while let Some(record) = buffer.try_pop() {
        sink.write(&record);
    }
    sink.flush();
}
