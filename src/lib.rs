//! Low-latency asynchronous logging.
//!
//! Producer threads record log lines on their hot paths; a single
//! background drainer thread formats them and writes rolled text files.
//! All formatting is deferred to the drainer: a producer encodes its
//! arguments into a small binary [`Record`] and hands it off through a
//! lock-free buffer, keeping the per-call cost well under a microsecond.
//!
//! # Components
//!
//! - `record`: binary-encoded log line ([`Record`]) with inline-first,
//!   heap-spill storage
//! - `buffer`: the producer→consumer handoff fabric, a bounded lossy ring
//!   or an unbounded lossless segment queue
//! - `sink`: formatted output with size-based file rolling ([`FileSink`])
//! - `logger`: buffer + sink + drainer thread lifecycle ([`Logger`])
//! - `filter`: process-wide severity threshold ([`set_level`],
//!   [`is_logged`])
//! - `macros`: call-site facade ([`info!`], [`warn!`], [`crit!`])
//!
//! # Design Overview
//!
//! Two buffering strategies are selected at [`initialize`] time:
//!
//! 1. **Non-guaranteed**: a fixed ring of 256-byte slots. Pushes never
//!    wait for the drainer; if producers lap it, the newest record
//!    overwrites the oldest un-drained one. Suited to hot paths that must
//!    never stall.
//! 2. **Guaranteed**: an unbounded queue of 8 MB segments. Pushes never
//!    fail and never drop; producers only spin briefly while a full
//!    segment is swapped for a fresh one.
//!
//! Records from one thread appear in the output in submission order;
//! there is no total order across threads.
//!
//! # Usage
//!
//! ```no_run
//! use flashlog::{Config, Level, Mode, info, warn};
//!
//! flashlog::initialize(Config {
//!     mode: Mode::Guaranteed,
//!     log_directory: String::from("/var/log/"),
//!     log_file_name: String::from("service"),
//!     log_file_roll_size_mb: 16,
//!     level_threshold: Level::Info,
//! })?;
//!
//! info!("listening on port ", 8080u32);
//! warn!("queue depth ", 17u64, " above watermark");
//!
//! flashlog::shutdown();
//! # Ok::<(), std::io::Error>(())
//! ```

mod buffer;
mod config;
mod context;
mod filter;
mod level;
mod logger;
mod macros;
mod record;
mod sink;

pub use config::{Config, Mode};
pub use filter::{is_logged, set_level};
pub use level::Level;
pub use logger::Logger;
pub use record::{Loggable, Record, Text};
pub use sink::{FileSink, Sink};

use std::io;
use std::ptr;
use std::sync::atomic::{AtomicPtr, Ordering};

use spin::Mutex;

/// Publication slot read by producers on every submission.
static ACTIVE: AtomicPtr<Logger> = AtomicPtr::new(ptr::null_mut());

/// Owner of the active logger; keeps the published pointee alive.
static OWNED: Mutex<Option<Box<Logger>>> = Mutex::new(None);

/// Constructs the process-wide logger and publishes it.
///
/// Opens the first output file, starts the drainer thread, applies the
/// configured severity threshold and makes the instance visible to the
/// facade macros. Calling `initialize` again retires the previous instance
/// first: its drainer drains and flushes before the new logger is
/// published.
pub fn initialize(config: Config) -> io::Result<()> {
    let logger = Box::new(Logger::new(&config)?);
    set_level(config.level_threshold);

    let mut owned = OWNED.lock();
    if owned.is_some() {
        // Unpublish before retiring so late submissions are discarded
        // rather than handed to a logger that is shutting down.
        ACTIVE.store(ptr::null_mut(), Ordering::SeqCst);
        *owned = None;
    }
    *owned = Some(logger);
    if let Some(active) = owned.as_deref() {
        ACTIVE.store(ptr::from_ref(active).cast_mut(), Ordering::SeqCst);
    }
    Ok(())
}

/// Retires the process-wide logger: unpublishes it, drains every queued
/// record to the sink and joins the drainer thread.
///
/// Records submitted after shutdown are silently discarded. Teardown is
/// otherwise implicit at process exit; calling this is only required when
/// the output must be complete at a known point.
pub fn shutdown() {
    let mut owned = OWNED.lock();
    ACTIVE.store(ptr::null_mut(), Ordering::SeqCst);
    *owned = None;
}

/// Records lost to ring overwrite by the active logger; zero when no
/// logger is published or the active logger runs in guaranteed mode.
pub fn dropped_count() -> usize {
    let logger = ACTIVE.load(Ordering::Acquire);
    if logger.is_null() {
        return 0;
    }
    // SAFETY: same publication argument as in `submit`.
    unsafe { (*logger).dropped_count() }
}

/// Hands a finished record to the active logger.
#[doc(hidden)]
pub fn submit(record: Record) {
    let logger = ACTIVE.load(Ordering::Acquire);
    if logger.is_null() {
        // Not initialized, or already shut down: discard silently.
        return;
    }
    // SAFETY: a non-null pointer was published by `initialize` and its
    // pointee is kept alive by the owner slot; retirement nulls the
    // pointer first. Shutdown is cooperative: it must not race in-flight
    // producers, per the lifecycle contract.
    unsafe { (*logger).add(record) };
}

#[cfg(test)]
mod tests;
