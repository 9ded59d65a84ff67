//! Per-record context capture.
//!
//! Collects the two pieces of ambient state stamped into every record header
//! (wall-clock timestamp, calling thread identity) and renders the timestamp
//! for the output prefix.

use std::cell::Cell;
use std::fmt::Write as _;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};

/// Microseconds since the Unix epoch.
pub(crate) fn timestamp_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros() as u64)
        .unwrap_or(0)
}

static NEXT_THREAD_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static THREAD_ID: Cell<u64> = const { Cell::new(0) };
}

/// Process-unique identifier of the calling thread.
///
/// Assigned from a global counter and cached in thread-local storage, so
/// every capture after the first is a TLS read.
pub(crate) fn thread_id() -> u64 {
    THREAD_ID.with(|cached| {
        let id = cached.get();
        if id != 0 {
            return id;
        }
        let id = NEXT_THREAD_ID.fetch_add(1, Ordering::Relaxed);
        cached.set(id);
        id
    })
}

/// Appends `[YYYY-MM-DD HH:MM:SS.uuuuuu]` (UTC) for a microsecond timestamp.
pub(crate) fn format_timestamp(out: &mut String, micros: u64) {
    let secs = (micros / 1_000_000) as i64;
    let sub_micros = (micros % 1_000_000) as u32;
    match DateTime::<Utc>::from_timestamp(secs, sub_micros * 1_000) {
        Some(utc) => {
            let _ = write!(out, "[{}]", utc.format("%Y-%m-%d %H:%M:%S%.6f"));
        }
        None => {
            // Timestamp outside chrono's representable range; keep the raw
            // value rather than lose the record.
            let _ = write!(out, "[{micros}]");
        }
    }
}
