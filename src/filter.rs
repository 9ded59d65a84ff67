//! Process-wide severity threshold.
//!
//! A single atomic holds the minimum severity that passes the gate. The
//! check on the producer fast path is a relaxed load, so a concurrent
//! [`set_level`] may briefly admit records at the old threshold; the store
//! uses release ordering so the new threshold becomes visible promptly.

use std::sync::atomic::{AtomicU8, Ordering};

use crate::level::Level;

static LEVEL_THRESHOLD: AtomicU8 = AtomicU8::new(Level::Info as u8);

/// Sets the minimum severity that passes the gate.
pub fn set_level(level: Level) {
    LEVEL_THRESHOLD.store(level as u8, Ordering::Release);
}

/// Returns `true` if records at `level` currently pass the gate.
///
/// Called at macro expansion before any record is constructed, so disabled
/// levels cost one atomic load.
#[inline(always)]
pub fn is_logged(level: Level) -> bool {
    level as u8 >= LEVEL_THRESHOLD.load(Ordering::Relaxed)
}
