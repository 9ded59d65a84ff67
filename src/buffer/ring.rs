//! Bounded lossy ring buffer (non-guaranteed mode).
//!
//! A fixed array of cache-line-aligned slots indexed by a monotonically
//! increasing write counter. Producers claim a slot with one relaxed
//! `fetch_add`, then move the record in under a per-slot spin flag. If
//! producers lap the drainer, the new record overwrites the old one: the
//! overwritten record is destroyed and counted, never blocked on.

use core::cell::UnsafeCell;
use core::hint;
use core::mem::MaybeUninit;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};

use super::{Buffer, CachePadded64};
use crate::record::Record;

/// Slots per megabyte of ring storage; slots are 256 bytes.
const SLOTS_PER_MB: usize = 4096;

/// One ring slot: spin flag, written flag and in-place record storage.
#[repr(C, align(64))]
struct Slot {
    lock: AtomicBool,
    written: AtomicU8,
    record: UnsafeCell<MaybeUninit<Record>>,
}

const _: () = assert!(size_of::<Slot>() == 256);
const _: () = assert!(align_of::<Slot>() == 64);

impl Slot {
    fn new() -> Slot {
        Slot {
            lock: AtomicBool::new(false),
            written: AtomicU8::new(0),
            record: UnsafeCell::new(MaybeUninit::uninit()),
        }
    }
}

/// RAII spin guard over a slot's lock flag.
struct SlotGuard<'a> {
    lock: &'a AtomicBool,
}

impl<'a> SlotGuard<'a> {
    fn acquire(lock: &'a AtomicBool) -> SlotGuard<'a> {
        while lock
            .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            hint::spin_loop();
        }
        SlotGuard { lock }
    }
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        self.lock.store(false, Ordering::Release);
    }
}

struct WriterData {
    write_seq: AtomicUsize,
    dropped: AtomicUsize,
}

struct ReaderData {
    /// Consumer-private read cursor; only the drainer thread touches it.
    read_seq: UnsafeCell<usize>,
}

/// Fixed-size MPSC slot array with newest-wins overflow.
pub(crate) struct RingBuffer {
    writer_data: CachePadded64<WriterData>,
    reader_data: CachePadded64<ReaderData>,
    slots: Box<[Slot]>,
}

// SAFETY: producers are serialized per slot by the slot lock, and the read
// cursor is only accessed by the single drainer thread (the `Buffer`
// contract).
unsafe impl Send for RingBuffer {}
unsafe impl Sync for RingBuffer {}

impl RingBuffer {
    /// Builds a ring of `max(1, size_mb) * 4096` slots, constructed once.
    pub(crate) fn new(size_mb: u32) -> RingBuffer {
        let slot_count = size_mb.max(1) as usize * SLOTS_PER_MB;
        RingBuffer {
            writer_data: CachePadded64::new(WriterData {
                write_seq: AtomicUsize::new(0),
                dropped: AtomicUsize::new(0),
            }),
            reader_data: CachePadded64::new(ReaderData {
                read_seq: UnsafeCell::new(0),
            }),
            slots: (0..slot_count).map(|_| Slot::new()).collect(),
        }
    }

    #[cfg(test)]
    pub(crate) fn slot_count(&self) -> usize {
        self.slots.len()
    }
}

impl Buffer for RingBuffer {
    fn push(&self, record: Record) {
        let seq = self.writer_data.write_seq.fetch_add(1, Ordering::Relaxed);
        let slot = &self.slots[seq % self.slots.len()];
        let _guard = SlotGuard::acquire(&slot.lock);
        if slot.written.load(Ordering::Relaxed) == 1 {
            // Lapped the drainer: newest wins, the un-drained record goes.
            // SAFETY: written == 1 under the slot lock, so the cell holds a
            // live record.
            unsafe { (*slot.record.get()).assume_init_drop() };
            self.writer_data.dropped.fetch_add(1, Ordering::Relaxed);
        }
        // SAFETY: the slot lock gives exclusive access to the cell.
        unsafe { (*slot.record.get()).write(record) };
        slot.written.store(1, Ordering::Relaxed);
    }

    fn try_pop(&self) -> Option<Record> {
        // SAFETY: consumer-private cursor, single drainer thread.
        let read_seq = unsafe { *self.reader_data.read_seq.get() };
        let slot = &self.slots[read_seq % self.slots.len()];

        // Unlocked pre-check so polling an empty slot does not contend with
        // a producer that wrapped onto the same index; rechecked under the
        // lock before any move.
        if slot.written.load(Ordering::Relaxed) == 0 {
            return None;
        }

        let _guard = SlotGuard::acquire(&slot.lock);
        if slot.written.load(Ordering::Relaxed) == 0 {
            return None;
        }
        // SAFETY: written == 1 under the slot lock; the record is moved out
        // exactly once and the flag cleared before the lock is released.
        let record = unsafe { (*slot.record.get()).assume_init_read() };
        slot.written.store(0, Ordering::Relaxed);
        // SAFETY: consumer-private cursor, single drainer thread.
        unsafe { *self.reader_data.read_seq.get() = read_seq + 1 };
        Some(record)
    }

    fn dropped(&self) -> usize {
        self.writer_data.dropped.load(Ordering::Relaxed)
    }
}

impl Drop for RingBuffer {
    fn drop(&mut self) {
        for slot in self.slots.iter() {
            if slot.written.load(Ordering::Relaxed) == 1 {
                // SAFETY: exclusive access in drop; the flag marks a live
                // record.
                unsafe { (*slot.record.get()).assume_init_drop() };
            }
        }
    }
}
