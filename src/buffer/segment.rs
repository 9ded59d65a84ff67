//! Unbounded lossless segment queue (guaranteed mode).
//!
//! Records land in fixed-size segments of [`SEGMENT_CELLS`] cells. Producers
//! claim cells with one relaxed `fetch_add` on the per-segment write index;
//! the producer that fills the last cell installs a fresh segment. Segments
//! retire strictly FIFO: the head is only popped once all of its cells have
//! been consumed, so a `push` can never lose a record.

use core::cell::UnsafeCell;
use core::hint;
use core::mem::MaybeUninit;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicPtr, AtomicU32, Ordering};

use spin::Mutex;

use super::Buffer;
use crate::record::{RECORD_BYTES, Record};

/// Cells per segment; at 256 bytes per cell one segment is 8 MB.
pub(crate) const SEGMENT_CELLS: usize = 32 * 1024;

const CELL_BYTES: usize = 256;

/// One segment cell, padded to [`CELL_BYTES`]. Every field is `MaybeUninit`
/// so freshly allocated cell storage needs no initialization pass.
#[repr(C)]
struct Cell {
    record: MaybeUninit<Record>,
    _pad: MaybeUninit<[u8; CELL_BYTES - RECORD_BYTES]>,
}

const _: () = assert!(size_of::<Cell>() == CELL_BYTES);

/// One fixed block of cells plus its producer/consumer state words.
struct Segment {
    cells: Box<[UnsafeCell<Cell>]>,
    /// `state[0..SEGMENT_CELLS]` are per-cell written flags (0 → 1 exactly
    /// once); `state[SEGMENT_CELLS]` is the produced count.
    state: Box<[AtomicU32]>,
    /// Cells already moved out by the consumer; drop bookkeeping only.
    consumed: AtomicU32,
}

// SAFETY: producers write disjoint cells (indices claimed by fetch_add) and
// publish them through the release/acquire written flags; the consumer side
// is single-threaded per the `Buffer` contract.
unsafe impl Send for Segment {}
unsafe impl Sync for Segment {}

impl Segment {
    fn new() -> Segment {
        // SAFETY: every field of `Cell` is `MaybeUninit`, so the
        // freshly allocated storage is already a valid `[UnsafeCell<Cell>]`.
        let cells = unsafe { Box::new_uninit_slice(SEGMENT_CELLS).assume_init() };
        Segment {
            cells,
            state: (0..=SEGMENT_CELLS).map(|_| AtomicU32::new(0)).collect(),
            consumed: AtomicU32::new(0),
        }
    }

    /// Moves `record` into the claimed cell and publishes it. Returns `true`
    /// when this write was the one that filled the segment.
    fn install(&self, cell_index: usize, record: Record) -> bool {
        // SAFETY: `cell_index` was uniquely claimed by fetch_add, so no
        // other producer aliases this cell.
        unsafe { (*self.cells[cell_index].get()).record.write(record) };
        self.state[cell_index].store(1, Ordering::Release);
        self.state[SEGMENT_CELLS].fetch_add(1, Ordering::Acquire) + 1 == SEGMENT_CELLS as u32
    }

    /// Moves the record at `cell_index` out if its producer has published
    /// it.
    fn take(&self, cell_index: usize) -> Option<Record> {
        if self.state[cell_index].load(Ordering::Acquire) != 1 {
            return None;
        }
        // SAFETY: the acquire load of the written flag pairs with the
        // producer's release store, and the single consumer moves each cell
        // out at most once.
        let record = unsafe { (*self.cells[cell_index].get()).record.assume_init_read() };
        self.consumed.store(cell_index as u32 + 1, Ordering::Relaxed);
        Some(record)
    }
}

impl Drop for Segment {
    fn drop(&mut self) {
        // Destroy records that were produced but never popped.
        let consumed = self.consumed.load(Ordering::Relaxed) as usize;
        for index in consumed..SEGMENT_CELLS {
            if self.state[index].load(Ordering::Relaxed) == 1 {
                // SAFETY: exclusive access in drop; the flag marks a live,
                // un-consumed record.
                unsafe { (*self.cells[index].get()).record.assume_init_drop() };
            }
        }
    }
}

/// Unbounded MPSC queue of segments.
pub(crate) struct SegmentQueue {
    /// Segment handles in FIFO order; the critical section is O(1).
    segments: Mutex<VecDeque<Arc<Segment>>>,
    /// Segment currently receiving pushes. Points into an `Arc` held by
    /// `segments`, which keeps it alive until full consumption.
    current_write: AtomicPtr<Segment>,
    /// Per-segment write index; reset below `SEGMENT_CELLS` by the
    /// installer of the next segment.
    write_index: AtomicU32,
    /// Consumer-private handle on the segment being drained.
    current_read: UnsafeCell<Option<Arc<Segment>>>,
    /// Consumer-private cell cursor within `current_read`.
    read_index: UnsafeCell<usize>,
}

// SAFETY: producer-side state is atomic; `current_read` and `read_index`
// are only accessed by the single drainer thread (the `Buffer` contract).
unsafe impl Send for SegmentQueue {}
unsafe impl Sync for SegmentQueue {}

impl SegmentQueue {
    pub(crate) fn new() -> SegmentQueue {
        let queue = SegmentQueue {
            segments: Mutex::new(VecDeque::new()),
            current_write: AtomicPtr::new(core::ptr::null_mut()),
            write_index: AtomicU32::new(0),
            current_read: UnsafeCell::new(None),
            read_index: UnsafeCell::new(0),
        };
        queue.setup_next_write_segment();
        queue
    }

    /// Allocates a fresh segment, publishes it as the write target, appends
    /// it to the queue and finally resets the write index. A producer that
    /// observes the reset index (acquire) therefore also observes the new
    /// write segment.
    fn setup_next_write_segment(&self) {
        let segment = Arc::new(Segment::new());
        self.current_write
            .store(Arc::as_ptr(&segment) as *mut Segment, Ordering::Release);
        self.segments.lock().push_back(segment);
        self.write_index.store(0, Ordering::Release);
    }
}

impl Buffer for SegmentQueue {
    /// Lossless push. Producers may briefly spin while the segment turns
    /// over, but progress is guaranteed: the producer that filled the
    /// segment is already installing its successor.
    fn push(&self, record: Record) {
        loop {
            // The acquire half pairs with the installer's release store of
            // the reset index: claiming a post-reset index also makes the
            // new write segment visible.
            let index = self.write_index.fetch_add(1, Ordering::Acquire) as usize;
            if index < SEGMENT_CELLS {
                // SAFETY: a segment is retired only after all of its cells
                // are consumed, which cannot happen before this cell's flag
                // is published; the pointee is therefore alive.
                let segment = unsafe { &*self.current_write.load(Ordering::Acquire) };
                if segment.install(index, record) {
                    self.setup_next_write_segment();
                }
                return;
            }
            // Another producer filled the segment first; wait for the
            // installer to reset the index, then retry.
            while self.write_index.load(Ordering::Acquire) as usize >= SEGMENT_CELLS {
                hint::spin_loop();
            }
        }
    }

    fn try_pop(&self) -> Option<Record> {
        // SAFETY: consumer-private state, single drainer thread.
        let current_read = unsafe { &mut *self.current_read.get() };
        let read_index = unsafe { &mut *self.read_index.get() };

        if current_read.is_none() {
            *current_read = self.segments.lock().front().cloned();
        }
        let segment = current_read.as_ref()?;

        let record = segment.take(*read_index)?;
        *read_index += 1;
        if *read_index == SEGMENT_CELLS {
            // Fully drained: retire the head segment.
            *read_index = 0;
            *current_read = None;
            self.segments.lock().pop_front();
        }
        Some(record)
    }
}
