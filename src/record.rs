//! Binary log record.
//!
//! A [`Record`] is one pending log line in self-describing binary form. The
//! producer encodes a fixed header followed by `(tag, value)` pairs into an
//! inline byte region; if the arguments outgrow it, the bytes spill to a
//! heap buffer and the record keeps growing there. All text formatting is
//! deferred to [`Record::stringify`], which runs on the drainer thread.
//!
//! # Layout
//!
//! The struct is exactly [`RECORD_BYTES`] bytes so that one record plus the
//! per-slot bookkeeping fills a 256-byte buffer slot. The header is encoded
//! at the start of the byte region in fixed order: timestamp, thread id,
//! file, function, line, level. Strings with `'static` storage are encoded
//! as their (pointer, length) parts and never copied; everything else is
//! copied into the record.

use std::fmt::Write as _;

use crate::context;
use crate::level::Level;

/// In-memory size of a [`Record`], asserted at compile time.
///
/// 256 bytes of slot storage minus the slot's lock byte, written flag and
/// alignment padding.
pub(crate) const RECORD_BYTES: usize = 248;

/// Inline capacity: the record size minus the write cursor and heap handle.
const STACK_CAPACITY: usize =
    RECORD_BYTES - size_of::<usize>() - size_of::<Option<Box<[u8]>>>();

/// Capacity of the first heap buffer, unless the record already needs more.
const FIRST_HEAP_CAPACITY: usize = 512;

const USIZE_BYTES: usize = size_of::<usize>();

/// Header byte offset of the level byte (timestamp + thread id + two
/// static-string coordinates + line number).
const LEVEL_OFFSET: usize = 8 + 8 + 4 * USIZE_BYTES + 4;

/// Type tags preceding each encoded argument. The assignment is part of the
/// record format and must not be reordered.
mod tag {
    pub(super) const BYTE: u8 = 0;
    pub(super) const U32: u8 = 1;
    pub(super) const U64: u8 = 2;
    pub(super) const I32: u8 = 3;
    pub(super) const I64: u8 = 4;
    pub(super) const F64: u8 = 5;
    pub(super) const STATIC_STR: u8 = 6;
    pub(super) const COPIED_STR: u8 = 7;
}

/// A single pending log line in binary form.
///
/// Created at the call site, moved into the logger's buffer, and later moved
/// out by the drainer, formatted and destroyed.
pub struct Record {
    used: usize,
    heap: Option<Box<[u8]>>,
    stack: [u8; STACK_CAPACITY],
}

const _: () = assert!(size_of::<Record>() == RECORD_BYTES);

impl Record {
    /// Builds a record for `level` originating at `file:function:line`,
    /// stamping the current timestamp and thread identity.
    ///
    /// The [`log!`](crate::log) macro wires the source coordinates from
    /// call-site metadata; `function` may be a fully qualified path, only
    /// its final segment is printed.
    pub fn new(level: Level, file: &'static str, function: &'static str, line: u32) -> Record {
        let mut record = Record {
            used: 0,
            heap: None,
            stack: [0; STACK_CAPACITY],
        };
        // Header fields in fixed order; always fits the inline region.
        record.push_raw(&context::timestamp_now().to_ne_bytes());
        record.push_raw(&context::thread_id().to_ne_bytes());
        record.push_static_str(file);
        record.push_static_str(function);
        record.push_raw(&line.to_ne_bytes());
        record.push_raw(&[level as u8]);
        record
    }

    /// Appends one typed argument and returns `self` for chaining.
    pub fn arg<T: Loggable>(&mut self, value: T) -> &mut Self {
        value.append_to(self);
        self
    }

    /// Level stored in the header, or `None` if the byte is corrupt.
    pub fn level(&self) -> Option<Level> {
        self.bytes().get(LEVEL_OFFSET).copied().and_then(Level::from_u8)
    }

    /// Formats the record as one output line (prefix, arguments, newline).
    ///
    /// Decoding is bounds-checked throughout: an unknown tag or a truncated
    /// value ends the argument list for this record only, keeping whatever
    /// was already emitted.
    pub fn stringify(&self, out: &mut String) {
        let mut reader = Reader { buf: self.bytes() };
        let Some(header) = Header::decode(&mut reader) else {
            return;
        };

        context::format_timestamp(out, header.timestamp);
        let _ = write!(
            out,
            "[{}][{}][{}:{}:{}]",
            Level::label(header.level),
            header.thread,
            header.file,
            final_path_segment(header.function),
            header.line,
        );

        while let Some(tag_byte) = reader.u8() {
            if decode_arg(&mut reader, tag_byte, out).is_none() {
                break;
            }
        }
        out.push('\n');
    }

    #[cfg(test)]
    pub(crate) fn bytes_used(&self) -> usize {
        self.used
    }

    pub(crate) fn capacity(&self) -> usize {
        match &self.heap {
            Some(heap) => heap.len(),
            None => STACK_CAPACITY,
        }
    }

    fn bytes(&self) -> &[u8] {
        let buffer = match &self.heap {
            Some(heap) => &heap[..],
            None => &self.stack[..],
        };
        &buffer[..self.used]
    }

    /// Grows the buffer so `additional` more bytes fit. The first spill
    /// allocates `max(512, required)`; later growth doubles or sizes to the
    /// requirement, whichever is larger.
    fn reserve(&mut self, additional: usize) {
        let required = self.used + additional;
        if required <= self.capacity() {
            return;
        }
        let new_capacity = match &self.heap {
            None => required.max(FIRST_HEAP_CAPACITY),
            Some(heap) => required.max(heap.len() * 2),
        };
        let mut grown = vec![0u8; new_capacity].into_boxed_slice();
        grown[..self.used].copy_from_slice(self.bytes());
        self.heap = Some(grown);
    }

    /// Writes raw bytes at the cursor. Capacity must already be reserved.
    fn push_raw(&mut self, bytes: &[u8]) {
        let start = self.used;
        let end = start + bytes.len();
        match &mut self.heap {
            Some(heap) => heap[start..end].copy_from_slice(bytes),
            None => self.stack[start..end].copy_from_slice(bytes),
        }
        self.used = end;
    }

    fn push_static_str(&mut self, value: &'static str) {
        self.push_raw(&(value.as_ptr() as usize).to_ne_bytes());
        self.push_raw(&value.len().to_ne_bytes());
    }

    /// Appends a tagged fixed-size value, reserving once for both.
    fn append_scalar(&mut self, tag_byte: u8, value: &[u8]) {
        self.reserve(1 + value.len());
        self.push_raw(&[tag_byte]);
        self.push_raw(value);
    }

    fn append_static_str(&mut self, value: &'static str) {
        self.reserve(1 + 2 * USIZE_BYTES);
        self.push_raw(&[tag::STATIC_STR]);
        self.push_static_str(value);
    }

    /// Copies string bytes into the record, length-prefixed. Zero-length
    /// strings are skipped entirely: no tag is emitted.
    fn append_copied_str(&mut self, value: &str) {
        if value.is_empty() {
            return;
        }
        self.reserve(1 + size_of::<u32>() + value.len());
        self.push_raw(&[tag::COPIED_STR]);
        self.push_raw(&(value.len() as u32).to_ne_bytes());
        self.push_raw(value.as_bytes());
    }
}

/// A value that can be appended to a [`Record`] as a typed argument.
///
/// Implementations exist for the supported scalar types, for `&'static str`
/// (stored by pointer, never copied) and for [`String`]/[`Text`] (copied
/// into the record). The split between the `'static` and copied paths is
/// deliberate: pointer storage is only sound when the referent outlives the
/// drainer's read, which the `'static` bound guarantees.
pub trait Loggable {
    /// Encodes `self` into the record body.
    fn append_to(&self, record: &mut Record);
}

impl Loggable for u8 {
    fn append_to(&self, record: &mut Record) {
        record.append_scalar(tag::BYTE, &[*self]);
    }
}

impl Loggable for u32 {
    fn append_to(&self, record: &mut Record) {
        record.append_scalar(tag::U32, &self.to_ne_bytes());
    }
}

impl Loggable for u64 {
    fn append_to(&self, record: &mut Record) {
        record.append_scalar(tag::U64, &self.to_ne_bytes());
    }
}

impl Loggable for i32 {
    fn append_to(&self, record: &mut Record) {
        record.append_scalar(tag::I32, &self.to_ne_bytes());
    }
}

impl Loggable for i64 {
    fn append_to(&self, record: &mut Record) {
        record.append_scalar(tag::I64, &self.to_ne_bytes());
    }
}

impl Loggable for f64 {
    fn append_to(&self, record: &mut Record) {
        record.append_scalar(tag::F64, &self.to_ne_bytes());
    }
}

impl Loggable for &'static str {
    fn append_to(&self, record: &mut Record) {
        record.append_static_str(*self);
    }
}

impl Loggable for String {
    fn append_to(&self, record: &mut Record) {
        record.append_copied_str(self);
    }
}

/// Borrowed string argument whose bytes are copied into the record.
///
/// Use this for text that is not `'static`:
///
/// ```
/// use flashlog::{Level, Record, Text};
///
/// let name = std::env::var("USER").unwrap_or_default();
/// let mut record = Record::new(Level::Info, file!(), "demo", line!());
/// record.arg("user=").arg(Text(&name));
/// ```
pub struct Text<'a>(
    /// The borrowed text to copy.
    pub &'a str,
);

impl Loggable for Text<'_> {
    fn append_to(&self, record: &mut Record) {
        record.append_copied_str(self.0);
    }
}

struct Header {
    timestamp: u64,
    thread: u64,
    file: &'static str,
    function: &'static str,
    line: u32,
    level: u8,
}

impl Header {
    fn decode(reader: &mut Reader<'_>) -> Option<Header> {
        Some(Header {
            timestamp: reader.u64()?,
            thread: reader.u64()?,
            file: reader.static_str()?,
            function: reader.static_str()?,
            line: reader.u32()?,
            level: reader.u8()?,
        })
    }
}

/// Bounds-checked cursor over the encoded bytes.
struct Reader<'a> {
    buf: &'a [u8],
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> Option<&'a [u8]> {
        if self.buf.len() < n {
            return None;
        }
        let (head, rest) = self.buf.split_at(n);
        self.buf = rest;
        Some(head)
    }

    fn array<const N: usize>(&mut self) -> Option<[u8; N]> {
        let bytes = self.take(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Some(out)
    }

    fn u8(&mut self) -> Option<u8> {
        self.array::<1>().map(|b| b[0])
    }

    fn u32(&mut self) -> Option<u32> {
        self.array::<4>().map(u32::from_ne_bytes)
    }

    fn u64(&mut self) -> Option<u64> {
        self.array::<8>().map(u64::from_ne_bytes)
    }

    fn i32(&mut self) -> Option<i32> {
        self.array::<4>().map(i32::from_ne_bytes)
    }

    fn i64(&mut self) -> Option<i64> {
        self.array::<8>().map(i64::from_ne_bytes)
    }

    fn f64(&mut self) -> Option<f64> {
        self.array::<8>().map(f64::from_ne_bytes)
    }

    fn usize_native(&mut self) -> Option<usize> {
        self.array::<USIZE_BYTES>().map(usize::from_ne_bytes)
    }

    /// Reconstructs a `&'static str` from its encoded (pointer, length)
    /// parts.
    fn static_str(&mut self) -> Option<&'static str> {
        let ptr = self.usize_native()? as *const u8;
        let len = self.usize_native()?;
        // SAFETY: the encoder only ever stores the parts of a `&'static
        // str`, so the pointer and length describe valid UTF-8 that lives
        // for the rest of the process.
        Some(unsafe { core::str::from_utf8_unchecked(core::slice::from_raw_parts(ptr, len)) })
    }
}

/// Decodes one tagged argument. `None` means the tag was unknown or the
/// value truncated; the caller stops decoding this record.
fn decode_arg(reader: &mut Reader<'_>, tag_byte: u8, out: &mut String) -> Option<()> {
    match tag_byte {
        tag::BYTE => out.push(reader.u8()? as char),
        tag::U32 => {
            let _ = write!(out, "{}", reader.u32()?);
        }
        tag::U64 => {
            let _ = write!(out, "{}", reader.u64()?);
        }
        tag::I32 => {
            let _ = write!(out, "{}", reader.i32()?);
        }
        tag::I64 => {
            let _ = write!(out, "{}", reader.i64()?);
        }
        tag::F64 => {
            let _ = write!(out, "{}", reader.f64()?);
        }
        tag::STATIC_STR => out.push_str(reader.static_str()?),
        tag::COPIED_STR => {
            let len = reader.u32()? as usize;
            let bytes = reader.take(len)?;
            out.push_str(&String::from_utf8_lossy(bytes));
        }
        _ => return None,
    }
    Some(())
}

/// Final `::` segment of a function path, so the output prefix stays
/// colon-delimited.
fn final_path_segment(path: &str) -> &str {
    path.rsplit("::").next().unwrap_or(path)
}

#[cfg(test)]
pub(crate) mod corrupt {
    //! Test-only mutation of encoded records.

    use super::Record;

    /// Overwrites a byte of the encoded region in place.
    pub(crate) fn poke(record: &mut Record, offset: usize, value: u8) {
        match &mut record.heap {
            Some(heap) => heap[offset] = value,
            None => record.stack[offset] = value,
        }
    }

    /// Byte offset where the first argument tag lands.
    pub(crate) const FIRST_ARG_OFFSET: usize = super::LEVEL_OFFSET + 1;
}
