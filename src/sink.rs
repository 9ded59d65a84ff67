//! Output sinks.
//!
//! The drainer thread owns its sink exclusively, so sinks need no internal
//! locking. [`FileSink`] is the production sink: it appends formatted
//! records to a numbered file and rolls to the next number once the byte
//! budget is exceeded.

use std::fs::File;
use std::io::{self, BufWriter, Write};

use crate::level::Level;
use crate::record::Record;

/// Destination for formatted records.
///
/// Implementations must flush CRIT records through to the operating system
/// before `write` returns, and must swallow I/O failures (report and
/// continue): the drainer never stops on a sink error.
pub trait Sink: Send {
    /// Formats and appends one record.
    fn write(&mut self, record: &Record);

    /// Pushes any buffered output to the operating system.
    fn flush(&mut self);
}

/// Append-and-roll file sink.
///
/// Output files are named `{directory}{name}.{N}.txt` with `N` counting up
/// from 1; each file is truncated on open. When the bytes written since the
/// last roll exceed `roll_size_mb * 1024 * 1024`, the sink rolls to the
/// next number.
pub struct FileSink {
    name_prefix: String,
    roll_size_bytes: u64,
    bytes_written: u64,
    file_number: u32,
    out: BufWriter<File>,
    line: String,
}

impl FileSink {
    /// Opens `{log_directory}{log_file_name}.1.txt`, truncating it.
    /// `roll_size_mb` is clamped to at least one megabyte.
    pub fn new(
        log_directory: &str,
        log_file_name: &str,
        roll_size_mb: u32,
    ) -> io::Result<FileSink> {
        let name_prefix = format!("{log_directory}{log_file_name}");
        let out = BufWriter::new(open_numbered(&name_prefix, 1)?);
        Ok(FileSink {
            name_prefix,
            roll_size_bytes: u64::from(roll_size_mb.max(1)) * 1024 * 1024,
            bytes_written: 0,
            file_number: 1,
            out,
            line: String::with_capacity(256),
        })
    }

    /// Switches to the next numbered file. On failure the current file is
    /// kept and the roll retries at the next threshold crossing.
    fn roll(&mut self) -> io::Result<()> {
        let next = open_numbered(&self.name_prefix, self.file_number + 1)?;
        self.out.flush()?;
        self.out = BufWriter::new(next);
        self.file_number += 1;
        self.bytes_written = 0;
        Ok(())
    }
}

fn open_numbered(prefix: &str, number: u32) -> io::Result<File> {
    File::create(format!("{prefix}.{number}.txt"))
}

impl Sink for FileSink {
    fn write(&mut self, record: &Record) {
        self.line.clear();
        record.stringify(&mut self.line);
        if let Err(error) = self.out.write_all(self.line.as_bytes()) {
            // One record lost; keep draining.
            eprintln!("flashlog: sink write failed: {error}");
            return;
        }
        self.bytes_written += self.line.len() as u64;

        if record.level() == Some(Level::Crit) {
            self.flush();
        }
        if self.bytes_written > self.roll_size_bytes {
            if let Err(error) = self.roll() {
                eprintln!("flashlog: file roll failed, keeping current file: {error}");
            }
        }
    }

    fn flush(&mut self) {
        if let Err(error) = self.out.flush() {
            eprintln!("flashlog: sink flush failed: {error}");
        }
    }
}
