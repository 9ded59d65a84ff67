// src/tests/mod.rs

use std::sync::Arc;

use spin::Mutex;

use crate::level::Level;
use crate::record::Record;
use crate::sink::Sink;

mod encoding;
mod lifecycle;

// ========== Shared helpers ==========

/// Formats a record the way the drainer would.
fn stringified(record: &Record) -> String {
    let mut out = String::new();
    record.stringify(&mut out);
    out
}

/// Record with fixed source coordinates.
fn test_record(level: Level) -> Record {
    Record::new(level, file!(), "tests::helper", line!())
}

/// Argument region of a formatted line: everything after the fourth
/// bracket group, without the trailing newline.
fn args_of(line: &str) -> &str {
    line.splitn(5, ']')
        .nth(4)
        .map(|rest| rest.trim_end_matches('\n'))
        .unwrap_or("")
}

/// Sink that collects formatted lines in memory.
#[derive(Clone)]
struct CollectingSink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl CollectingSink {
    fn new() -> CollectingSink {
        CollectingSink {
            lines: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }
}

impl Sink for CollectingSink {
    fn write(&mut self, record: &Record) {
        let mut line = String::new();
        record.stringify(&mut line);
        self.lines.lock().push(line);
    }

    fn flush(&mut self) {}
}
