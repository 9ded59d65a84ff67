//! Helpers shared by the end-to-end scenarios.
#![allow(dead_code)] // not every scenario uses every helper

use std::fs;
use std::path::Path;

/// Lines of every rolled file `{name}.{N}.txt` in roll order.
pub fn read_rolled_lines(dir: &Path, name: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut number = 1;
    loop {
        let path = dir.join(format!("{name}.{number}.txt"));
        let Ok(contents) = fs::read_to_string(&path) else {
            break;
        };
        lines.extend(contents.lines().map(str::to_string));
        number += 1;
    }
    lines
}

/// Sizes of every rolled file in roll order.
pub fn rolled_file_sizes(dir: &Path, name: &str) -> Vec<u64> {
    let mut sizes = Vec::new();
    let mut number = 1;
    while let Ok(meta) = fs::metadata(dir.join(format!("{name}.{number}.txt"))) {
        sizes.push(meta.len());
        number += 1;
    }
    sizes
}

/// Argument region of a formatted line: everything after the fourth
/// bracket group.
pub fn args_of(line: &str) -> &str {
    line.splitn(5, ']').nth(4).unwrap_or("")
}

/// Checks the `[timestamp][LEVEL][thread][file:function:line]` prefix.
pub fn has_well_formed_prefix(line: &str) -> bool {
    let bytes = line.as_bytes();
    if bytes.len() < 28 || bytes[0] != b'[' || bytes[27] != b']' {
        return false;
    }
    let timestamp_ok = bytes[5] == b'-'
        && bytes[8] == b'-'
        && bytes[11] == b' '
        && bytes[14] == b':'
        && bytes[17] == b':'
        && bytes[20] == b'.'
        && bytes[21..27].iter().all(u8::is_ascii_digit);

    let mut groups = line.split('[').skip(2);
    let level_ok = groups
        .next()
        .is_some_and(|group| matches!(&group[..group.find(']').unwrap_or(0)], "INFO" | "WARN" | "CRIT" | "XXXX"));
    let thread_ok = groups.next().is_some_and(|group| group.contains(']'));
    let location_ok = groups.next().is_some_and(|group| {
        let Some(end) = group.find(']') else {
            return false;
        };
        group[..end].split(':').count() == 3
    });

    timestamp_ok && level_ok && thread_ok && location_ok
}
