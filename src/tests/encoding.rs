// src/tests/encoding.rs

use super::*;
use crate::record::{Text, corrupt};

#[test]
fn scalar_round_trip() {
    let mut record = test_record(Level::Info);
    record
        .arg(b'A')
        .arg(123u32)
        .arg(18_446_744_073_709_551_615u64)
        .arg(-42i32)
        .arg(-9_000_000_000i64)
        .arg(-42.42f64);

    let line = stringified(&record);
    assert_eq!(args_of(&line), "A12318446744073709551615-42-9000000000-42.42");
}

#[test]
fn literal_and_copied_concatenate() {
    let mut record = test_record(Level::Info);
    let owned = String::from("OWN");
    record.arg("LIT").arg(Text(&owned));

    // The copied argument must survive the source being destroyed.
    drop(owned);

    assert_eq!(args_of(&stringified(&record)), "LITOWN");
}

#[test]
fn copied_string_is_a_copy() {
    let mut record = test_record(Level::Info);
    let mut source = String::from("before");
    record.arg(Text(&source));

    // Mutating the source after the append must not change the record.
    source.clear();
    source.push_str("after!");

    assert_eq!(args_of(&stringified(&record)), "before");
}

#[test]
fn owned_string_argument() {
    let mut record = test_record(Level::Info);
    record.arg(String::from("owned"));
    assert_eq!(args_of(&stringified(&record)), "owned");
}

#[test]
fn zero_argument_record_is_prefix_only() {
    let record = test_record(Level::Warn);
    let line = stringified(&record);
    assert_eq!(args_of(&line), "");
    assert!(line.ends_with("]\n"));
}

#[test]
fn zero_length_copied_string_is_skipped() {
    let mut record = test_record(Level::Info);
    let before = record.bytes_used();
    record.arg(String::new()).arg(Text(""));
    assert_eq!(record.bytes_used(), before);
}

#[test]
fn prefix_shape() {
    let line = stringified(&test_record(Level::Crit));

    // [YYYY-MM-DD HH:MM:SS.uuuuuu]
    let bytes = line.as_bytes();
    assert_eq!(bytes[0], b'[');
    assert_eq!(bytes[5], b'-');
    assert_eq!(bytes[8], b'-');
    assert_eq!(bytes[11], b' ');
    assert_eq!(bytes[14], b':');
    assert_eq!(bytes[17], b':');
    assert_eq!(bytes[20], b'.');
    assert_eq!(bytes[27], b']');
    assert!(bytes[21..27].iter().all(u8::is_ascii_digit));

    assert!(line[28..].starts_with("[CRIT]"));

    // [file:function:line] with exactly the delimiting colons.
    let location = line.splitn(5, '[').nth(4).unwrap();
    let location = &location[..location.find(']').unwrap()];
    let pieces: Vec<&str> = location.split(':').collect();
    assert_eq!(pieces.len(), 3);
    assert_eq!(pieces[1], "helper");
    assert!(pieces[2].bytes().all(|b| b.is_ascii_digit()));
}

#[test]
fn heap_migration_and_doubling() {
    let mut record = test_record(Level::Info);
    let inline_capacity = record.capacity();
    assert!(inline_capacity < 256);

    // First spill: max(512, required).
    record.arg(Text(&"x".repeat(300)));
    assert_eq!(record.capacity(), 512);

    // Second growth doubles.
    record.arg(Text(&"y".repeat(300)));
    assert_eq!(record.capacity(), 1024);

    // Oversized requirement wins over doubling.
    record.arg(Text(&"z".repeat(4096)));
    assert!(record.capacity() >= record.bytes_used());
    let stringified_record = stringified(&record);
    let expected = args_of(&stringified_record);
    assert_eq!(expected.len(), 300 + 300 + 4096);
}

#[test]
fn unknown_tag_ends_argument_decoding() {
    let mut record = test_record(Level::Info);
    record.arg(1u32).arg(2u32);

    // Corrupt the first argument's tag byte; the rest of the body is
    // discarded but the prefix and newline survive.
    corrupt::poke(&mut record, corrupt::FIRST_ARG_OFFSET, 0xFF);
    let line = stringified(&record);
    assert_eq!(args_of(&line), "");
    assert!(line.ends_with('\n'));
}

#[test]
fn corrupt_level_byte_renders_xxxx() {
    let mut record = test_record(Level::Info);
    corrupt::poke(&mut record, corrupt::FIRST_ARG_OFFSET - 1, 0x7E);
    let line = stringified(&record);
    assert!(line.contains("[XXXX]"));
}

#[test]
fn thread_identifier_is_stable_per_thread() {
    let first = stringified(&test_record(Level::Info));
    let second = stringified(&test_record(Level::Info));
    assert_eq!(bracket_group(&first, 2), bracket_group(&second, 2));

    let other = std::thread::spawn(|| stringified(&test_record(Level::Info)))
        .join()
        .unwrap();
    assert_ne!(bracket_group(&first, 2), bracket_group(&other, 2));
}

/// Contents of the n-th `[...]` group of a line (0-based).
fn bracket_group(line: &str, n: usize) -> String {
    let group = line.split('[').nth(n + 1).unwrap();
    group[..group.find(']').unwrap()].to_string()
}
