//! Rotating file writer: durability, rotation, retention, compression,
//! deferred paths, and recovery.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use chrono::TimeZone;
use parking_lot::Mutex;
use tempfile::TempDir;

use super::{LineFormatter, record};
use crate::clock::FixedClock;
use crate::format::json::JsonFormatter;
use crate::level::LogLevel;
use crate::writer::Writer;
use crate::writer::reader::RotatingFileReader;
use crate::writer::rotating::{
    FileRotationConfig, FlushStrategy, RotatingFileWriter, RotationInterval,
};

fn scratch() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let base = dir.path().join("app.log");
    (dir, base)
}

fn sync_writer(base: &PathBuf, config: FileRotationConfig) -> RotatingFileWriter {
    RotatingFileWriter::with_strategy(base, LineFormatter, config, FlushStrategy::Synchronous)
}

#[test]
fn synchronous_write_is_durable_before_flush() {
    let (_dir, base) = scratch();
    let writer = sync_writer(&base, FileRotationConfig::default());

    writer.write(&record(LogLevel::INFO, "first")).unwrap();
    writer.write(&record(LogLevel::INFO, "second")).unwrap();

    assert_eq!(fs::read_to_string(&base).unwrap(), "first\nsecond\n");
}

#[test]
fn size_rotation_keeps_every_record_in_order_without_splits() {
    let (dir, base) = scratch();
    // Records are "id=NN\n" = 6 bytes; 15 fit under the 90-byte limit, so 40
    // records produce two rotated files plus the current tail.
    let writer = sync_writer(
        &base,
        FileRotationConfig {
            max_file_size: Some(90),
            max_file_count: Some(3),
            ..FileRotationConfig::default()
        },
    );

    for id in 1..=40 {
        writer
            .write(&record(LogLevel::INFO, &format!("id={id:02}")))
            .unwrap();
        // Rotated siblings are ordered by mtime; give the filesystem a tick.
        if id % 15 == 0 {
            thread::sleep(Duration::from_millis(30));
        }
    }
    writer.close().unwrap();

    let rotated = writer.rotated_files();
    assert_eq!(rotated.len(), 2, "expected exactly two rotated files");

    let reader = RotatingFileReader::new(&base);
    let all = reader.read(None).unwrap();
    let expected: Vec<String> = (1..=40).map(|id| format!("id={id:02}")).collect();
    assert_eq!(all, expected);

    // No record straddles two files.
    for path in reader.list_files(true) {
        for line in fs::read_to_string(&path).unwrap().lines() {
            assert!(line.starts_with("id="), "split record: {line:?} in {path:?}");
        }
    }
    drop(dir);
}

#[test]
fn retention_deletes_oldest_beyond_count() {
    let (_dir, base) = scratch();
    let writer = sync_writer(
        &base,
        FileRotationConfig {
            max_file_size: Some(6),
            max_file_count: Some(2),
            ..FileRotationConfig::default()
        },
    );

    for id in 0..6 {
        writer
            .write(&record(LogLevel::INFO, &format!("rec-{id}")))
            .unwrap();
        thread::sleep(Duration::from_millis(25));
    }

    // current + at most one rotated survive.
    assert!(writer.rotated_files().len() <= 1);
    assert!(base.exists());
}

#[test]
fn time_rotation_uses_previous_period_stamp_and_ignores_backward_jumps() {
    let (_dir, base) = scratch();
    let writer = sync_writer(
        &base,
        FileRotationConfig {
            rotation_interval: Some(RotationInterval::Daily),
            ..FileRotationConfig::default()
        },
    );
    let day_one = chrono::Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap();
    writer.set_clock(FixedClock::at(day_one));

    let mut rec = record(LogLevel::INFO, "day-1");
    rec.timestamp = day_one;
    writer.write(&rec).unwrap();

    let mut rec = record(LogLevel::INFO, "day-2");
    rec.timestamp = chrono::Utc.with_ymd_and_hms(2025, 3, 2, 0, 30, 0).unwrap();
    writer.write(&rec).unwrap();

    let rotated = writer.rotated_files();
    assert_eq!(rotated.len(), 1);
    // The rotated name carries the previous period's start instant.
    let name = rotated[0].path.file_name().unwrap().to_str().unwrap();
    assert!(name.starts_with("app.2025-03-01_10-00-00"), "got {name}");
    assert_eq!(fs::read_to_string(&base).unwrap(), "day-2\n");

    // A wall-clock jump backwards must not rotate again.
    let mut rec = record(LogLevel::INFO, "jumped-back");
    rec.timestamp = day_one;
    writer.write(&rec).unwrap();
    assert_eq!(writer.rotated_files().len(), 1);
    assert_eq!(fs::read_to_string(&base).unwrap(), "day-2\njumped-back\n");
}

#[test]
fn buffered_error_escalation_flushes_pending_in_order() {
    let (_dir, base) = scratch();
    let writer = RotatingFileWriter::with_strategy(
        &base,
        LineFormatter,
        FileRotationConfig::default(),
        FlushStrategy::Buffered {
            interval: Duration::from_secs(60),
        },
    );

    writer.write(&record(LogLevel::INFO, "a")).unwrap();
    writer.write(&record(LogLevel::INFO, "b")).unwrap();
    // Nothing on disk yet: the timer is a minute away.
    assert_eq!(fs::read_to_string(&base).unwrap_or_default(), "");

    writer.write(&record(LogLevel::ERROR, "BOOM")).unwrap();
    // The error write escalated: everything is on disk, in call order.
    assert_eq!(fs::read_to_string(&base).unwrap(), "a\nb\nBOOM\n");
}

#[test]
fn buffered_flush_and_close_land_everything() {
    let (_dir, base) = scratch();
    let writer = RotatingFileWriter::with_strategy(
        &base,
        LineFormatter,
        FileRotationConfig::default(),
        FlushStrategy::Buffered {
            interval: Duration::from_secs(60),
        },
    );

    writer.write(&record(LogLevel::INFO, "queued-1")).unwrap();
    writer.flush().unwrap();
    assert_eq!(fs::read_to_string(&base).unwrap(), "queued-1\n");

    writer.write(&record(LogLevel::INFO, "queued-2")).unwrap();
    writer.close().unwrap();
    assert_eq!(fs::read_to_string(&base).unwrap(), "queued-1\nqueued-2\n");
}

#[test]
fn buffered_timer_drains_without_explicit_flush() {
    let (_dir, base) = scratch();
    let writer = RotatingFileWriter::with_strategy(
        &base,
        LineFormatter,
        FileRotationConfig::default(),
        FlushStrategy::Buffered {
            interval: Duration::from_millis(50),
        },
    );

    writer.write(&record(LogLevel::INFO, "ticked")).unwrap();
    thread::sleep(Duration::from_millis(400));
    assert_eq!(fs::read_to_string(&base).unwrap(), "ticked\n");
}

#[test]
fn compression_produces_gz_siblings_readable_by_the_reader() {
    let (_dir, base) = scratch();
    let writer = sync_writer(
        &base,
        FileRotationConfig {
            max_file_size: Some(6),
            compress: true,
            ..FileRotationConfig::default()
        },
    );

    for id in 0..3 {
        writer
            .write(&record(LogLevel::INFO, &format!("rec-{id}")))
            .unwrap();
        thread::sleep(Duration::from_millis(25));
    }
    // close joins the compression workers.
    writer.close().unwrap();

    let rotated = writer.rotated_files();
    assert_eq!(rotated.len(), 2);
    assert!(
        rotated
            .iter()
            .all(|f| f.path.extension().is_some_and(|e| e == "gz")),
        "rotated files should all be compressed: {rotated:?}"
    );

    let reader = RotatingFileReader::new(&base);
    assert_eq!(reader.read(None).unwrap(), vec!["rec-0", "rec-1", "rec-2"]);
}

#[test]
fn externally_deleted_file_is_recreated() {
    let (_dir, base) = scratch();
    let writer = sync_writer(&base, FileRotationConfig::default());

    writer.write(&record(LogLevel::INFO, "one")).unwrap();
    fs::remove_file(&base).unwrap();
    writer.write(&record(LogLevel::INFO, "two")).unwrap();

    assert_eq!(fs::read_to_string(&base).unwrap(), "two\n");
}

#[test]
fn force_rotate_flushes_queued_records_into_the_old_file() {
    let (_dir, base) = scratch();
    let writer = RotatingFileWriter::with_strategy(
        &base,
        LineFormatter,
        FileRotationConfig::default(),
        FlushStrategy::Buffered {
            interval: Duration::from_secs(60),
        },
    );

    writer.write(&record(LogLevel::INFO, "pre-rotation")).unwrap();
    writer.force_rotate().unwrap();
    writer.write(&record(LogLevel::INFO, "post-rotation")).unwrap();
    writer.close().unwrap();

    let rotated = writer.rotated_files();
    assert_eq!(rotated.len(), 1);
    assert_eq!(
        fs::read_to_string(&rotated[0].path).unwrap(),
        "pre-rotation\n"
    );
    assert_eq!(fs::read_to_string(&base).unwrap(), "post-rotation\n");
}

#[test]
fn clear_logs_removes_current_and_rotated_set() {
    let (_dir, base) = scratch();
    let writer = sync_writer(
        &base,
        FileRotationConfig {
            max_file_size: Some(6),
            ..FileRotationConfig::default()
        },
    );
    for id in 0..4 {
        writer
            .write(&record(LogLevel::INFO, &format!("rec-{id}")))
            .unwrap();
    }
    assert!(!writer.rotated_files().is_empty());

    writer.clear_logs().unwrap();
    assert!(!base.exists());
    assert!(writer.rotated_files().is_empty());

    // The writer stays usable after clearing.
    writer.write(&record(LogLevel::INFO, "fresh")).unwrap();
    assert_eq!(fs::read_to_string(&base).unwrap(), "fresh\n");
}

#[test]
fn deferred_path_queues_until_resolution() {
    let (dir, base) = scratch();
    let resolved = base.clone();
    let writer = RotatingFileWriter::with_deferred_path(
        move || {
            thread::sleep(Duration::from_millis(150));
            Ok(resolved)
        },
        LineFormatter,
        FileRotationConfig::default(),
        FlushStrategy::Synchronous,
    );

    writer.write(&record(LogLevel::INFO, "early-1")).unwrap();
    writer.write(&record(LogLevel::INFO, "early-2")).unwrap();
    assert!(!base.exists());

    thread::sleep(Duration::from_millis(400));
    assert_eq!(fs::read_to_string(&base).unwrap(), "early-1\nearly-2\n");
    drop(dir);
}

#[test]
fn failed_path_resolution_surfaces_on_every_write() {
    let reported = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&reported);
    let writer = RotatingFileWriter::with_deferred_path(
        || {
            thread::sleep(Duration::from_millis(100));
            Err("no writable directory".to_string())
        },
        LineFormatter,
        FileRotationConfig::default(),
        FlushStrategy::Synchronous,
    );
    writer.set_error_handler(move |err| sink.lock().push(err.to_string()));

    thread::sleep(Duration::from_millis(200));
    let first = writer.write(&record(LogLevel::INFO, "x"));
    let second = writer.write(&record(LogLevel::INFO, "y"));
    assert!(matches!(first, Err(crate::TreelogError::PathResolution(_))));
    assert!(matches!(second, Err(crate::TreelogError::PathResolution(_))));
    assert!(!reported.lock().is_empty());
}

#[test]
fn json_formatter_uses_plain_newline_framing() {
    let (_dir, base) = scratch();
    let writer = RotatingFileWriter::with_strategy(
        &base,
        JsonFormatter::new(),
        FileRotationConfig::default(),
        FlushStrategy::Synchronous,
    );
    writer.write(&record(LogLevel::INFO, "a")).unwrap();
    writer.write(&record(LogLevel::INFO, "b")).unwrap();

    let content = fs::read_to_string(&base).unwrap();
    assert_eq!(content.lines().count(), 2);
    for line in content.lines() {
        let parsed: serde_json::Value = serde_json::from_str(line).unwrap();
        assert_eq!(parsed["level"], "info");
    }
}
