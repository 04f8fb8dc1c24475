//! Rotating file writer.
//!
//! Durable append-only record storage with size/time rotation, bounded
//! retention and optional background gzip compression of rotated files.
//!
//! Two flush strategies are supported:
//!
//! - [`FlushStrategy::Synchronous`] formats, appends and fsyncs inside the
//!   writer mutex on every call. Zero loss once `write` returns.
//! - [`FlushStrategy::Buffered`] enqueues and lets a timer thread drain the
//!   queue periodically. Records at or above `error` severity escalate: the
//!   pending queue is drained in order, the error record lands last, and the
//!   file is fsynced before `write` returns.
//!
//! A single mutex serializes file-handle access, rotation, deletion and
//! retention sweeps, so rotation always happens between two record appends
//! and no record straddles files.

use std::collections::VecDeque;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use chrono::{DateTime, Datelike, Timelike, Utc};
use crossbeam_channel::{Sender, bounded};
use flate2::Compression;
use flate2::write::GzEncoder;
use parking_lot::{Mutex, RwLock};
use regex::Regex;

use crate::clock::{Clock, SystemClock};
use crate::error::{Result, TreelogError};
use crate::format::Formatter;
use crate::level::LogLevel;
use crate::record::LogRecord;
use crate::writer::{ErrorHandler, Writer};

/// Calendar bucket that triggers time-based rotation when crossed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationInterval {
    Hourly,
    Daily,
    /// ISO week.
    Weekly,
    Monthly,
}

impl RotationInterval {
    fn same_bucket(&self, a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
        match self {
            RotationInterval::Hourly => a.date_naive() == b.date_naive() && a.hour() == b.hour(),
            RotationInterval::Daily => a.date_naive() == b.date_naive(),
            RotationInterval::Weekly => a.iso_week() == b.iso_week(),
            RotationInterval::Monthly => a.year() == b.year() && a.month() == b.month(),
        }
    }
}

/// Rotation, retention and compression policy.
#[derive(Default)]
pub struct FileRotationConfig {
    /// Rotate before an append would push the file past this many bytes.
    pub max_file_size: Option<u64>,
    /// Rotate when a record's timestamp falls in a later calendar bucket.
    pub rotation_interval: Option<RotationInterval>,
    /// Keep at most this many files in total (current plus rotated).
    pub max_file_count: Option<usize>,
    /// Delete rotated files older than this.
    pub max_age: Option<Duration>,
    /// Gzip rotated files on a background worker.
    pub compress: bool,
}

/// When bytes reach the disk.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FlushStrategy {
    Synchronous,
    Buffered { interval: Duration },
}

impl FlushStrategy {
    pub const DEFAULT_BUFFER_INTERVAL: Duration = Duration::from_secs(1);
}

impl Default for FlushStrategy {
    /// Synchronous in debug builds, buffered with a one second interval in
    /// release builds.
    fn default() -> Self {
        if cfg!(debug_assertions) {
            FlushStrategy::Synchronous
        } else {
            FlushStrategy::Buffered {
                interval: Self::DEFAULT_BUFFER_INTERVAL,
            }
        }
    }
}

/// One rotated sibling of a base file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotatedFile {
    pub path: PathBuf,
    pub modified: std::time::SystemTime,
}

/// Collision counters above this are a hard failure rather than an unbounded
/// file-name probe.
const MAX_ROTATION_COUNTER: u32 = 10_000;

const ROTATION_STAMP: &str = "%Y-%m-%d_%H-%M-%S";

enum PathState {
    Ready(PathBuf),
    Pending,
    Failed(String),
}

struct EncodedRecord {
    bytes: Vec<u8>,
    timestamp: DateTime<Utc>,
}

struct FileState {
    path: PathState,
    file: Option<File>,
    current_size: u64,
    last_rotation: Option<DateTime<Utc>>,
    pending: VecDeque<EncodedRecord>,
}

struct WriterInner {
    formatter: Box<dyn Formatter>,
    config: FileRotationConfig,
    strategy: FlushStrategy,
    clock: RwLock<Box<dyn Clock>>,
    error_handler: RwLock<ErrorHandler>,
    state: Mutex<FileState>,
    compressions: Mutex<Vec<JoinHandle<std::result::Result<(), String>>>>,
    flush_stop: Mutex<Option<Sender<()>>>,
    flush_thread: Mutex<Option<JoinHandle<()>>>,
    closed: AtomicBool,
}

/// See the module docs. Cheap to clone; clones share the same file state.
#[derive(Clone)]
pub struct RotatingFileWriter {
    inner: Arc<WriterInner>,
}

impl RotatingFileWriter {
    pub fn new(
        path: impl Into<PathBuf>,
        formatter: impl Formatter + 'static,
        config: FileRotationConfig,
    ) -> Self {
        Self::with_strategy(path, formatter, config, FlushStrategy::default())
    }

    pub fn with_strategy(
        path: impl Into<PathBuf>,
        formatter: impl Formatter + 'static,
        config: FileRotationConfig,
        strategy: FlushStrategy,
    ) -> Self {
        let writer = Self::build(PathState::Ready(path.into()), formatter, config, strategy);
        writer.start_flush_timer();
        writer
    }

    /// Base path supplied by a deferred computation. Records written while
    /// the path is still resolving are queued; a resolution failure is
    /// stored and surfaced on every subsequent `write`.
    pub fn with_deferred_path(
        resolver: impl FnOnce() -> std::result::Result<PathBuf, String> + Send + 'static,
        formatter: impl Formatter + 'static,
        config: FileRotationConfig,
        strategy: FlushStrategy,
    ) -> Self {
        let writer = Self::build(PathState::Pending, formatter, config, strategy);
        writer.start_flush_timer();

        let inner = Arc::clone(&writer.inner);
        std::thread::spawn(move || {
            let resolved = resolver();
            let mut state = inner.state.lock();
            match resolved {
                Ok(path) => {
                    state.path = PathState::Ready(path);
                    let sync = matches!(inner.strategy, FlushStrategy::Synchronous);
                    inner.drain_pending(&mut state, sync);
                }
                Err(reason) => {
                    state.pending.clear();
                    state.path = PathState::Failed(reason.clone());
                    drop(state);
                    inner.report(&TreelogError::PathResolution(reason));
                }
            }
        });
        writer
    }

    fn build(
        path: PathState,
        formatter: impl Formatter + 'static,
        config: FileRotationConfig,
        strategy: FlushStrategy,
    ) -> Self {
        RotatingFileWriter {
            inner: Arc::new(WriterInner {
                formatter: Box::new(formatter),
                config,
                strategy,
                clock: RwLock::new(Box::new(SystemClock)),
                error_handler: RwLock::new(Box::new(|error| eprintln!("treelog: {error}"))),
                state: Mutex::new(FileState {
                    path,
                    file: None,
                    current_size: 0,
                    last_rotation: None,
                    pending: VecDeque::new(),
                }),
                compressions: Mutex::new(Vec::new()),
                flush_stop: Mutex::new(None),
                flush_thread: Mutex::new(None),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Replaces the diagnostic channel for swallowed failures.
    pub fn set_error_handler(&self, handler: impl Fn(&TreelogError) + Send + Sync + 'static) {
        *self.inner.error_handler.write() = Box::new(handler);
    }

    /// Injects the clock used for rotation stamps and retention sweeps.
    pub fn set_clock(&self, clock: impl Clock + 'static) {
        *self.inner.clock.write() = Box::new(clock);
    }

    fn start_flush_timer(&self) {
        let FlushStrategy::Buffered { interval } = self.inner.strategy else {
            return;
        };
        let (tx, rx) = bounded::<()>(1);
        let weak = Arc::downgrade(&self.inner);
        let handle = std::thread::spawn(move || {
            loop {
                match rx.recv_timeout(interval) {
                    // Tick: drain whatever accumulated.
                    Err(crossbeam_channel::RecvTimeoutError::Timeout) => {
                        let Some(inner) = weak.upgrade() else { break };
                        let mut state = inner.state.lock();
                        inner.drain_pending(&mut state, false);
                    }
                    // Shutdown or writer dropped.
                    Ok(()) | Err(crossbeam_channel::RecvTimeoutError::Disconnected) => break,
                }
            }
        });
        *self.inner.flush_stop.lock() = Some(tx);
        *self.inner.flush_thread.lock() = Some(handle);
    }

    /// Flushes queued records to the *current* file, then rotates regardless
    /// of thresholds.
    pub fn force_rotate(&self) -> Result<()> {
        let inner = &self.inner;
        let mut state = inner.state.lock();
        inner.drain_pending(&mut state, false);
        let trigger = inner.clock.read().now();
        inner.rotate(&mut state, trigger)
    }

    /// Waits for in-flight compressions, drops queued records, then deletes
    /// the current file and every rotated or compressed sibling.
    pub fn clear_logs(&self) -> Result<()> {
        self.inner.join_compressions();
        let mut state = self.inner.state.lock();
        state.pending.clear();
        state.file = None;
        state.current_size = 0;
        let PathState::Ready(path) = &state.path else {
            return Ok(());
        };
        let path = path.clone();
        for sibling in rotated_siblings(&path) {
            if let Err(err) = fs::remove_file(&sibling.path) {
                self.inner
                    .report(&TreelogError::Rotation(format!(
                        "delete {}: {err}",
                        sibling.path.display()
                    )));
            }
        }
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }

    /// Rotated siblings of the base path, unordered.
    pub fn rotated_files(&self) -> Vec<RotatedFile> {
        let state = self.inner.state.lock();
        match &state.path {
            PathState::Ready(path) => rotated_siblings(path),
            _ => Vec::new(),
        }
    }
}

impl Writer for RotatingFileWriter {
    fn requires_caller_info(&self) -> bool {
        self.inner.formatter.requires_caller_info()
    }

    fn write(&self, record: &LogRecord) -> Result<()> {
        let inner = &self.inner;
        if inner.closed.load(Ordering::Acquire) {
            return Ok(());
        }

        let mut bytes = Vec::with_capacity(128);
        if let Err(err) = inner.formatter.format(record, &mut bytes) {
            inner.report(&err);
            return Ok(());
        }
        bytes.extend_from_slice(inner.formatter.record_separator());
        let encoded = EncodedRecord {
            bytes,
            timestamp: record.timestamp,
        };

        let mut state = inner.state.lock();
        match &state.path {
            PathState::Pending => {
                state.pending.push_back(encoded);
                return Ok(());
            }
            PathState::Failed(reason) => {
                return Err(TreelogError::PathResolution(reason.clone()));
            }
            PathState::Ready(_) => {}
        }

        match inner.strategy {
            FlushStrategy::Synchronous => {
                if let Err(err) = inner.append(&mut state, &encoded, true) {
                    inner.report(&err);
                }
            }
            FlushStrategy::Buffered { .. } => {
                state.pending.push_back(encoded);
                if record.level >= LogLevel::ERROR {
                    // Escalation: pending records land first, in order, then
                    // the file is made durable before `write` returns.
                    inner.drain_pending(&mut state, true);
                }
            }
        }
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        let inner = &self.inner;
        let mut state = inner.state.lock();
        if let PathState::Failed(reason) = &state.path {
            return Err(TreelogError::PathResolution(reason.clone()));
        }
        inner.drain_pending(&mut state, false);
        if let Some(file) = &state.file {
            file.sync_all()?;
        }
        Ok(())
    }

    fn close(&self) -> Result<()> {
        let inner = &self.inner;
        inner.closed.store(true, Ordering::Release);

        // Stop the flush timer before the final drain.
        let stop = inner.flush_stop.lock().take();
        drop(stop);
        if let Some(handle) = inner.flush_thread.lock().take() {
            let _ = handle.join();
        }

        {
            let mut state = inner.state.lock();
            inner.drain_pending(&mut state, false);
            if let Some(file) = state.file.take() {
                file.sync_all()?;
            }
        }
        inner.join_compressions();
        Ok(())
    }

    fn handle_error(&self, error: &TreelogError) {
        self.inner.report(error);
    }
}

impl WriterInner {
    fn report(&self, error: &TreelogError) {
        (self.error_handler.read())(error);
    }

    /// Appends every queued record in order, reporting but not re-raising
    /// per-record failures, then optionally fsyncs.
    fn drain_pending(&self, state: &mut FileState, sync: bool) {
        while let Some(encoded) = state.pending.pop_front() {
            if let Err(err) = self.append(state, &encoded, false) {
                self.report(&err);
            }
        }
        if sync {
            if let Some(file) = &state.file {
                if let Err(err) = file.sync_all() {
                    self.report(&TreelogError::Write(err));
                }
            }
        }
    }

    /// Rotation decision, the append itself, and (for the synchronous
    /// strategy) the fsync. Runs under the state mutex.
    fn append(&self, state: &mut FileState, encoded: &EncodedRecord, sync: bool) -> Result<()> {
        use std::io::Write as _;

        self.ensure_open(state)?;

        if self.should_rotate(state, encoded) {
            // A failed rotation is reported, not fatal: the writer reopens
            // and the record still lands in the current file.
            if let Err(err) = self.rotate(state, encoded.timestamp) {
                self.report(&err);
            }
        }

        let Some(file) = state.file.as_mut() else {
            return Err(TreelogError::Write(io::Error::other("log file handle missing")));
        };
        file.write_all(&encoded.bytes)?;
        state.current_size += encoded.bytes.len() as u64;
        if sync {
            file.sync_all()?;
        }
        Ok(())
    }

    /// Opens (or re-opens) the base file. Recovers from external deletion:
    /// if the path vanished underneath us, the stale handle is dropped and a
    /// fresh file is created, parents included.
    fn ensure_open(&self, state: &mut FileState) -> Result<()> {
        let PathState::Ready(path) = &state.path else {
            return Err(TreelogError::PathResolution("path not resolved".into()));
        };
        let path = path.clone();

        if state.file.is_some() && !path.exists() {
            state.file = None;
        }
        if state.file.is_none() {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }
            let file = OpenOptions::new().create(true).append(true).open(&path)?;
            state.current_size = file.metadata()?.len();
            state.file = Some(file);
            if state.last_rotation.is_none() {
                state.last_rotation = Some(self.clock.read().now());
            }
        }
        Ok(())
    }

    fn should_rotate(&self, state: &FileState, encoded: &EncodedRecord) -> bool {
        if let Some(limit) = self.config.max_file_size {
            if state.current_size > 0 && state.current_size + encoded.bytes.len() as u64 > limit {
                return true;
            }
        }
        if let (Some(interval), Some(last)) = (self.config.rotation_interval, state.last_rotation) {
            // Backward wall-clock jumps are no-ops: only a strictly later
            // bucket rotates, keeping last_rotation monotonic.
            if encoded.timestamp > last && !interval.same_bucket(last, encoded.timestamp) {
                return true;
            }
        }
        false
    }

    /// The atomic rotation sequence: flush + close, rename to a name stamped
    /// with the *previous* period start, schedule compression, sweep
    /// retention, reset counters, reopen.
    fn rotate(&self, state: &mut FileState, trigger: DateTime<Utc>) -> Result<()> {
        let PathState::Ready(path) = &state.path else {
            return Err(TreelogError::PathResolution("path not resolved".into()));
        };
        let path = path.clone();

        if let Some(file) = state.file.take() {
            let _ = file.sync_all();
        }

        // The rotated file holds the previous period, so its name derives
        // from last_rotation, not from the triggering record.
        let stamp_instant = state.last_rotation.unwrap_or(trigger);
        let rotated = match free_rotated_path(&path, stamp_instant) {
            Some(rotated) => rotated,
            None => {
                let err = TreelogError::Rotation(format!(
                    "no free rotated name for {} after {} attempts",
                    path.display(),
                    MAX_ROTATION_COUNTER
                ));
                self.reopen_after_rotation(state, trigger);
                return Err(err);
            }
        };

        if let Err(io_err) = fs::rename(&path, &rotated) {
            let err = TreelogError::Rotation(format!(
                "rename {} -> {}: {io_err}",
                path.display(),
                rotated.display()
            ));
            self.reopen_after_rotation(state, trigger);
            return Err(err);
        }

        if self.config.compress {
            self.spawn_compression(rotated);
        }
        self.apply_retention(&path);
        self.reopen_after_rotation(state, trigger);
        Ok(())
    }

    fn reopen_after_rotation(&self, state: &mut FileState, trigger: DateTime<Utc>) {
        state.current_size = 0;
        // Monotonically non-decreasing.
        state.last_rotation = Some(match state.last_rotation {
            Some(last) if last > trigger => last,
            _ => trigger,
        });
        if let Err(err) = self.ensure_open(state) {
            self.report(&err);
        }
    }

    fn spawn_compression(&self, rotated: PathBuf) {
        let handle = std::thread::spawn(move || -> std::result::Result<(), String> {
            let gz_path = {
                let mut name = rotated.as_os_str().to_owned();
                name.push(".gz");
                PathBuf::from(name)
            };
            let mut source =
                File::open(&rotated).map_err(|e| format!("open {}: {e}", rotated.display()))?;
            let target =
                File::create(&gz_path).map_err(|e| format!("create {}: {e}", gz_path.display()))?;
            let mut encoder = GzEncoder::new(target, Compression::default());
            io::copy(&mut source, &mut encoder)
                .and_then(|_| encoder.finish().map(drop))
                .map_err(|e| format!("compress {}: {e}", rotated.display()))?;
            fs::remove_file(&rotated).map_err(|e| format!("remove {}: {e}", rotated.display()))?;
            Ok(())
        });
        self.compressions.lock().push(handle);
    }

    fn join_compressions(&self) {
        let handles: Vec<_> = self.compressions.lock().drain(..).collect();
        for handle in handles {
            match handle.join() {
                Ok(Ok(())) => {}
                Ok(Err(reason)) => self.report(&TreelogError::Rotation(reason)),
                Err(_) => self.report(&TreelogError::Rotation("compression worker panicked".into())),
            }
        }
    }

    /// Deletes rotated files beyond `max_file_count - 1` (newest kept) and
    /// older than `max_age`. Per-file failures are reported and skipped.
    fn apply_retention(&self, base: &Path) {
        let mut rotated = rotated_siblings(base);
        if rotated.is_empty() {
            return;
        }
        rotated.sort_by(|a, b| b.modified.cmp(&a.modified));

        let mut doomed: Vec<&RotatedFile> = Vec::new();
        if let Some(max_count) = self.config.max_file_count {
            let keep = max_count.saturating_sub(1);
            doomed.extend(rotated.iter().skip(keep));
        }
        if let Some(max_age) = self.config.max_age {
            let now = std::time::SystemTime::now();
            for file in &rotated {
                let too_old = now
                    .duration_since(file.modified)
                    .map(|age| age > max_age)
                    .unwrap_or(false);
                if too_old && !doomed.iter().any(|d| d.path == file.path) {
                    doomed.push(file);
                }
            }
        }
        for file in doomed {
            if let Err(err) = fs::remove_file(&file.path) {
                self.report(&TreelogError::Rotation(format!(
                    "retention delete {}: {err}",
                    file.path.display()
                )));
            }
        }
    }
}

/// Splits `app.log` into `("app", ".log")`; extensionless names get an empty
/// suffix.
fn split_base(base: &Path) -> (String, String) {
    let name = base
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    match name.rfind('.') {
        Some(pos) if pos > 0 => (name[..pos].to_string(), name[pos..].to_string()),
        _ => (name.to_string(), String::new()),
    }
}

fn rotated_path(base: &Path, stamp: &str, counter: u32) -> PathBuf {
    let (stem, ext) = split_base(base);
    let suffix = if counter == 0 {
        String::new()
    } else {
        format!("_{counter}")
    };
    base.with_file_name(format!("{stem}.{stamp}{suffix}{ext}"))
}

/// First non-existing rotated name, probing the collision counter. `None`
/// once the counter exceeds its clamp.
fn free_rotated_path(base: &Path, instant: DateTime<Utc>) -> Option<PathBuf> {
    let stamp = instant.format(ROTATION_STAMP).to_string();
    for counter in 0..=MAX_ROTATION_COUNTER {
        let candidate = rotated_path(base, &stamp, counter);
        let gz = {
            let mut name = candidate.as_os_str().to_owned();
            name.push(".gz");
            PathBuf::from(name)
        };
        if !candidate.exists() && !gz.exists() {
            return Some(candidate);
        }
    }
    None
}

/// Regex matching rotated (and compressed) siblings of `base`:
/// `<stem>.<YYYY-MM-DD_HH-MM-SS>[_<n>][<ext>][.gz]`.
pub(crate) fn rotated_name_regex(base: &Path) -> Regex {
    let (stem, ext) = split_base(base);
    let pattern = format!(
        r"^{}\.\d{{4}}-\d{{2}}-\d{{2}}_\d{{2}}-\d{{2}}-\d{{2}}(_\d+)?({})?(\.gz)?$",
        regex::escape(&stem),
        regex::escape(&ext),
    );
    Regex::new(&pattern).expect("rotated name pattern compiles")
}

/// Enumerates rotated siblings of `base` in its directory, excluding the
/// base file itself.
pub(crate) fn rotated_siblings(base: &Path) -> Vec<RotatedFile> {
    let Some(dir) = base.parent().filter(|p| !p.as_os_str().is_empty()) else {
        return Vec::new();
    };
    let pattern = rotated_name_regex(base);
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut rotated = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !pattern.is_match(name) {
            continue;
        }
        let modified = entry
            .metadata()
            .and_then(|m| m.modified())
            .unwrap_or(std::time::SystemTime::UNIX_EPOCH);
        rotated.push(RotatedFile { path, modified });
    }
    rotated
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn rotated_name_recognition() {
        let base = Path::new("/var/log/app.log");
        let re = rotated_name_regex(base);
        assert!(re.is_match("app.2025-08-22_14-03-59.log"));
        assert!(re.is_match("app.2025-08-22_14-03-59_2.log"));
        assert!(re.is_match("app.2025-08-22_14-03-59.log.gz"));
        assert!(re.is_match("app.2025-08-22_14-03-59"));
        assert!(!re.is_match("app.log"));
        assert!(!re.is_match("other.2025-08-22_14-03-59.log"));
        assert!(!re.is_match("app.2025-08-22.log"));
    }

    #[test]
    fn rotated_path_inserts_stamp_before_extension() {
        let base = Path::new("/tmp/logs/app.log");
        assert_eq!(
            rotated_path(base, "2025-08-22_14-03-59", 0),
            Path::new("/tmp/logs/app.2025-08-22_14-03-59.log")
        );
        assert_eq!(
            rotated_path(base, "2025-08-22_14-03-59", 3),
            Path::new("/tmp/logs/app.2025-08-22_14-03-59_3.log")
        );
    }

    #[test]
    fn extensionless_base_splits_cleanly() {
        assert_eq!(split_base(Path::new("audit")), ("audit".into(), "".into()));
        assert_eq!(
            split_base(Path::new("app.log")),
            ("app".into(), ".log".into())
        );
    }

    #[test]
    fn collision_counter_probes_until_free() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("app.log");
        let instant = Utc.with_ymd_and_hms(2025, 8, 22, 14, 3, 59).unwrap();

        let first = free_rotated_path(&base, instant).unwrap();
        assert!(first.to_str().unwrap().ends_with("app.2025-08-22_14-03-59.log"));

        fs::write(&first, b"taken").unwrap();
        let second = free_rotated_path(&base, instant).unwrap();
        assert!(
            second
                .to_str()
                .unwrap()
                .ends_with("app.2025-08-22_14-03-59_1.log")
        );
    }

    #[test]
    fn bucket_comparisons() {
        let t = |h: u32| Utc.with_ymd_and_hms(2025, 8, 22, h, 0, 0).unwrap();
        assert!(RotationInterval::Hourly.same_bucket(t(3), t(3)));
        assert!(!RotationInterval::Hourly.same_bucket(t(3), t(4)));
        assert!(RotationInterval::Daily.same_bucket(t(3), t(23)));
        assert!(!RotationInterval::Daily.same_bucket(
            t(3),
            Utc.with_ymd_and_hms(2025, 8, 23, 3, 0, 0).unwrap()
        ));
        // 2025-08-22 and 2025-08-24 share ISO week 34; the 25th starts week 35.
        assert!(RotationInterval::Weekly.same_bucket(
            t(0),
            Utc.with_ymd_and_hms(2025, 8, 24, 0, 0, 0).unwrap()
        ));
        assert!(!RotationInterval::Weekly.same_bucket(
            t(0),
            Utc.with_ymd_and_hms(2025, 8, 25, 0, 0, 0).unwrap()
        ));
        assert!(!RotationInterval::Monthly.same_bucket(
            t(0),
            Utc.with_ymd_and_hms(2025, 9, 1, 0, 0, 0).unwrap()
        ));
    }
}
