//! Reading rotated log sets back.
//!
//! The reader enumerates the rotated siblings of a base path, streams
//! records chronologically across files (decompressing `.gz` siblings in
//! memory), supports "last N records" tails, and can follow the live file.
//! Following uses filesystem notifications where the platform delivers them
//! and always keeps a polling safety net, because events are unreliable on
//! network mounts and with editors that rewrite files.

use std::fs::{self, File};
use std::io::Read as _;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, bounded, select, unbounded};
use flate2::read::GzDecoder;
use notify::{RecommendedWatcher, RecursiveMode, Watcher};

use crate::error::{Result, TreelogError};

use super::rotating::rotated_siblings;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

pub struct RotatingFileReader {
    base: PathBuf,
    separator: Vec<u8>,
    poll_interval: Duration,
}

impl RotatingFileReader {
    /// Reader splitting on the default `\n` record separator.
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self::with_separator(base, b"\n")
    }

    /// Reader splitting on the separator the producing formatter declared.
    pub fn with_separator(base: impl Into<PathBuf>, separator: &[u8]) -> Self {
        RotatingFileReader {
            base: base.into(),
            separator: separator.to_vec(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Shortens or lengthens the polling safety net used by [`tail`].
    ///
    /// [`tail`]: RotatingFileReader::tail
    pub fn set_poll_interval(&mut self, interval: Duration) {
        self.poll_interval = interval;
    }

    /// Absolute paths sorted oldest to newest by modification time. The base
    /// file, when requested and present, is part of the ordering.
    pub fn list_files(&self, include_current: bool) -> Vec<PathBuf> {
        let mut files: Vec<(std::time::SystemTime, PathBuf)> = rotated_siblings(&self.base)
            .into_iter()
            .map(|f| (f.modified, f.path))
            .collect();
        if include_current && self.base.is_file() {
            let modified = fs::metadata(&self.base)
                .and_then(|m| m.modified())
                .unwrap_or(std::time::SystemTime::now());
            files.push((modified, self.base.clone()));
        }
        files.sort_by(|a, b| a.0.cmp(&b.0));
        files.into_iter().map(|(_, path)| path).collect()
    }

    /// Streams records chronologically across the rotated set.
    ///
    /// With `last = Some(n)` the reader walks files newest-first,
    /// accumulating tail records from each until it has `n`, then emits them
    /// oldest-first.
    pub fn read(&self, last: Option<usize>) -> Result<Vec<String>> {
        let files = self.list_files(true);
        match last {
            None => {
                let mut records = Vec::new();
                for path in &files {
                    records.extend(self.records_of(path)?);
                }
                Ok(records)
            }
            Some(n) => {
                let mut tail: Vec<String> = Vec::new();
                for path in files.iter().rev() {
                    if tail.len() >= n {
                        break;
                    }
                    let mut records = self.records_of(path)?;
                    let missing = n - tail.len();
                    if records.len() > missing {
                        records.drain(..records.len() - missing);
                    }
                    records.extend(tail);
                    tail = records;
                }
                Ok(tail)
            }
        }
    }

    /// Emits the snapshot of `read(last)`, then follows the base file,
    /// emitting new records as they appear. Dropping the returned [`Tail`]
    /// cancels the follow thread and its polling timer.
    pub fn tail(&self, last: Option<usize>) -> Result<Tail> {
        let (record_tx, record_rx) = unbounded::<String>();
        let (stop_tx, stop_rx) = bounded::<()>(1);

        // The snapshot and the follow offset come from a single read of the
        // base file, so no record is duplicated or skipped at the boundary.
        let mut snapshot: Vec<String> = Vec::new();
        let mut offset = 0u64;
        for path in self.list_files(true) {
            if path == self.base {
                let raw = fs::read(&path).unwrap_or_default();
                offset = raw.len() as u64;
                snapshot.extend(split_records(&raw, &self.separator));
            } else {
                snapshot.extend(self.records_of(&path)?);
            }
        }
        if let Some(n) = last {
            if snapshot.len() > n {
                snapshot.drain(..snapshot.len() - n);
            }
        }
        for record in snapshot {
            let _ = record_tx.send(record);
        }

        let follow = FollowState {
            base: self.base.clone(),
            separator: self.separator.clone(),
            offset,
            partial: Vec::new(),
        };
        let poll_interval = self.poll_interval;
        let handle = std::thread::spawn(move || {
            follow_loop(follow, poll_interval, record_tx, stop_rx);
        });

        Ok(Tail {
            records: record_rx,
            _stop: stop_tx,
            _thread: handle,
        })
    }

    /// Complete records in one file, decompressing `.gz` in memory. A
    /// trailing chunk without separator still counts as a record.
    fn records_of(&self, path: &Path) -> Result<Vec<String>> {
        let raw = fs::read(path).map_err(TreelogError::Write)?;
        let content = if path.extension().is_some_and(|e| e == "gz") {
            let mut decoded = Vec::new();
            GzDecoder::new(raw.as_slice())
                .read_to_end(&mut decoded)
                .map_err(TreelogError::Write)?;
            decoded
        } else {
            raw
        };
        Ok(split_records(&content, &self.separator))
    }
}

/// Live subscription handle. Iterate to receive records; drop to cancel.
pub struct Tail {
    records: Receiver<String>,
    _stop: Sender<()>,
    _thread: std::thread::JoinHandle<()>,
}

impl Tail {
    /// Blocks up to `timeout` for the next record.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<String> {
        self.records.recv_timeout(timeout).ok()
    }
}

impl Iterator for Tail {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        self.records.recv().ok()
    }
}

struct FollowState {
    base: PathBuf,
    separator: Vec<u8>,
    offset: u64,
    partial: Vec<u8>,
}

fn follow_loop(
    mut state: FollowState,
    poll_interval: Duration,
    records: Sender<String>,
    stop: Receiver<()>,
) {
    // Filesystem events are forwarded into a channel; the select below falls
    // back to polling when no event arrives within the interval.
    let (event_tx, event_rx) = unbounded::<()>();
    let _watcher: Option<RecommendedWatcher> = watch_directory(&state.base, event_tx);

    loop {
        let scan = select! {
            recv(stop) -> _ => break,
            recv(event_rx) -> event => event.is_ok(),
            default(poll_interval) => true,
        };
        if scan && !scan_once(&mut state, &records) {
            break;
        }
    }
}

fn watch_directory(base: &Path, events: Sender<()>) -> Option<RecommendedWatcher> {
    let dir = base.parent().filter(|p| !p.as_os_str().is_empty())?;
    let mut watcher = RecommendedWatcher::new(
        move |event: notify::Result<notify::Event>| {
            if event.is_ok() {
                let _ = events.send(());
            }
        },
        notify::Config::default(),
    )
    .ok()?;
    watcher.watch(dir, RecursiveMode::NonRecursive).ok()?;
    Some(watcher)
}

/// One follow iteration. Returns `false` when every subscriber is gone.
fn scan_once(state: &mut FollowState, records: &Sender<String>) -> bool {
    let len = fs::metadata(&state.base).map(|m| m.len()).unwrap_or(0);

    if len < state.offset {
        // The file shrank: either truncation or rotation renamed it away.
        // If rotation moved our bytes into the newest rotated sibling, drain
        // the part we had not read yet before starting over.
        if let Some(remainder) = rotated_remainder(&state.base, state.offset) {
            state.partial.extend_from_slice(&remainder);
            for record in drain_partial(&mut state.partial, &state.separator) {
                if records.send(record).is_err() {
                    return false;
                }
            }
        }
        state.offset = 0;
        state.partial.clear();
    }

    if len > state.offset {
        if let Ok(chunk) = read_range(&state.base, state.offset, len) {
            state.offset = len;
            state.partial.extend_from_slice(&chunk);
            for record in drain_partial(&mut state.partial, &state.separator) {
                if records.send(record).is_err() {
                    return false;
                }
            }
        }
    }
    true
}

/// Bytes past `offset` in the most recently rotated sibling, if any.
fn rotated_remainder(base: &Path, offset: u64) -> Option<Vec<u8>> {
    let mut rotated = rotated_siblings(base);
    rotated.sort_by(|a, b| b.modified.cmp(&a.modified));
    let newest = rotated.first()?;

    let content = if newest.path.extension().is_some_and(|e| e == "gz") {
        let raw = fs::read(&newest.path).ok()?;
        let mut decoded = Vec::new();
        GzDecoder::new(raw.as_slice()).read_to_end(&mut decoded).ok()?;
        decoded
    } else {
        fs::read(&newest.path).ok()?
    };
    if (content.len() as u64) <= offset {
        return None;
    }
    Some(content[offset as usize..].to_vec())
}

fn read_range(path: &Path, from: u64, to: u64) -> std::io::Result<Vec<u8>> {
    use std::io::{Seek, SeekFrom};
    let mut file = File::open(path)?;
    file.seek(SeekFrom::Start(from))?;
    let mut chunk = vec![0u8; (to - from) as usize];
    let read = file.read(&mut chunk)?;
    chunk.truncate(read);
    Ok(chunk)
}

/// Pops every complete record off the front of `partial`, leaving the
/// unterminated remainder in place.
fn drain_partial(partial: &mut Vec<u8>, separator: &[u8]) -> Vec<String> {
    let mut out = Vec::new();
    loop {
        match find_subsequence(partial, separator) {
            Some(pos) => {
                let record: Vec<u8> = partial.drain(..pos + separator.len()).collect();
                out.push(String::from_utf8_lossy(&record[..pos]).into_owned());
            }
            None => return out,
        }
    }
}

/// Splits finished content on `separator`; a trailing unterminated chunk is
/// kept as a final record.
fn split_records(content: &[u8], separator: &[u8]) -> Vec<String> {
    let mut records = Vec::new();
    let mut rest = content;
    while let Some(pos) = find_subsequence(rest, separator) {
        records.push(String::from_utf8_lossy(&rest[..pos]).into_owned());
        rest = &rest[pos + separator.len()..];
    }
    if !rest.is_empty() {
        records.push(String::from_utf8_lossy(rest).into_owned());
    }
    records
}

fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}
