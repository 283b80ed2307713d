// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Deduplication of the library's own warnings and errors.
//!
//! Each distinct `(level, message, stack_trace)` is stored once until the next drain.
//! The store is bounded: once full, new entries are only counted, and the count is
//! reported as a single ERROR entry on the next drain.
//!
//! Stacks are reduced to the frames of library code. When the innermost frame is not
//! library code the message may contain caller data, so it is replaced by
//! [`OMITTED_MESSAGE`].

use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Mutex;

use dd_trace::utils::lock_unpoisoned;
use dd_trace::{catch_panic, Config};

use crate::payload::{LogEntry, LogLevel};

pub const DEFAULT_MAX_ENTRIES: usize = 10_000;

pub const OMITTED_MESSAGE: &str = "omitted";

/// Substring identifying stack frames of library code
pub const DEFAULT_LIBRARY_MARKER: &str = "dd-trace";

/// Polynomial rolling hash with multiplier 31, seeded with 1
struct Polynomial31Hasher(u64);

impl Default for Polynomial31Hasher {
    fn default() -> Self {
        Polynomial31Hasher(1)
    }
}

impl Hasher for Polynomial31Hasher {
    fn write(&mut self, bytes: &[u8]) {
        for byte in bytes {
            self.0 = self.0.wrapping_mul(31).wrapping_add(u64::from(*byte));
        }
    }

    fn finish(&self) -> u64 {
        self.0
    }
}

/// Fields identifying an entry. Each field is hashed separately so that
/// `("ab", "c")` and `("a", "bc")` differ.
#[derive(Hash, PartialEq, Eq)]
struct LogKey<'a> {
    level: LogLevel,
    message: &'a str,
    stack_trace: Option<&'a str>,
    tags: Option<&'a str>,
}

impl<'a> LogKey<'a> {
    fn new(entry: &'a LogEntry, hash_tags: bool) -> Self {
        LogKey {
            level: entry.level,
            message: &entry.message,
            stack_trace: entry.stack_trace.as_deref(),
            tags: entry.tags.as_deref().filter(|_| hash_tags),
        }
    }

    fn hash_code(&self) -> u64 {
        let mut hasher = Polynomial31Hasher::default();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

#[derive(Debug)]
struct DeduplicatorState {
    entries: Vec<LogEntry>,
    /// hash -> indices in `entries`, colliding entries share a bucket
    index: HashMap<u64, Vec<usize>>,
    max_entries: usize,
    overflowed_count: u64,
    hash_tags: bool,
}

impl DeduplicatorState {
    fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
        self.overflowed_count = 0;
    }
}

/// Bounded store of unique log entries
#[derive(Debug)]
pub struct LogDeduplicator {
    state: Mutex<DeduplicatorState>,
    library_marker: String,
}

impl Default for LogDeduplicator {
    fn default() -> Self {
        LogDeduplicator::new(DEFAULT_MAX_ENTRIES)
    }
}

impl LogDeduplicator {
    pub fn new(max_entries: usize) -> Self {
        LogDeduplicator {
            state: Mutex::new(DeduplicatorState {
                entries: Vec::new(),
                index: HashMap::new(),
                max_entries,
                overflowed_count: 0,
                hash_tags: false,
            }),
            library_marker: DEFAULT_LIBRARY_MARKER.to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let deduplicator = LogDeduplicator::new(config.telemetry_log_max_entries());
        deduplicator.configure(config);
        deduplicator
    }

    /// Frames containing `marker` are considered library code
    pub fn with_library_marker(mut self, marker: impl Into<String>) -> Self {
        self.library_marker = marker.into();
        self
    }

    /// Applies the capacity and the tag hashing knob. Stored entries are kept.
    pub fn configure(&self, config: &Config) {
        let mut state = lock_unpoisoned(&self.state);
        state.max_entries = config.telemetry_log_max_entries();
        state.hash_tags = config.telemetry_log_hash_tags();
    }

    pub fn set_hash_tags(&self, hash_tags: bool) {
        lock_unpoisoned(&self.state).hash_tags = hash_tags;
    }

    /// Returns true if the entry was stored, false for duplicates, empty messages
    /// and entries rejected because the store is full.
    pub fn add(
        &self,
        message: &str,
        level: LogLevel,
        stack: Option<&str>,
        tags: Option<&str>,
    ) -> bool {
        catch_panic!(self.add_entry(message, level, stack, tags), false)
    }

    fn add_entry(
        &self,
        message: &str,
        level: LogLevel,
        stack: Option<&str>,
        tags: Option<&str>,
    ) -> bool {
        if message.is_empty() {
            return false;
        }

        let mut state = lock_unpoisoned(&self.state);
        if state.entries.len() >= state.max_entries {
            state.overflowed_count += 1;
            return false;
        }

        let mut entry = LogEntry {
            message: message.to_string(),
            level,
            stack_trace: None,
            tags: tags.map(str::to_string),
        };
        if let Some(stack) = stack.filter(|stack| !stack.is_empty()) {
            self.sanitize(&mut entry, stack);
        }

        let key = LogKey::new(&entry, state.hash_tags);
        let hash = key.hash_code();
        let state = &mut *state;
        let bucket = state.index.entry(hash).or_default();
        if bucket
            .iter()
            .any(|&idx| LogKey::new(&state.entries[idx], state.hash_tags) == key)
        {
            return false;
        }
        bucket.push(state.entries.len());
        state.entries.push(entry);
        true
    }

    /// Keeps the frames of library code. The first line holds the error message and
    /// is kept only when the innermost frame is library code, otherwise the message
    /// of the entry is redacted.
    fn sanitize(&self, entry: &mut LogEntry, stack: &str) {
        let marker = self.library_marker.as_str();
        let lines: Vec<&str> = stack.lines().collect();
        let is_library_code = lines.get(1).is_some_and(|frame| frame.contains(marker));

        let kept: Vec<&str> = lines
            .iter()
            .enumerate()
            .filter(|(idx, line)| (is_library_code && *idx == 0) || line.contains(marker))
            .map(|(_, line)| *line)
            .collect();
        entry.stack_trace = Some(kept.join("\n"));

        if !is_library_code {
            entry.message = OMITTED_MESSAGE.to_string();
        }
    }

    /// Returns every stored entry, followed by an overflow summary if entries were
    /// rejected, and empties the store. Returns `None` when no entry is stored, in
    /// which case the overflow count is kept for a later drain.
    pub fn drain(&self) -> Option<Vec<LogEntry>> {
        catch_panic!(self.drain_entries(), None)
    }

    fn drain_entries(&self) -> Option<Vec<LogEntry>> {
        let mut state = lock_unpoisoned(&self.state);
        if state.entries.is_empty() {
            return None;
        }

        let mut drained = std::mem::take(&mut state.entries);
        if state.overflowed_count > 0 {
            drained.push(LogEntry {
                message: format!(
                    "Omitted {} entries due to overflowing",
                    state.overflowed_count
                ),
                level: LogLevel::Error,
                stack_trace: None,
                tags: None,
            });
        }
        state.clear();
        Some(drained)
    }

    /// Empties the store and the overflow counter, and optionally changes the capacity
    pub fn reset(&self, max_entries: Option<usize>) {
        let mut state = lock_unpoisoned(&self.state);
        state.clear();
        if let Some(max_entries) = max_entries {
            state.max_entries = max_entries;
        }
    }

    pub fn len(&self) -> usize {
        lock_unpoisoned(&self.state).entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn overflowed_count(&self) -> u64 {
        lock_unpoisoned(&self.state).overflowed_count
    }

    pub fn max_entries(&self) -> usize {
        lock_unpoisoned(&self.state).max_entries
    }
}
