//! Compact JSON-lines logger writing pre-encoded fragments into reusable
//! byte buffers.
//!
//! A [`CompactEntry`] is started with [`CompactLogger::begin`], filled with
//! typed setters that append `,"key":value` directly to its buffer, and
//! finished with [`CompactLogger::emit`], which appends the message and hands
//! the whole line to the writer in one call. Entries keep their buffer
//! between uses.

use std::fmt;
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;
use serde::de::IgnoredAny;
use serde::Serialize;

use crate::field::FieldValue;

/// Severity understood by [`CompactLogger`], least severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CompactLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    /// Written, then the logger's exit function is called with `1`.
    Fatal,
    /// Written, then the calling thread panics with the message.
    Panic,
    Disabled,
}

impl CompactLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            CompactLevel::Trace => "trace",
            CompactLevel::Debug => "debug",
            CompactLevel::Info => "info",
            CompactLevel::Warn => "warn",
            CompactLevel::Error => "error",
            CompactLevel::Fatal => "fatal",
            CompactLevel::Panic => "panic",
            CompactLevel::Disabled => "disabled",
        }
    }
}

impl fmt::Display for CompactLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Called with the exit code after a [`CompactLevel::Fatal`] line.
pub type ExitFn = Arc<dyn Fn(i32) + Send + Sync>;

fn put_json<T: Serialize + ?Sized>(buf: &mut Vec<u8>, value: &T) {
    if serde_json::to_writer(&mut *buf, value).is_err() {
        buf.extend_from_slice(b"null");
    }
}

/// Reusable per-line buffer.
#[derive(Debug, Clone)]
pub struct CompactEntry {
    buf: Vec<u8>,
    level: CompactLevel,
    prefix: String,
}

impl Default for CompactEntry {
    fn default() -> Self {
        CompactEntry {
            buf: Vec::with_capacity(256),
            level: CompactLevel::Disabled,
            prefix: String::new(),
        }
    }
}

impl CompactEntry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(&self) -> CompactLevel {
        self.level
    }

    /// Encoded bytes so far, without the closing brace.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    /// Prefix prepended to every key written afterwards, e.g. `req.`.
    pub fn set_prefix(&mut self, prefix: &str) {
        self.prefix.clear();
        self.prefix.push_str(prefix);
    }

    pub fn clear(&mut self) {
        self.buf.clear();
        self.prefix.clear();
        self.level = CompactLevel::Disabled;
    }

    fn key(&mut self, key: &str) {
        self.buf.push(b',');
        if self.prefix.is_empty() {
            put_json(&mut self.buf, key);
        } else {
            let full = format!("{}{}", self.prefix, key);
            put_json(&mut self.buf, full.as_str());
        }
        self.buf.push(b':');
    }

    pub fn str(&mut self, key: &str, val: &str) -> &mut Self {
        self.key(key);
        put_json(&mut self.buf, val);
        self
    }

    pub fn int(&mut self, key: &str, val: i64) -> &mut Self {
        self.key(key);
        put_json(&mut self.buf, &val);
        self
    }

    pub fn uint(&mut self, key: &str, val: u64) -> &mut Self {
        self.key(key);
        put_json(&mut self.buf, &val);
        self
    }

    /// Non-finite values are written as `null`.
    pub fn float(&mut self, key: &str, val: f64) -> &mut Self {
        self.key(key);
        put_json(&mut self.buf, &val);
        self
    }

    pub fn bool(&mut self, key: &str, val: bool) -> &mut Self {
        self.key(key);
        self.buf
            .extend_from_slice(if val { b"true" } else { b"false" });
        self
    }

    /// RFC 3339, whole seconds.
    pub fn time(&mut self, key: &str, val: DateTime<Utc>) -> &mut Self {
        let formatted = val.to_rfc3339_opts(SecondsFormat::Secs, true);
        self.str(key, &formatted)
    }

    /// Fractional milliseconds.
    pub fn dur(&mut self, key: &str, val: Duration) -> &mut Self {
        self.float(key, val.as_secs_f64() * 1000.0)
    }

    /// Embed `val` verbatim when it is valid JSON, otherwise as a string.
    pub fn raw_json(&mut self, key: &str, val: &str) -> &mut Self {
        if serde_json::from_str::<IgnoredAny>(val).is_ok() {
            self.key(key);
            self.buf.extend_from_slice(val.trim().as_bytes());
            self
        } else {
            self.str(key, val)
        }
    }

    pub fn err(&mut self, msg: &str) -> &mut Self {
        self.str("error", msg)
    }

    pub fn value(&mut self, key: &str, val: &FieldValue) -> &mut Self {
        match val {
            FieldValue::Str(s) => self.str(key, s),
            FieldValue::Int(i) => self.int(key, *i),
            FieldValue::Uint(u) => self.uint(key, *u),
            FieldValue::Float(f) => self.float(key, *f),
            FieldValue::Bool(b) => self.bool(key, *b),
            FieldValue::Time(t) => self.time(key, *t),
            FieldValue::Duration(d) => self.dur(key, *d),
            other => {
                self.key(key);
                put_json(&mut self.buf, &other.to_json());
                self
            }
        }
    }
}

/// Shared-writer JSON-lines logger.
///
/// Cloning is cheap; clones write to the same destination.
#[derive(Clone)]
pub struct CompactLogger {
    writer: Arc<Mutex<Box<dyn Write + Send>>>,
    level: CompactLevel,
    context: Vec<u8>,
    timestamp: bool,
    exit: ExitFn,
}

impl fmt::Debug for CompactLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompactLogger")
            .field("level", &self.level)
            .field("context", &String::from_utf8_lossy(&self.context))
            .field("timestamp", &self.timestamp)
            .finish_non_exhaustive()
    }
}

impl CompactLogger {
    /// Logger accepting every level, without timestamps, exiting the
    /// process on fatal.
    pub fn new<W>(writer: W) -> Self
    where
        W: Write + Send + 'static,
    {
        CompactLogger {
            writer: Arc::new(Mutex::new(Box::new(writer))),
            level: CompactLevel::Trace,
            context: Vec::new(),
            timestamp: false,
            exit: Arc::new(|code| std::process::exit(code)),
        }
    }

    #[must_use]
    pub fn with_level(mut self, level: CompactLevel) -> Self {
        self.level = level;
        self
    }

    /// Add a field written on every line, after the level and time.
    #[must_use]
    pub fn with_field(mut self, key: &str, val: impl Into<FieldValue>) -> Self {
        let mut scratch = CompactEntry {
            buf: std::mem::take(&mut self.context),
            level: CompactLevel::Disabled,
            prefix: String::new(),
        };
        scratch.value(key, &val.into());
        self.context = scratch.buf;
        self
    }

    #[must_use]
    pub fn with_timestamp(mut self) -> Self {
        self.timestamp = true;
        self
    }

    #[must_use]
    pub fn with_exit<F>(mut self, exit: F) -> Self
    where
        F: Fn(i32) + Send + Sync + 'static,
    {
        self.exit = Arc::new(exit);
        self
    }

    pub fn level(&self) -> CompactLevel {
        self.level
    }

    pub fn enabled(&self, level: CompactLevel) -> bool {
        level != CompactLevel::Disabled && self.level != CompactLevel::Disabled && level >= self.level
    }

    /// Reset `entry` and write the line header: level, time and context.
    pub fn begin(&self, entry: &mut CompactEntry, level: CompactLevel) {
        entry.clear();
        entry.level = level;
        entry.buf.extend_from_slice(b"{\"level\":");
        put_json(&mut entry.buf, level.as_str());
        if self.timestamp {
            entry.buf.extend_from_slice(b",\"time\":");
            let now = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
            put_json(&mut entry.buf, now.as_str());
        }
        entry.buf.extend_from_slice(&self.context);
    }

    /// Finish `entry` with `msg` (omitted when empty) and write the line.
    ///
    /// # Panics
    ///
    /// Panics with `msg` after writing a [`CompactLevel::Panic`] entry. A
    /// [`CompactLevel::Fatal`] entry calls the exit function with `1` after
    /// writing.
    pub fn emit(&self, entry: &mut CompactEntry, msg: &str) -> io::Result<()> {
        if !msg.is_empty() {
            entry.buf.extend_from_slice(b",\"message\":");
            put_json(&mut entry.buf, msg);
        }
        entry.buf.extend_from_slice(b"}\n");

        let result = {
            let mut writer = self.writer.lock();
            writer.write_all(&entry.buf).and_then(|_| writer.flush())
        };

        self.abort(entry.level, msg);
        result
    }

    /// Run the post-write action of the two abort tiers: [`CompactLevel::Fatal`]
    /// calls the exit function with `1`, [`CompactLevel::Panic`] panics with
    /// `msg`. Other levels return normally.
    pub fn abort(&self, level: CompactLevel, msg: &str) {
        match level {
            CompactLevel::Fatal => (self.exit)(1),
            CompactLevel::Panic => panic!("{}", msg),
            _ => {}
        }
    }
}
