//! Pooled-event adapter over a [`CompactLogger`].
//!
//! Fields are encoded straight into the pooled entry's buffer, so a reused
//! event allocates nothing for scalar fields. Groups are flattened by the
//! front-end; configured groups become a key prefix.

use std::error::Error as StdError;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::engine::GeneralPurpose;
use base64::Engine;
use chrono::{DateTime, Utc};

use crate::adapter::Adapter;
use crate::compact::{CompactEntry, CompactLevel, CompactLogger};
use crate::config::AdapterConfig;
use crate::error::Error;
use crate::event::Event;
use crate::field::FieldValue;
use crate::level::Level;
use crate::logger::Logger;
use crate::pool::{EventPool, DEFAULT_RETAIN};

/// Map a generic level onto the compact logger's levels.
///
/// Alert maps to [`CompactLevel::Fatal`] and Emergency to
/// [`CompactLevel::Panic`]; see [`CompactAdapter::write`]. Custom levels are
/// written as trace.
pub fn to_compact_level(level: Level) -> CompactLevel {
    match level {
        Level::TRACE => CompactLevel::Trace,
        Level::DEBUG => CompactLevel::Debug,
        Level::INFORMATIONAL => CompactLevel::Info,
        Level::NOTICE | Level::WARNING => CompactLevel::Warn,
        Level::ERROR | Level::CRITICAL => CompactLevel::Error,
        Level::ALERT => CompactLevel::Fatal,
        Level::EMERGENCY => CompactLevel::Panic,
        l if l.is_custom() => CompactLevel::Trace,
        _ => CompactLevel::Disabled,
    }
}

/// Lossy reverse of [`to_compact_level`]. Notice, Critical and custom levels
/// are never produced.
pub fn to_level(level: CompactLevel) -> Level {
    match level {
        CompactLevel::Trace => Level::TRACE,
        CompactLevel::Debug => Level::DEBUG,
        CompactLevel::Info => Level::INFORMATIONAL,
        CompactLevel::Warn => Level::WARNING,
        CompactLevel::Error => Level::ERROR,
        CompactLevel::Fatal => Level::ALERT,
        CompactLevel::Panic => Level::EMERGENCY,
        CompactLevel::Disabled => Level::DISABLED,
    }
}

#[derive(Debug, Default)]
pub struct CompactEvent {
    live: bool,
    // false when the backend filters this level; adders then skip encoding
    sink: bool,
    level: Level,
    message: String,
    entry: CompactEntry,
}

impl CompactEvent {
    pub fn entry(&self) -> &CompactEntry {
        &self.entry
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    fn reset(&mut self) {
        self.live = false;
        self.sink = false;
        self.level = Level::DISABLED;
        self.message.clear();
        self.entry.clear();
    }

    fn with_entry(&mut self, f: impl FnOnce(&mut CompactEntry)) -> bool {
        if !self.live {
            return false;
        }
        if self.sink {
            f(&mut self.entry);
        }
        true
    }
}

impl Event for CompactEvent {
    fn level(&self) -> Level {
        if self.live {
            self.level
        } else {
            Level::DISABLED
        }
    }

    fn add_field(&mut self, key: &str, value: FieldValue) {
        self.with_entry(|e| {
            e.value(key, &value);
        });
    }

    fn add_message(&mut self, msg: &str) -> bool {
        if !self.live {
            return false;
        }
        self.message.clear();
        self.message.push_str(msg);
        true
    }

    fn add_error(&mut self, err: Option<&(dyn StdError + '_)>) -> bool {
        match err {
            Some(err) => self.with_entry(|e| {
                e.err(&err.to_string());
            }),
            None => self.live,
        }
    }

    fn add_group(&mut self, _name: &str) -> bool {
        false
    }

    fn add_string(&mut self, key: &str, val: &str) -> bool {
        self.with_entry(|e| {
            e.str(key, val);
        })
    }

    fn add_int(&mut self, key: &str, val: i64) -> bool {
        self.with_entry(|e| {
            e.int(key, val);
        })
    }

    fn add_uint(&mut self, key: &str, val: u64) -> bool {
        self.with_entry(|e| {
            e.uint(key, val);
        })
    }

    fn add_float32(&mut self, key: &str, val: f32) -> bool {
        self.with_entry(|e| {
            e.float(key, val as f64);
        })
    }

    fn add_float64(&mut self, key: &str, val: f64) -> bool {
        self.with_entry(|e| {
            e.float(key, val);
        })
    }

    fn add_bool(&mut self, key: &str, val: bool) -> bool {
        self.with_entry(|e| {
            e.bool(key, val);
        })
    }

    fn add_time(&mut self, key: &str, val: DateTime<Utc>) -> bool {
        self.with_entry(|e| {
            e.time(key, val);
        })
    }

    fn add_duration(&mut self, key: &str, val: Duration) -> bool {
        self.with_entry(|e| {
            e.dur(key, val);
        })
    }

    fn add_base64_bytes(&mut self, key: &str, val: &[u8], engine: Option<&GeneralPurpose>) -> bool {
        self.with_entry(|e| {
            let encoded = engine.unwrap_or(&STANDARD).encode(val);
            e.str(key, &encoded);
        })
    }

    fn add_raw_json(&mut self, key: &str, val: &str) -> bool {
        self.with_entry(|e| {
            e.raw_json(key, val);
        })
    }
}

pub struct CompactAdapter {
    logger: CompactLogger,
    pool: EventPool<CompactEvent>,
    prefix: String,
}

impl CompactAdapter {
    pub fn new(logger: CompactLogger) -> Self {
        CompactAdapter {
            logger,
            pool: EventPool::new(),
            prefix: String::new(),
        }
    }

    pub fn logger(&self) -> &CompactLogger {
        &self.logger
    }

    pub fn pool(&self) -> &EventPool<CompactEvent> {
        &self.pool
    }
}

impl Adapter for CompactAdapter {
    type Event = CompactEvent;

    fn new_event(&self, level: Level) -> Box<CompactEvent> {
        let mut event = self.pool.get();
        let compact = to_compact_level(level);
        event.live = true;
        event.level = level;
        event.message.clear();
        event.sink = self.logger.enabled(compact);
        if event.sink {
            self.logger.begin(&mut event.entry, compact);
            event.entry.set_prefix(&self.prefix);
        }
        event
    }

    /// Write the entry through the compact logger.
    ///
    /// # Panics
    ///
    /// [`Level::EMERGENCY`] panics after the line is written. [`Level::ALERT`]
    /// calls the logger's exit function with `1` after writing, which by
    /// default terminates the process. Both still happen when the logger
    /// filters the level; nothing is written then.
    fn write(&self, event: &mut CompactEvent) -> Result<(), Error> {
        if !event.live {
            return Ok(());
        }
        if !event.sink {
            self.logger.abort(to_compact_level(event.level), &event.message);
            return Err(Error::Disabled);
        }
        self.logger
            .emit(&mut event.entry, &event.message)
            .map_err(Error::backend)
    }

    fn release_event(&self, mut event: Box<CompactEvent>) {
        event.reset();
        self.pool.put(event);
    }
}

/// Build a logger over `logger` at the default level.
pub fn with_compact(logger: CompactLogger) -> Logger<CompactAdapter> {
    Logger::new(CompactAdapter::new(logger))
}

pub struct CompactBuilder {
    logger: Option<CompactLogger>,
    level: Level,
    fields: Vec<(String, FieldValue)>,
    groups: Vec<String>,
    retain: usize,
}

impl Default for CompactBuilder {
    fn default() -> Self {
        CompactBuilder {
            logger: None,
            level: Level::INFORMATIONAL,
            fields: Vec::new(),
            groups: Vec::new(),
            retain: DEFAULT_RETAIN,
        }
    }
}

impl CompactBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Level, default fields (as logger context) and groups (as key prefix)
    /// from configuration.
    pub fn from_config(config: &AdapterConfig) -> Self {
        let mut builder = Self::new().level(config.level);
        for (key, value) in &config.fields {
            builder = builder.field(key, value.clone());
        }
        for group in &config.groups {
            builder = builder.group(group);
        }
        builder
    }

    #[must_use]
    pub fn logger(mut self, logger: CompactLogger) -> Self {
        self.logger = Some(logger);
        self
    }

    #[must_use]
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    #[must_use]
    pub fn field(mut self, key: &str, value: impl Into<FieldValue>) -> Self {
        self.fields.push((key.to_string(), value.into()));
        self
    }

    #[must_use]
    pub fn group(mut self, name: &str) -> Self {
        if !name.is_empty() {
            self.groups.push(name.to_string());
        }
        self
    }

    #[must_use]
    pub fn pool_retain(mut self, retain: usize) -> Self {
        self.retain = retain;
        self
    }

    pub fn build(self) -> Result<Logger<CompactAdapter>, Error> {
        let mut logger = self.logger.ok_or(Error::MissingBackend("compact logger"))?;
        for (key, value) in self.fields {
            logger = logger.with_field(&key, value);
        }
        let prefix: String = self.groups.iter().map(|g| format!("{}.", g)).collect();
        let adapter = CompactAdapter {
            logger,
            pool: EventPool::with_retain(self.retain),
            prefix,
        };
        Ok(Logger::new(adapter).with_level(self.level))
    }
}
