//! Pooled-event adapter over a four-level [`Handler`].
//!
//! # Event lifecycle
//!
//! 1. [`StructuredAdapter::new_event`] takes a [`StructuredEvent`] from the
//!    adapter's own pool, marks it live, and seeds it with the configured
//!    default attributes and group stack.
//! 2. The owning thread adds fields; they are kept in call order.
//! 3. [`StructuredAdapter::write`] builds a [`Record`] and hands it to the
//!    handler.
//! 4. [`StructuredAdapter::release_event`] clears the event (keeping the
//!    attribute buffer's capacity) and returns it to the pool.
//!
//! Groups cannot be opened on an event ([`Event::add_group`] returns
//! `false`), so the front-end flattens grouped keys as `group.key`. The
//! adapter-level group stack configured with [`StructuredBuilder::group`]
//! does nest.

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::engine::GeneralPurpose;
use base64::Engine;
use chrono::{DateTime, Utc};

use crate::adapter::Adapter;
use crate::config::AdapterConfig;
use crate::error::Error;
use crate::event::Event;
use crate::field::{insert_at, Attr, FieldValue};
use crate::handler::Handler;
use crate::level::Level;
use crate::logger::Logger;
use crate::pool::{EventPool, DEFAULT_RETAIN};
use crate::record::{HandlerLevel, Record};

/// Key used for errors added with [`Event::add_error`].
pub const ERROR_KEY: &str = "error";

/// Attribute rewrite hook, called with the group stack the attribute will be
/// nested under. Returning `None` drops the attribute.
pub type ReplaceAttr = Arc<dyn Fn(&[String], Attr) -> Option<Attr> + Send + Sync>;

/// Map a generic level onto the handler's four levels.
///
/// Trace and Debug share `Debug`; Notice and Warning share `Warn`; the four
/// most severe tiers share `Error`. Custom and disabled levels map to
/// `Debug`.
pub fn to_handler_level(level: Level) -> HandlerLevel {
    match level {
        Level::TRACE | Level::DEBUG => HandlerLevel::Debug,
        Level::INFORMATIONAL => HandlerLevel::Info,
        Level::NOTICE | Level::WARNING => HandlerLevel::Warn,
        Level::ERROR | Level::CRITICAL | Level::ALERT | Level::EMERGENCY => HandlerLevel::Error,
        _ => HandlerLevel::Debug,
    }
}

/// Lossy reverse of [`to_handler_level`], for diagnostics and tests only.
///
/// Emergency, Alert, Critical, Warning, Trace and custom levels are never
/// produced.
pub fn to_level(level: HandlerLevel) -> Level {
    match level {
        HandlerLevel::Debug => Level::DEBUG,
        HandlerLevel::Info => Level::INFORMATIONAL,
        HandlerLevel::Warn => Level::NOTICE,
        HandlerLevel::Error => Level::ERROR,
    }
}

/// Pooled event accumulating attributes for one log call.
///
/// Not thread-safe; owned by one thread between `new_event` and
/// `release_event`.
pub struct StructuredEvent {
    live: bool,
    level: Level,
    message: String,
    attrs: Vec<Attr>,
    // leading entries of `attrs` that came from the adapter defaults
    defaults: usize,
    groups: Vec<String>,
}

impl Default for StructuredEvent {
    fn default() -> Self {
        StructuredEvent {
            live: false,
            level: Level::DISABLED,
            message: String::new(),
            attrs: Vec::with_capacity(8),
            defaults: 0,
            groups: Vec::new(),
        }
    }
}

impl fmt::Debug for StructuredEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StructuredEvent")
            .field("live", &self.live)
            .field("level", &self.level)
            .field("message", &self.message)
            .field("attrs", &self.attrs)
            .field("groups", &self.groups)
            .finish()
    }
}

impl StructuredEvent {
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn attrs(&self) -> &[Attr] {
        &self.attrs
    }

    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    pub fn attrs_capacity(&self) -> usize {
        self.attrs.capacity()
    }

    fn reset(&mut self) {
        self.live = false;
        self.level = Level::DISABLED;
        self.message.clear();
        self.attrs.clear();
        self.defaults = 0;
        self.groups.clear();
    }

    fn push(&mut self, key: &str, value: FieldValue) -> bool {
        if !self.live {
            return false;
        }
        self.attrs.push(Attr {
            key: key.to_string(),
            value,
        });
        true
    }
}

impl Event for StructuredEvent {
    fn level(&self) -> Level {
        if self.live {
            self.level
        } else {
            Level::DISABLED
        }
    }

    fn add_field(&mut self, key: &str, value: FieldValue) {
        self.push(key, value);
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
        if !self.live {
            return false;
        }
        if let Some(err) = err {
            self.push(ERROR_KEY, FieldValue::error(err));
        }
        true
    }

    fn add_group(&mut self, _name: &str) -> bool {
        false
    }

    fn add_string(&mut self, key: &str, val: &str) -> bool {
        self.push(key, FieldValue::Str(val.to_string()))
    }

    fn add_int(&mut self, key: &str, val: i64) -> bool {
        self.push(key, FieldValue::Int(val))
    }

    fn add_uint(&mut self, key: &str, val: u64) -> bool {
        self.push(key, FieldValue::Uint(val))
    }

    fn add_float32(&mut self, key: &str, val: f32) -> bool {
        self.push(key, FieldValue::Float(val as f64))
    }

    fn add_float64(&mut self, key: &str, val: f64) -> bool {
        self.push(key, FieldValue::Float(val))
    }

    fn add_bool(&mut self, key: &str, val: bool) -> bool {
        self.push(key, FieldValue::Bool(val))
    }

    fn add_time(&mut self, key: &str, val: DateTime<Utc>) -> bool {
        self.push(key, FieldValue::Time(val))
    }

    fn add_duration(&mut self, key: &str, val: Duration) -> bool {
        self.push(key, FieldValue::Duration(val))
    }

    fn add_base64_bytes(&mut self, key: &str, val: &[u8], engine: Option<&GeneralPurpose>) -> bool {
        let encoded = engine.unwrap_or(&STANDARD).encode(val);
        self.push(key, FieldValue::Str(encoded))
    }

    /// Invalid JSON is kept as its raw text.
    fn add_raw_json(&mut self, key: &str, val: &str) -> bool {
        let value = match serde_json::from_str(val) {
            Ok(json) => FieldValue::Json(json),
            Err(_) => FieldValue::Str(val.to_string()),
        };
        self.push(key, value)
    }
}

/// Adapter owning the handler, the event pool and the configured defaults.
pub struct StructuredAdapter {
    handler: Arc<dyn Handler>,
    pool: EventPool<StructuredEvent>,
    attrs: Vec<Attr>,
    groups: Vec<String>,
    replace_attr: Option<ReplaceAttr>,
}

impl StructuredAdapter {
    pub fn new(handler: Arc<dyn Handler>) -> Self {
        StructuredAdapter {
            handler,
            pool: EventPool::new(),
            attrs: Vec::new(),
            groups: Vec::new(),
            replace_attr: None,
        }
    }

    pub fn handler(&self) -> &Arc<dyn Handler> {
        &self.handler
    }

    pub fn pool(&self) -> &EventPool<StructuredEvent> {
        &self.pool
    }

    fn replace(&self, groups: &[String], attr: Attr) -> Option<Attr> {
        match &self.replace_attr {
            Some(hook) => {
                let key = attr.key.clone();
                let replaced = hook(groups, attr);
                if replaced.is_none() {
                    tracing::trace!(%key, "attribute dropped by replace hook");
                }
                replaced
            }
            None => Some(attr),
        }
    }
}

impl Adapter for StructuredAdapter {
    type Event = StructuredEvent;

    fn new_event(&self, level: Level) -> Box<StructuredEvent> {
        let mut event = self.pool.get();
        event.reset();
        event.live = true;
        event.level = level;
        event.attrs.extend(self.attrs.iter().cloned());
        event.defaults = self.attrs.len();
        event.groups.extend(self.groups.iter().cloned());
        event
    }

    /// Finalize `event` into a [`Record`] and pass it to the handler.
    ///
    /// # Panics
    ///
    /// Writing an event at [`Level::EMERGENCY`] panics before the handler is
    /// consulted.
    fn write(&self, event: &mut StructuredEvent) -> Result<(), Error> {
        if !event.live {
            return Ok(());
        }
        if event.level == Level::EMERGENCY {
            panic!("emergency: {}", event.message);
        }

        let level = to_handler_level(event.level);
        if !self.handler.enabled(level) {
            return Err(Error::Disabled);
        }

        let mut record = Record::new(Utc::now(), level, event.message.as_str());
        let defaults = event.defaults;
        let groups = std::mem::take(&mut event.groups);
        let mut nested = Vec::with_capacity(event.attrs.len().saturating_sub(defaults));
        for (i, attr) in event.attrs.drain(..).enumerate() {
            if i < defaults {
                record.attrs.extend(self.replace(&[], attr));
            } else {
                nested.extend(self.replace(&groups, attr));
            }
        }
        insert_at(&mut record.attrs, &groups, nested);
        event.groups = groups;

        self.handler.handle(&record).map_err(Error::Backend)
    }

    fn release_event(&self, mut event: Box<StructuredEvent>) {
        event.reset();
        self.pool.put(event);
    }
}

/// Build a logger writing to `handler` at the default level.
pub fn with_handler(handler: Arc<dyn Handler>) -> Logger<StructuredAdapter> {
    Logger::new(StructuredAdapter::new(handler))
}

/// Option set for a [`StructuredAdapter`] logger.
pub struct StructuredBuilder {
    handler: Option<Arc<dyn Handler>>,
    level: Level,
    attrs: Vec<Attr>,
    groups: Vec<String>,
    replace_attr: Option<ReplaceAttr>,
    retain: usize,
}

impl Default for StructuredBuilder {
    fn default() -> Self {
        StructuredBuilder {
            handler: None,
            level: Level::INFORMATIONAL,
            attrs: Vec::new(),
            groups: Vec::new(),
            replace_attr: None,
            retain: DEFAULT_RETAIN,
        }
    }
}

impl StructuredBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed level, default fields and groups from configuration.
    pub fn from_config(config: &AdapterConfig) -> Self {
        let mut builder = Self::new().level(config.level);
        for (key, value) in &config.fields {
            builder = builder.attr(key.as_str(), value.clone());
        }
        for group in &config.groups {
            builder = builder.group(group);
        }
        builder
    }

    #[must_use]
    pub fn handler(mut self, handler: Arc<dyn Handler>) -> Self {
        self.handler = Some(handler);
        self
    }

    #[must_use]
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Attribute added to every event, outside any group.
    #[must_use]
    pub fn attr(mut self, key: &str, value: impl Into<FieldValue>) -> Self {
        self.attrs.push(Attr::new(key, value));
        self
    }

    #[must_use]
    pub fn attrs(mut self, attrs: impl IntoIterator<Item = Attr>) -> Self {
        self.attrs.extend(attrs);
        self
    }

    /// Nest event attributes under `name`. Empty names are ignored.
    #[must_use]
    pub fn group(mut self, name: &str) -> Self {
        if !name.is_empty() {
            self.groups.push(name.to_string());
        }
        self
    }

    #[must_use]
    pub fn replace_attr<F>(mut self, hook: F) -> Self
    where
        F: Fn(&[String], Attr) -> Option<Attr> + Send + Sync + 'static,
    {
        self.replace_attr = Some(Arc::new(hook));
        self
    }

    /// Maximum number of idle events kept for reuse.
    #[must_use]
    pub fn pool_retain(mut self, retain: usize) -> Self {
        self.retain = retain;
        self
    }

    pub fn build(self) -> Result<Logger<StructuredAdapter>, Error> {
        let handler = self.handler.ok_or(Error::MissingBackend("structured handler"))?;
        let adapter = StructuredAdapter {
            handler,
            pool: EventPool::with_retain(self.retain),
            attrs: self.attrs,
            groups: self.groups,
            replace_attr: self.replace_attr,
        };
        Ok(Logger::new(adapter).with_level(self.level))
    }
}
