//! Minimal fluent front-end driving an [`Adapter`].
//!
//! ```ignore
//! logger.info()
//!     .str("service", "api")
//!     .int("status", 200)
//!     .log("request completed")?;
//! ```

use std::borrow::Cow;
use std::error::Error as StdError;
use std::time::Duration;

use base64::engine::GeneralPurpose;
use chrono::{DateTime, Utc};

use crate::adapter::Adapter;
use crate::error::Error;
use crate::event::Event;
use crate::field::FieldValue;
use crate::level::Level;

/// Level-filtering logger over an adapter.
pub struct Logger<A: Adapter> {
    adapter: A,
    level: Level,
}

impl<A: Adapter> Logger<A> {
    /// Wrap `adapter`; the minimum level defaults to
    /// [`Level::INFORMATIONAL`].
    pub fn new(adapter: A) -> Self {
        Logger {
            adapter,
            level: Level::INFORMATIONAL,
        }
    }

    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    /// Whether events at `level` pass this logger's filter.
    pub fn accepts(&self, level: Level) -> bool {
        level.enabled() && self.level.enabled() && level <= self.level
    }

    /// Start an event. Filtered levels get a builder that holds no event, so
    /// nothing is taken from the pool.
    pub fn build(&self, level: Level) -> Builder<'_, A> {
        let event = if self.accepts(level) {
            Some(self.adapter.new_event(level))
        } else {
            None
        };
        Builder {
            logger: self,
            event,
            prefix: String::new(),
        }
    }

    pub fn emerg(&self) -> Builder<'_, A> {
        self.build(Level::EMERGENCY)
    }

    pub fn alert(&self) -> Builder<'_, A> {
        self.build(Level::ALERT)
    }

    pub fn crit(&self) -> Builder<'_, A> {
        self.build(Level::CRITICAL)
    }

    pub fn err(&self) -> Builder<'_, A> {
        self.build(Level::ERROR)
    }

    pub fn warning(&self) -> Builder<'_, A> {
        self.build(Level::WARNING)
    }

    pub fn notice(&self) -> Builder<'_, A> {
        self.build(Level::NOTICE)
    }

    pub fn info(&self) -> Builder<'_, A> {
        self.build(Level::INFORMATIONAL)
    }

    pub fn debug(&self) -> Builder<'_, A> {
        self.build(Level::DEBUG)
    }

    pub fn trace(&self) -> Builder<'_, A> {
        self.build(Level::TRACE)
    }
}

/// Accumulates fields for one event, then writes and releases it.
///
/// Dropping a builder without logging returns its event to the pool.
pub struct Builder<'a, A: Adapter> {
    logger: &'a Logger<A>,
    event: Option<Box<A::Event>>,
    // flattened group prefix, e.g. "http.request."
    prefix: String,
}

impl<'a, A: Adapter> Builder<'a, A> {
    pub fn enabled(&self) -> bool {
        self.event.is_some()
    }

    /// Direct access to the underlying event, if any.
    pub fn event_mut(&mut self) -> Option<&mut A::Event> {
        self.event.as_deref_mut()
    }

    fn apply(&mut self, key: &str, f: impl FnOnce(&mut A::Event, &str)) {
        if let Some(event) = self.event.as_deref_mut() {
            let key = prefixed(&self.prefix, key);
            f(event, &key);
        }
    }

    #[must_use]
    pub fn field(mut self, key: &str, val: impl Into<FieldValue>) -> Self {
        let val = val.into();
        self.apply(key, |e, k| e.add_field(k, val));
        self
    }

    #[must_use]
    pub fn str(mut self, key: &str, val: &str) -> Self {
        self.apply(key, |e, k| {
            if !e.add_string(k, val) {
                e.add_field(k, FieldValue::Str(val.to_string()));
            }
        });
        self
    }

    #[must_use]
    pub fn int(mut self, key: &str, val: i64) -> Self {
        self.apply(key, |e, k| {
            if !e.add_int(k, val) {
                e.add_field(k, FieldValue::Int(val));
            }
        });
        self
    }

    #[must_use]
    pub fn uint(mut self, key: &str, val: u64) -> Self {
        self.apply(key, |e, k| {
            if !e.add_uint(k, val) {
                e.add_field(k, FieldValue::Uint(val));
            }
        });
        self
    }

    #[must_use]
    pub fn float32(mut self, key: &str, val: f32) -> Self {
        self.apply(key, |e, k| {
            if !e.add_float32(k, val) {
                e.add_field(k, FieldValue::Float(val as f64));
            }
        });
        self
    }

    #[must_use]
    pub fn float64(mut self, key: &str, val: f64) -> Self {
        self.apply(key, |e, k| {
            if !e.add_float64(k, val) {
                e.add_field(k, FieldValue::Float(val));
            }
        });
        self
    }

    #[must_use]
    pub fn bool(mut self, key: &str, val: bool) -> Self {
        self.apply(key, |e, k| {
            if !e.add_bool(k, val) {
                e.add_field(k, FieldValue::Bool(val));
            }
        });
        self
    }

    #[must_use]
    pub fn time(mut self, key: &str, val: DateTime<Utc>) -> Self {
        self.apply(key, |e, k| {
            if !e.add_time(k, val) {
                e.add_field(k, FieldValue::Time(val));
            }
        });
        self
    }

    #[must_use]
    pub fn dur(mut self, key: &str, val: Duration) -> Self {
        self.apply(key, |e, k| {
            if !e.add_duration(k, val) {
                e.add_field(k, FieldValue::Duration(val));
            }
        });
        self
    }

    #[must_use]
    pub fn base64(mut self, key: &str, val: &[u8], engine: Option<&GeneralPurpose>) -> Self {
        self.apply(key, |e, k| {
            if !e.add_base64_bytes(k, val, engine) {
                e.add_field(k, FieldValue::Bytes(val.to_vec()));
            }
        });
        self
    }

    #[must_use]
    pub fn raw_json(mut self, key: &str, val: &str) -> Self {
        self.apply(key, |e, k| {
            if !e.add_raw_json(k, val) {
                let value = serde_json::from_str(val)
                    .map(FieldValue::Json)
                    .unwrap_or_else(|_| FieldValue::Str(val.to_string()));
                e.add_field(k, value);
            }
        });
        self
    }

    #[must_use]
    pub fn err(self, err: &(dyn StdError + '_)) -> Self {
        self.maybe_err(Some(err))
    }

    /// `None` adds nothing.
    #[must_use]
    pub fn maybe_err(mut self, err: Option<&(dyn StdError + '_)>) -> Self {
        if let Some(event) = self.event.as_deref_mut() {
            if !event.add_error(err) {
                if let Some(err) = err {
                    event.add_field("error", FieldValue::error(err));
                }
            }
        }
        self
    }

    /// Open a namespace. When the event cannot nest, subsequent keys are
    /// flattened to `name.key`.
    #[must_use]
    pub fn group(mut self, name: &str) -> Self {
        if let Some(event) = self.event.as_deref_mut() {
            if !event.add_group(name) {
                self.prefix.push_str(name);
                self.prefix.push('.');
            }
        }
        self
    }

    /// Set the message, write the event and release it.
    ///
    /// [`Error::Disabled`] from the adapter is routine filtering and is
    /// reported as success.
    pub fn log(mut self, msg: &str) -> Result<(), Error> {
        match self.event.take() {
            Some(mut event) => {
                event.add_message(msg);
                self.finish(event)
            }
            None => Ok(()),
        }
    }

    /// Write without setting a message.
    pub fn send(mut self) -> Result<(), Error> {
        match self.event.take() {
            Some(event) => self.finish(event),
            None => Ok(()),
        }
    }

    fn finish(&self, mut event: Box<A::Event>) -> Result<(), Error> {
        let adapter = &self.logger.adapter;
        let result = adapter.write(&mut event);
        adapter.release_event(event);
        match result {
            Err(Error::Disabled) => Ok(()),
            other => other,
        }
    }
}

impl<A: Adapter> Drop for Builder<'_, A> {
    fn drop(&mut self) {
        if let Some(event) = self.event.take() {
            self.logger.adapter.release_event(event);
        }
    }
}

fn prefixed<'k>(prefix: &str, key: &'k str) -> Cow<'k, str> {
    if prefix.is_empty() {
        Cow::Borrowed(key)
    } else {
        Cow::Owned(format!("{}{}", prefix, key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Captured {
        level: Level,
        message: String,
        fields: Vec<(String, FieldValue)>,
    }

    impl Event for Captured {
        fn level(&self) -> Level {
            self.level
        }

        fn add_field(&mut self, key: &str, value: FieldValue) {
            self.fields.push((key.to_string(), value));
        }

        fn add_message(&mut self, msg: &str) -> bool {
            self.message = msg.to_string();
            true
        }
    }

    #[derive(Default)]
    struct Recorder {
        created: AtomicUsize,
        released: AtomicUsize,
        written: Mutex<Vec<(Level, String, Vec<(String, FieldValue)>)>>,
        disabled: bool,
    }

    impl Adapter for Recorder {
        type Event = Captured;

        fn new_event(&self, level: Level) -> Box<Captured> {
            self.created.fetch_add(1, Ordering::SeqCst);
            Box::new(Captured {
                level,
                ..Captured::default()
            })
        }

        fn write(&self, event: &mut Captured) -> Result<(), Error> {
            if self.disabled {
                return Err(Error::Disabled);
            }
            self.written.lock().push((
                event.level,
                event.message.clone(),
                std::mem::take(&mut event.fields),
            ));
            Ok(())
        }

        fn release_event(&self, _event: Box<Captured>) {
            self.released.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn filtered_levels_never_touch_the_adapter() -> Result<(), Error> {
        let logger = Logger::new(Recorder::default());
        logger.debug().str("k", "v").log("hidden")?;
        logger.trace().log("hidden")?;
        logger.build(Level::DISABLED).log("hidden")?;
        assert_eq!(logger.adapter().created.load(Ordering::SeqCst), 0);
        assert!(logger.adapter().written.lock().is_empty());
        Ok(())
    }

    #[test]
    fn typed_adders_fall_back_to_add_field() -> Result<(), Error> {
        let logger = Logger::new(Recorder::default()).with_level(Level::DEBUG);
        logger
            .debug()
            .str("s", "x")
            .int("i", -2)
            .uint("u", 9)
            .bool("b", true)
            .log("hello")?;

        let written = logger.adapter().written.lock();
        let (level, message, fields) = &written[0];
        assert_eq!(*level, Level::DEBUG);
        assert_eq!(message, "hello");
        let keys: Vec<&str> = fields.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["s", "i", "u", "b"]);
        assert_eq!(fields[1].1, FieldValue::Int(-2));
        Ok(())
    }

    #[test]
    fn groups_flatten_when_unsupported() -> Result<(), Error> {
        let logger = Logger::new(Recorder::default());
        logger
            .info()
            .str("top", "1")
            .group("http")
            .group("request")
            .str("method", "GET")
            .log("")?;

        let written = logger.adapter().written.lock();
        let keys: Vec<&str> = written[0].2.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["top", "http.request.method"]);
        Ok(())
    }

    #[test]
    fn error_fallback_and_none() -> Result<(), Error> {
        let logger = Logger::new(Recorder::default());
        let io = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        logger.err().maybe_err(None).err(&io).log("failed")?;

        let written = logger.adapter().written.lock();
        assert_eq!(
            written[0].2,
            vec![("error".to_string(), FieldValue::Error("boom".to_string()))]
        );
        Ok(())
    }

    #[test]
    fn disabled_write_is_not_an_error_and_still_releases() -> Result<(), Error> {
        let logger = Logger::new(Recorder {
            disabled: true,
            ..Recorder::default()
        });
        logger.info().log("dropped")?;
        assert_eq!(logger.adapter().released.load(Ordering::SeqCst), 1);
        Ok(())
    }

    #[test]
    fn dropping_unlogged_builder_releases() {
        let logger = Logger::new(Recorder::default());
        {
            let _builder = logger.info().str("k", "v");
        }
        assert_eq!(logger.adapter().created.load(Ordering::SeqCst), 1);
        assert_eq!(logger.adapter().released.load(Ordering::SeqCst), 1);
        assert!(logger.adapter().written.lock().is_empty());
    }
}
