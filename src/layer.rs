use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::field::{Field, Visit};
use tracing::{Event, Level as TracingLevel, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

use crate::adapter::Adapter;
use crate::level::Level;
use crate::logger::{Builder, Logger};

const OWN_TARGET: &str = "logbridge";

/// Map a `tracing` level onto the generic level.
pub fn from_tracing(level: &TracingLevel) -> Level {
    match *level {
        TracingLevel::ERROR => Level::ERROR,
        TracingLevel::WARN => Level::WARNING,
        TracingLevel::INFO => Level::INFORMATIONAL,
        TracingLevel::DEBUG => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// `tracing_subscriber` layer forwarding every event to a [`Logger`].
///
/// The `message` field becomes the event message; all other fields are
/// added in the order `tracing` records them, followed by `target`. Events
/// below the logger's level never reach the adapter, and events emitted by
/// this crate itself (target `logbridge...`) are ignored.
pub struct BridgeLayer<A: Adapter> {
    logger: Arc<Logger<A>>,
    /// Total events seen by the layer, before level filtering.
    pub total_events: Arc<AtomicU64>,
    /// Events the adapter wrote (or filtered as disabled).
    pub written_events: Arc<AtomicU64>,
    /// Events the adapter failed to write.
    pub failed_events: Arc<AtomicU64>,
}

impl<A: Adapter> BridgeLayer<A> {
    pub fn new(logger: Arc<Logger<A>>) -> Self {
        BridgeLayer {
            logger,
            total_events: Arc::new(AtomicU64::new(0)),
            written_events: Arc::new(AtomicU64::new(0)),
            failed_events: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn logger(&self) -> &Arc<Logger<A>> {
        &self.logger
    }
}

impl<S, A> Layer<S> for BridgeLayer<A>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
    A: Adapter + 'static,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        if meta.target().starts_with(OWN_TARGET) {
            return;
        }
        self.total_events.fetch_add(1, Ordering::Relaxed);

        let builder = self.logger.build(from_tracing(meta.level()));
        if !builder.enabled() {
            return;
        }

        let mut visitor = FieldVisitor {
            builder: Some(builder),
            message: None,
        };
        event.record(&mut visitor);

        let Some(builder) = visitor.builder else {
            return;
        };
        let builder = builder.str("target", meta.target());
        let result = match visitor.message {
            Some(msg) => builder.log(&msg),
            None => builder.send(),
        };

        match result {
            Ok(()) => {
                self.written_events.fetch_add(1, Ordering::Relaxed);
            }
            Err(err) => {
                self.failed_events.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(error = %err, "bridge layer failed to write event");
            }
        }
    }
}

struct FieldVisitor<'a, A: Adapter> {
    // taken and put back around each chained builder call
    builder: Option<Builder<'a, A>>,
    message: Option<String>,
}

impl<'a, A: Adapter> FieldVisitor<'a, A> {
    fn with(&mut self, f: impl FnOnce(Builder<'a, A>) -> Builder<'a, A>) {
        if let Some(builder) = self.builder.take() {
            self.builder = Some(f(builder));
        }
    }
}

impl<A: Adapter> Visit for FieldVisitor<'_, A> {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            self.with(|b| b.str(field.name(), value));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.with(|b| b.int(field.name(), value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.with(|b| b.uint(field.name(), value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.with(|b| b.float64(field.name(), value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.with(|b| b.bool(field.name(), value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        if field.name() == "error" {
            self.with(|b| b.err(value));
        } else {
            self.with(|b| b.str(field.name(), &value.to_string()));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = Some(format!("{:?}", value));
        } else {
            self.with(|b| b.str(field.name(), &format!("{:?}", value)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::event::Event as LogEvent;
    use crate::field::FieldValue;
    use parking_lot::Mutex;
    use tracing_subscriber::layer::SubscriberExt;

    #[derive(Default)]
    struct Captured {
        level: Level,
        message: String,
        fields: Vec<(String, FieldValue)>,
    }

    impl LogEvent for Captured {
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
    struct Sink {
        written: Mutex<Vec<Captured>>,
        fail: bool,
    }

    impl Adapter for Sink {
        type Event = Captured;

        fn new_event(&self, level: Level) -> Box<Captured> {
            Box::new(Captured {
                level,
                ..Captured::default()
            })
        }

        fn write(&self, event: &mut Captured) -> Result<(), Error> {
            if self.fail {
                return Err(Error::backend("sink closed"));
            }
            self.written.lock().push(std::mem::take(event));
            Ok(())
        }

        fn release_event(&self, _event: Box<Captured>) {}
    }

    #[test]
    fn forwards_message_and_fields_in_order() {
        let logger = Arc::new(Logger::new(Sink::default()));
        let layer = BridgeLayer::new(Arc::clone(&logger));
        let total = Arc::clone(&layer.total_events);
        let written = Arc::clone(&layer.written_events);
        let subscriber = tracing_subscriber::registry().with(layer);

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(target: "app", user = 7, ok = true, name = "bob", "hi");
            tracing::debug!(target: "app", "filtered by logger level");
        });

        assert_eq!(total.load(Ordering::Relaxed), 2);
        assert_eq!(written.load(Ordering::Relaxed), 1);

        let events = logger.adapter().written.lock();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].level, Level::INFORMATIONAL);
        assert_eq!(events[0].message, "hi");
        let keys: Vec<&str> = events[0].fields.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["user", "ok", "name", "target"]);
        assert_eq!(events[0].fields[0].1, FieldValue::Int(7));
        assert_eq!(events[0].fields[1].1, FieldValue::Bool(true));
        assert_eq!(events[0].fields[3].1, FieldValue::Str("app".to_string()));
    }

    #[test]
    fn counts_failures() {
        let logger = Arc::new(Logger::new(Sink {
            fail: true,
            ..Sink::default()
        }));
        let layer = BridgeLayer::new(logger);
        let failed = Arc::clone(&layer.failed_events);
        let subscriber = tracing_subscriber::registry().with(layer);

        tracing::subscriber::with_default(subscriber, || {
            tracing::error!(target: "app", "will not be written");
        });

        // the layer's own warning about the failure is not fed back in
        assert_eq!(failed.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn level_mapping() {
        assert_eq!(from_tracing(&TracingLevel::ERROR), Level::ERROR);
        assert_eq!(from_tracing(&TracingLevel::WARN), Level::WARNING);
        assert_eq!(from_tracing(&TracingLevel::INFO), Level::INFORMATIONAL);
        assert_eq!(from_tracing(&TracingLevel::DEBUG), Level::DEBUG);
        assert_eq!(from_tracing(&TracingLevel::TRACE), Level::TRACE);
    }
}
