use std::sync::Arc;

use serde_json::Value;

use crate::error::BoxError;
use crate::field::{attrs_to_map, insert_at, Attr};
use crate::handler::Handler;
use crate::record::{HandlerLevel, Record};

/// Target used for every event this handler emits.
pub const TARGET: &str = "logbridge";

macro_rules! emit {
    ($level:expr, $record:expr, $fields:expr) => {
        tracing::event!(
            target: "logbridge",
            $level,
            fields = %$fields,
            "{}",
            $record.message
        )
    };
}

/// Handler re-emitting records as `tracing` events.
///
/// The record message becomes the event message and all attributes are
/// rendered as one JSON object in the `fields` field. Enabled-ness follows
/// the installed subscriber for the `logbridge` target.
///
/// [`BridgeLayer`](crate::layer::BridgeLayer) ignores events with this
/// target, so the two can share a subscriber without looping.
#[derive(Clone, Debug, Default)]
pub struct TracingHandler {
    bound: Vec<Attr>,
    groups: Vec<String>,
}

impl TracingHandler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Handler for TracingHandler {
    fn enabled(&self, level: HandlerLevel) -> bool {
        match level {
            HandlerLevel::Debug => tracing::enabled!(target: "logbridge", tracing::Level::DEBUG),
            HandlerLevel::Info => tracing::enabled!(target: "logbridge", tracing::Level::INFO),
            HandlerLevel::Warn => tracing::enabled!(target: "logbridge", tracing::Level::WARN),
            HandlerLevel::Error => tracing::enabled!(target: "logbridge", tracing::Level::ERROR),
        }
    }

    fn handle(&self, record: &Record) -> Result<(), BoxError> {
        let mut attrs = self.bound.clone();
        insert_at(&mut attrs, &self.groups, record.attrs.clone());
        let fields = Value::Object(attrs_to_map(&attrs));

        match record.level {
            HandlerLevel::Debug => emit!(tracing::Level::DEBUG, record, fields),
            HandlerLevel::Info => emit!(tracing::Level::INFO, record, fields),
            HandlerLevel::Warn => emit!(tracing::Level::WARN, record, fields),
            HandlerLevel::Error => emit!(tracing::Level::ERROR, record, fields),
        }
        Ok(())
    }

    fn with_attrs(&self, attrs: Vec<Attr>) -> Arc<dyn Handler> {
        let mut next = self.clone();
        insert_at(&mut next.bound, &self.groups, attrs);
        Arc::new(next)
    }

    fn with_group(&self, name: &str) -> Arc<dyn Handler> {
        let mut next = self.clone();
        if !name.is_empty() {
            next.groups.push(name.to_string());
        }
        Arc::new(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::io;
    use std::sync::Mutex;
    use tracing_subscriber::fmt::MakeWriter;

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().expect("capture lock").extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Capture {
        type Writer = Capture;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn forwards_record_to_subscriber() -> Result<(), BoxError> {
        let capture = Capture::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(capture.clone())
            .with_max_level(tracing::Level::INFO)
            .with_ansi(false)
            .finish();

        tracing::subscriber::with_default(subscriber, || -> Result<(), BoxError> {
            let handler = TracingHandler::new().with_group("req");
            assert!(handler.enabled(HandlerLevel::Warn));
            assert!(!handler.enabled(HandlerLevel::Debug));

            let mut record = Record::new(Utc::now(), HandlerLevel::Warn, "slow request");
            record.add_attrs(vec![Attr::new("ms", 950)]);
            handler.handle(&record)
        })?;

        let out = String::from_utf8(capture.0.lock().expect("capture lock").clone())?;
        assert!(out.contains("WARN"));
        assert!(out.contains("slow request"));
        assert!(out.contains(r#"{"req":{"ms":950}}"#));
        assert!(out.contains(TARGET));
        Ok(())
    }
}
