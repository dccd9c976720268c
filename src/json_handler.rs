use std::io::Write;
use std::sync::Arc;

use chrono::SecondsFormat;
use parking_lot::Mutex;
use serde_json::Value;

use crate::error::BoxError;
use crate::field::{attrs_to_map, insert_at, Attr};
use crate::handler::Handler;
use crate::record::{HandlerLevel, Record};

type SharedWriter = Arc<Mutex<Box<dyn Write + Send>>>;

/// Handler writing one JSON object per line.
///
/// Every line starts with `time`, `level` and `msg`, followed by the bound
/// attributes and then the record's attributes. Groups become nested
/// objects. Duplicate keys keep their first position and their last value.
#[derive(Clone)]
pub struct JsonHandler {
    writer: SharedWriter,
    min_level: HandlerLevel,
    bound: Vec<Attr>,
    groups: Vec<String>,
}

impl JsonHandler {
    /// Handler for `writer` accepting [`HandlerLevel::Info`] and above.
    pub fn new<W>(writer: W) -> Self
    where
        W: Write + Send + 'static,
    {
        JsonHandler {
            writer: Arc::new(Mutex::new(Box::new(writer))),
            min_level: HandlerLevel::Info,
            bound: Vec::new(),
            groups: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_level(mut self, level: HandlerLevel) -> Self {
        self.min_level = level;
        self
    }

    fn encode(&self, record: &Record) -> Result<Vec<u8>, serde_json::Error> {
        let mut attrs = self.bound.clone();
        insert_at(&mut attrs, &self.groups, record.attrs.clone());

        let mut object = serde_json::Map::with_capacity(attrs.len() + 3);
        object.insert(
            "time".to_string(),
            Value::String(record.time.to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        object.insert(
            "level".to_string(),
            Value::String(record.level.as_str().to_string()),
        );
        object.insert("msg".to_string(), Value::String(record.message.clone()));
        object.extend(attrs_to_map(&attrs));

        let mut line = serde_json::to_vec(&Value::Object(object))?;
        line.push(b'\n');
        Ok(line)
    }
}

impl Handler for JsonHandler {
    fn enabled(&self, level: HandlerLevel) -> bool {
        level >= self.min_level
    }

    fn handle(&self, record: &Record) -> Result<(), BoxError> {
        let line = self.encode(record)?;
        let mut writer = self.writer.lock();
        writer.write_all(&line)?;
        writer.flush()?;
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
