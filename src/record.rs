use std::fmt;

use chrono::{DateTime, Utc};

use crate::field::Attr;

/// The four severities understood by a [`Handler`](crate::handler::Handler).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HandlerLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl HandlerLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            HandlerLevel::Debug => "DEBUG",
            HandlerLevel::Info => "INFO",
            HandlerLevel::Warn => "WARN",
            HandlerLevel::Error => "ERROR",
        }
    }
}

impl fmt::Display for HandlerLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A finalized log entry handed to a handler.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub time: DateTime<Utc>,
    pub level: HandlerLevel,
    pub message: String,
    /// Attributes in insertion order, duplicates included.
    pub attrs: Vec<Attr>,
}

impl Record {
    pub fn new(time: DateTime<Utc>, level: HandlerLevel, message: impl Into<String>) -> Self {
        Record {
            time,
            level,
            message: message.into(),
            attrs: Vec::new(),
        }
    }

    pub fn add_attrs(&mut self, attrs: impl IntoIterator<Item = Attr>) {
        self.attrs.extend(attrs);
    }
}
