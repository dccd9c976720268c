//! Pooled-event adapters binding a 9-level structured logging front-end to
//! narrower backends.
//!
//! An [`Adapter`] hands out pooled events, writes them to its backend and
//! takes them back. [`Logger`] drives that cycle with a fluent builder.

pub mod adapter;
pub mod config;
pub mod error;
pub mod event;
pub mod field;
pub mod level;
pub mod logger;
pub mod pool;

pub mod handler;
pub mod json_handler;
pub mod noop_handler;
pub mod record;
pub mod tracing_handler;

#[cfg(feature = "structured")]
pub mod structured;

#[cfg(feature = "compact")]
pub mod compact;
#[cfg(feature = "compact")]
pub mod compact_adapter;

#[cfg(feature = "protojson")]
pub mod protojson;

pub mod init;
pub mod layer;

pub use adapter::Adapter;
pub use error::{BoxError, Error};
pub use event::Event;
pub use field::{Attr, FieldValue};
pub use level::Level;
pub use logger::{Builder, Logger};
