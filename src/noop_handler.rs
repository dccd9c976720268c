use std::sync::Arc;

use crate::error::BoxError;
use crate::field::Attr;
use crate::handler::Handler;
use crate::record::{HandlerLevel, Record};

/// A handler that accepts every level and drops every record.
///
/// Useful for measuring the overhead of an adapter itself without any I/O,
/// and for tests that don't care about output.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopHandler;

impl Handler for NoopHandler {
    fn enabled(&self, _level: HandlerLevel) -> bool {
        true
    }

    fn handle(&self, _record: &Record) -> Result<(), BoxError> {
        Ok(())
    }

    fn with_attrs(&self, _attrs: Vec<Attr>) -> Arc<dyn Handler> {
        Arc::new(NoopHandler)
    }

    fn with_group(&self, _name: &str) -> Arc<dyn Handler> {
        Arc::new(NoopHandler)
    }
}
