use std::sync::Arc;

use crate::error::BoxError;
use crate::field::Attr;
use crate::record::{HandlerLevel, Record};

/// Structured-log backend with four severities.
///
/// Implementations decide which levels they accept, how records are
/// rendered and where they go. They must be safe to share between threads
/// and serialise their own output.
pub trait Handler: Send + Sync {
    /// Whether a record at `level` would be handled. Checked before any
    /// record is built.
    fn enabled(&self, level: HandlerLevel) -> bool;

    /// Render and emit one record.
    ///
    /// **Returns**
    /// - `Ok(())` if the record was accepted.
    /// - `Err(..)` on I/O or encoding failure; callers pass it through
    ///   unchanged.
    fn handle(&self, record: &Record) -> Result<(), BoxError>;

    /// A handler that includes `attrs` in every record it handles.
    fn with_attrs(&self, attrs: Vec<Attr>) -> Arc<dyn Handler>;

    /// A handler that nests every subsequent attribute under `name`.
    /// An empty name returns an equivalent handler.
    fn with_group(&self, name: &str) -> Arc<dyn Handler>;
}
