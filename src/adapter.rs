use crate::error::Error;
use crate::event::Event;
use crate::level::Level;

/// The three hook points a front-end drives for every log call:
/// `new_event`, then field accumulation on the event, then `write`, then
/// `release_event`.
///
/// Adapters are shared between threads. The events they hand out are not.
pub trait Adapter: Send + Sync {
    type Event: Event + Send;

    /// Take an event from the adapter's pool (allocating only when the pool
    /// is empty), reset it for `level` and apply configured defaults.
    ///
    /// Always returns an event; callers decide "disabled" from the level.
    fn new_event(&self, level: Level) -> Box<Self::Event>;

    /// Translate the event into the backend's record and hand it over.
    ///
    /// Returns [`Error::Disabled`] without touching the backend when the
    /// backend does not accept the level. Backend failures are returned
    /// unchanged inside [`Error::Backend`].
    fn write(&self, event: &mut Self::Event) -> Result<(), Error>;

    /// Clear the event and return it to the pool. The event must not be used
    /// again; ownership moves here so it cannot be released twice.
    fn release_event(&self, event: Box<Self::Event>);
}
