use std::error::Error as StdError;
use std::time::Duration;

use base64::engine::GeneralPurpose;
use chrono::{DateTime, Utc};

use crate::field::FieldValue;
use crate::level::Level;

/// Capabilities of a pooled log event.
///
/// An event is owned by one thread from [`Adapter::new_event`] until
/// [`Adapter::release_event`]; none of these methods synchronise. Fields are
/// kept in call order and duplicate keys are passed through untouched.
///
/// The typed adders are optional optimisations. The default implementations
/// return `false`, which tells the caller to fall back to
/// [`Event::add_field`]. An event that is not live (never handed out, or
/// already released) reports [`Level::DISABLED`] and every adder returns
/// `false` without touching state.
///
/// [`Adapter::new_event`]: crate::adapter::Adapter::new_event
/// [`Adapter::release_event`]: crate::adapter::Adapter::release_event
pub trait Event {
    fn level(&self) -> Level;

    fn add_field(&mut self, key: &str, value: FieldValue);

    fn add_message(&mut self, _msg: &str) -> bool {
        false
    }

    /// `None` is not an error: nothing is added and `true` is returned.
    /// Each `Some` appends another entry under the backend's error key.
    fn add_error(&mut self, _err: Option<&(dyn StdError + '_)>) -> bool {
        false
    }

    /// Open a nested namespace for subsequent keys. Returning `false` asks
    /// the caller to flatten keys as `group.key` instead.
    fn add_group(&mut self, _name: &str) -> bool {
        false
    }

    fn add_string(&mut self, _key: &str, _val: &str) -> bool {
        false
    }

    fn add_int(&mut self, _key: &str, _val: i64) -> bool {
        false
    }

    fn add_uint(&mut self, _key: &str, _val: u64) -> bool {
        false
    }

    fn add_float32(&mut self, _key: &str, _val: f32) -> bool {
        false
    }

    fn add_float64(&mut self, _key: &str, _val: f64) -> bool {
        false
    }

    fn add_bool(&mut self, _key: &str, _val: bool) -> bool {
        false
    }

    fn add_time(&mut self, _key: &str, _val: DateTime<Utc>) -> bool {
        false
    }

    fn add_duration(&mut self, _key: &str, _val: Duration) -> bool {
        false
    }

    /// `engine` defaults to standard padded base64.
    fn add_base64_bytes(
        &mut self,
        _key: &str,
        _val: &[u8],
        _engine: Option<&GeneralPurpose>,
    ) -> bool {
        false
    }

    /// Add an already-encoded JSON payload.
    fn add_raw_json(&mut self, _key: &str, _val: &str) -> bool {
        false
    }
}
