use serde::Deserialize;
use serde_json::{Map, Value};

use crate::level::Level;

/// Settings shared by the adapter builders.
///
/// ```ignore
/// let config: AdapterConfig = serde_json::from_str(
///     r#"{"level": "debug", "fields": {"service": "api"}, "groups": ["req"]}"#,
/// )?;
/// ```
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct AdapterConfig {
    /// Minimum level; by name (`"warning"`) or number (`4`).
    pub level: Level,
    /// Fields added to every event, in document order.
    pub fields: Map<String, Value>,
    /// Group prefix applied to event fields.
    pub groups: Vec<String>,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        AdapterConfig {
            level: Level::INFORMATIONAL,
            fields: Map::new(),
            groups: Vec::new(),
        }
    }
}
