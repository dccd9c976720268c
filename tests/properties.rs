#![cfg(all(feature = "structured", feature = "compact"))]

use std::io::{self, Write};
use std::sync::Arc;

use parking_lot::Mutex;
use proptest::prelude::*;
use serde_json::Value;

use logbridge::compact::{CompactLevel, CompactLogger};
use logbridge::compact_adapter::{to_compact_level, with_compact};
use logbridge::json_handler::JsonHandler;
use logbridge::record::HandlerLevel;
use logbridge::structured::{to_handler_level, StructuredBuilder};
use logbridge::Level;

#[derive(Clone, Default)]
struct Buffer(Arc<Mutex<Vec<u8>>>);

impl Write for Buffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Buffer {
    fn first_line(&self) -> Value {
        let text = String::from_utf8_lossy(&self.0.lock()).into_owned();
        serde_json::from_str(text.lines().next().unwrap_or("null")).unwrap_or(Value::Null)
    }
}

fn keys() -> impl Strategy<Value = Vec<String>> {
    prop::collection::hash_set("k[a-z0-9_]{0,7}", 1..12).prop_map(|s| s.into_iter().collect())
}

proptest! {
    #[test]
    fn handler_mapping_is_total_and_monotonic(n in any::<i8>()) {
        let mapped = to_handler_level(Level(n));
        if (0..8).contains(&n) {
            let next = to_handler_level(Level(n + 1));
            // less severe generic level never maps to a more severe handler level
            prop_assert!(next <= mapped);
        }
        if !(0..=8).contains(&n) {
            prop_assert_eq!(mapped, HandlerLevel::Debug);
        }
    }

    #[test]
    fn compact_mapping_is_total(n in any::<i8>()) {
        let mapped = to_compact_level(Level(n));
        if n < 0 {
            prop_assert_eq!(mapped, CompactLevel::Disabled);
        } else {
            prop_assert!(mapped != CompactLevel::Disabled);
        }
    }

    #[test]
    fn structured_preserves_field_order(keys in keys()) {
        let buf = Buffer::default();
        let logger = StructuredBuilder::new()
            .handler(Arc::new(JsonHandler::new(buf.clone())))
            .build()
            .map_err(|e| TestCaseError::fail(e.to_string()))?;

        let mut builder = logger.info();
        for (i, key) in keys.iter().enumerate() {
            builder = builder.int(key, i as i64);
        }
        builder.log("ordered").map_err(|e| TestCaseError::fail(e.to_string()))?;

        let line = buf.first_line();
        let obj = line.as_object().ok_or_else(|| TestCaseError::fail("not an object"))?;
        let got: Vec<&String> = obj.keys().skip(3).collect();
        let want: Vec<&String> = keys.iter().collect();
        prop_assert_eq!(got, want);
    }

    #[test]
    fn compact_preserves_field_order(keys in keys()) {
        let buf = Buffer::default();
        let logger = with_compact(CompactLogger::new(buf.clone()));

        let mut builder = logger.info();
        for (i, key) in keys.iter().enumerate() {
            builder = builder.int(key, i as i64);
        }
        builder.send().map_err(|e| TestCaseError::fail(e.to_string()))?;

        let line = buf.first_line();
        let obj = line.as_object().ok_or_else(|| TestCaseError::fail("not an object"))?;
        let got: Vec<&String> = obj.keys().skip(1).collect();
        let want: Vec<&String> = keys.iter().collect();
        prop_assert_eq!(got, want);
    }
}
