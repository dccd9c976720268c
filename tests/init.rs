#![cfg(all(feature = "structured", feature = "compact"))]

use std::io::{self, Write};
use std::sync::atomic::Ordering;
use std::sync::Arc;

use parking_lot::Mutex;

use logbridge::compact::CompactLogger;
use logbridge::compact_adapter::with_compact;
use logbridge::init::{init_tracing, init_tracing_with_config, LayerConfig};
use logbridge::Error;

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

// One test per binary: the global subscriber can be installed only once.
#[test]
fn installs_once_and_bridges_events() -> Result<(), Error> {
    let buf = Buffer::default();
    let logger = Arc::new(with_compact(CompactLogger::new(buf.clone())));
    let handle = init_tracing_with_config(
        Arc::clone(&logger),
        LayerConfig {
            enable_stdout: false,
        },
    )?;

    tracing::warn!(target: "app", disk = "sda", "almost full");
    tracing::debug!(target: "app", "below logger level");

    assert_eq!(handle.total_events.load(Ordering::Relaxed), 2);
    assert_eq!(handle.written_events.load(Ordering::Relaxed), 1);
    let out = String::from_utf8_lossy(&buf.0.lock()).into_owned();
    assert_eq!(
        out,
        "{\"level\":\"warn\",\"disk\":\"sda\",\"target\":\"app\",\"message\":\"almost full\"}\n"
    );

    assert!(matches!(init_tracing(logger), Err(Error::Init(_))));
    Ok(())
}
