use std::io;
use std::sync::Arc;

use tracing::{error, info, warn};

use logbridge::compact::CompactLogger;
use logbridge::compact_adapter::with_compact;
use logbridge::init::{init_tracing_with_config, LayerConfig};
use logbridge::Error;

/// Route `tracing` macros through the compact adapter.
fn main() -> Result<(), Error> {
    let logger = Arc::new(with_compact(CompactLogger::new(io::stdout())));
    let handle = init_tracing_with_config(
        logger,
        LayerConfig {
            enable_stdout: false,
        },
    )?;

    info!(user = 7, "session started");
    warn!(retries = 2u64, "upstream slow");
    error!(code = "E42", "request failed");

    println!(
        "bridged {} of {} events",
        handle.written_events.load(std::sync::atomic::Ordering::Relaxed),
        handle.total_events.load(std::sync::atomic::Ordering::Relaxed),
    );
    Ok(())
}
