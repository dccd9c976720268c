use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use logbridge::json_handler::JsonHandler;
use logbridge::record::HandlerLevel;
use logbridge::structured::StructuredBuilder;
use logbridge::{Attr, Error, Level};

/// JSON lines on stdout through the structured adapter, with a default
/// field, a group and a redaction hook.
fn main() -> Result<(), Error> {
    let handler = JsonHandler::new(io::stdout()).with_level(HandlerLevel::Debug);
    let logger = StructuredBuilder::new()
        .handler(Arc::new(handler))
        .level(Level::DEBUG)
        .attr("service", "checkout")
        .group("req")
        .replace_attr(|_groups, attr| match attr.key.as_str() {
            "card" => Some(Attr::new("card", "****")),
            _ => Some(attr),
        })
        .build()?;

    logger
        .info()
        .str("path", "/pay")
        .str("card", "4111111111111111")
        .dur("took", Duration::from_millis(42))
        .log("payment accepted")?;

    let err = io::Error::new(io::ErrorKind::TimedOut, "gateway timeout");
    logger.err().err(&err).int("attempt", 3).log("payment failed")?;

    // filtered: below the logger level, never touches the pool
    logger.trace().log("not shown")?;

    let n: u64 = 10_000;
    let quiet = StructuredBuilder::new()
        .handler(Arc::new(logbridge::noop_handler::NoopHandler))
        .build()?;
    let start = Instant::now();
    for i in 0..n {
        quiet.info().uint("iteration", i).log("load")?;
    }
    let elapsed = start.elapsed();
    println!(
        "noop handler: {} events in {:?} (~{:.0} ev/s)",
        n,
        elapsed,
        n as f64 / elapsed.as_secs_f64()
    );
    Ok(())
}
