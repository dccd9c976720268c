use std::io;

use logbridge::compact::CompactLogger;
use logbridge::compact_adapter::CompactBuilder;
use logbridge::config::AdapterConfig;
use logbridge::Error;

/// Compact JSON lines on stdout, configured from a JSON document.
fn main() -> Result<(), Error> {
    let config: AdapterConfig = serde_json::from_str(
        r#"{"level": "debug", "fields": {"service": "inventory"}, "groups": ["job"]}"#,
    )
    .map_err(Error::backend)?;

    let logger = CompactBuilder::from_config(&config)
        .logger(CompactLogger::new(io::stdout()).with_timestamp())
        .build()?;

    logger
        .notice()
        .str("sku", "A-1001")
        .int("delta", -3)
        .group("warehouse")
        .str("id", "w7")
        .log("stock adjusted")?;

    logger.debug().raw_json("batch", r#"{"size":50,"ok":true}"#).send()?;
    Ok(())
}
