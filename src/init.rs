use std::sync::Arc;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

use crate::adapter::Adapter;
use crate::error::Error;
use crate::layer::BridgeLayer;
use crate::logger::Logger;

/// Configuration of the global bridge subscriber.
///
/// **Fields**
/// - `enable_stdout`: if `true`, a `tracing_subscriber::fmt::Layer` is added
///   next to the [`BridgeLayer`] so events are also printed to stdout.
#[derive(Clone, Debug)]
pub struct LayerConfig {
    pub enable_stdout: bool,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            enable_stdout: true,
        }
    }
}

/// Install a [`Registry`] with a [`BridgeLayer`] over `logger` as the
/// global default subscriber.
///
/// **Returns**
/// - the installed layer's counters as a [`BridgeHandle`].
/// - `Err(Error::Init)` if a global subscriber is already set.
///
/// Do not pair this with a logger whose adapter writes through
/// [`TracingHandler`](crate::tracing_handler::TracingHandler); its records
/// would be dropped as the crate's own events.
pub fn init_tracing_with_config<A>(
    logger: Arc<Logger<A>>,
    config: LayerConfig,
) -> Result<BridgeHandle, Error>
where
    A: Adapter + 'static,
{
    let layer = BridgeLayer::new(logger);
    let handle = BridgeHandle {
        total_events: Arc::clone(&layer.total_events),
        written_events: Arc::clone(&layer.written_events),
        failed_events: Arc::clone(&layer.failed_events),
    };

    // The two subscriber types differ, so each branch installs its own.
    let installed = if config.enable_stdout {
        let subscriber = Registry::default()
            .with(layer)
            .with(tracing_subscriber::fmt::layer());
        tracing::subscriber::set_global_default(subscriber)
    } else {
        let subscriber = Registry::default().with(layer);
        tracing::subscriber::set_global_default(subscriber)
    };
    installed.map_err(|e| Error::Init(e.to_string()))?;
    Ok(handle)
}

/// [`init_tracing_with_config`] with [`LayerConfig::default`].
pub fn init_tracing<A>(logger: Arc<Logger<A>>) -> Result<BridgeHandle, Error>
where
    A: Adapter + 'static,
{
    init_tracing_with_config(logger, LayerConfig::default())
}

/// Counters of the installed [`BridgeLayer`].
#[derive(Clone, Debug)]
pub struct BridgeHandle {
    pub total_events: Arc<std::sync::atomic::AtomicU64>,
    pub written_events: Arc<std::sync::atomic::AtomicU64>,
    pub failed_events: Arc<std::sync::atomic::AtomicU64>,
}
