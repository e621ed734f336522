//! Dual-mode logging setup: a compact human formatter by default, or
//! structured JSON lines under `-json`, built on `tracing`/`tracing-subscriber`.

use tracing_subscriber::EnvFilter;

/// Installs the global `tracing` subscriber. `verbose` lowers the default
/// level from INFO to DEBUG; `json` switches the formatter.
pub fn init(json: bool, verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);

    if json {
        subscriber.json().init();
    } else {
        subscriber.compact().init();
    }
}
