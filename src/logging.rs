//! Process logging setup.

use crate::config::LoggingConfig;
use tracing_subscriber::EnvFilter;

/// Install a global `tracing` subscriber described by `config`.
///
/// `RUST_LOG` takes precedence over `config.level`. Returns `false` when a
/// subscriber was already installed.
pub fn init_tracing(config: &LoggingConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let installed = if config.format.eq_ignore_ascii_case("json") {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.is_ok()
}
