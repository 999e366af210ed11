//! Tracing subscriber setup for the `bucket` binary

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::Settings;

/// Install a stderr subscriber. `RUST_LOG` wins over the configured level.
///
/// Calling this twice is harmless; the second call leaves the first subscriber in place.
pub fn init_logging(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.log_level.as_str()));

    let stderr_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .try_init();
}
