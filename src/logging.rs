use std::env;

use tracing_subscriber::{EnvFilter, fmt};

/// Environment variable holding a `tracing` filter directive.
pub const LOG_ENV: &str = "SIMCHECK_LOG";

/// Install the stderr subscriber.
///
/// `SIMCHECK_LOG` wins when set; otherwise `warn`, or `info` with `--verbose`.
pub fn init_logger(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = env::var(LOG_ENV)
        .ok()
        .and_then(|directive| EnvFilter::try_new(directive).ok())
        .unwrap_or_else(|| EnvFilter::new(default));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}
