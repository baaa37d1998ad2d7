//! Diagnostic logging for hebreadctl.
//!
//! Logs go to stderr so command output on stdout stays clean. The filter
//! comes from `$HEBREAD_LOG` (e.g. `debug`, `hebread_common=trace`).

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter
pub const LOG_ENV: &str = "HEBREAD_LOG";

/// Used when `$HEBREAD_LOG` is unset or invalid
pub const DEFAULT_FILTER: &str = "warn";

pub fn filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber. Safe to call twice; the second call is a no-op.
pub fn init() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter())
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
