use tracing_subscriber::EnvFilter;

use crate::defaults::{default_log_filter, DEFAULT_LOG_FILTER, VERBOSE_LOG_FILTER};

/// Installs the stderr fmt subscriber.
///
/// The filter comes from `CODEX_SWITCH_LOG`, then `RUST_LOG`, defaulting to
/// `warn`; `verbose` forces `debug`. An unparsable directive falls back to
/// the default. Calling this twice is a no-op.
pub fn init(verbose: bool) {
    let directive = if verbose {
        VERBOSE_LOG_FILTER.to_string()
    } else {
        default_log_filter()
    };
    let filter =
        EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}
