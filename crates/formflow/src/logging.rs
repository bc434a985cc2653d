use std::env;

use tracing_subscriber::EnvFilter;

use crate::config::LOG_ENV;

const DEFAULT_FILTER: &str = "warn";

/// Picks the log filter: explicit value, then `FORMFLOW_LOG`, then
/// `RUST_LOG`, then `warn`.
pub fn resolve_filter(explicit: Option<&str>) -> String {
    explicit
        .map(str::to_string)
        .or_else(|| env::var(LOG_ENV).ok())
        .or_else(|| env::var("RUST_LOG").ok())
        .filter(|filter| !filter.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_FILTER.to_string())
}

/// Installs the global subscriber, writing to stderr. Calling it twice is
/// harmless.
pub fn init_tracing(explicit: Option<&str>) {
    let filter = resolve_filter(explicit);
    let env_filter = EnvFilter::try_new(&filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();
}
