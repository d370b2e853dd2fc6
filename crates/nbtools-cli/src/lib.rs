//! Shared plumbing of the `nbvalidate`, `nbcatsrc` and `nbmirror` binaries.
//!
//! stdout carries only the result of a command. Diagnostics and logs go to
//! stderr; log verbosity follows `RUST_LOG` (default `warn`).

pub mod cli_contract;
pub mod cli_failure;

use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "warn";

/// Install the stderr log subscriber.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
