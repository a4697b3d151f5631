//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

/// The filter used when neither `RUST_LOG` nor a configured directive is
/// usable.
pub const DEFAULT_FILTER: &str = "info";

/// Builds the filter: `RUST_LOG` wins, then `directive`, then
/// [`DEFAULT_FILTER`].
pub fn build_filter(directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::try_new(directive).unwrap_or_else(|e| {
            eprintln!("invalid log filter {directive:?} ({e}), using {DEFAULT_FILTER:?}");
            EnvFilter::new(DEFAULT_FILTER)
        })
    })
}

/// Installs a global fmt subscriber.
///
/// Returns `false` if a global subscriber was already installed, in
/// which case nothing changes.
pub fn init_tracing(directive: &str) -> bool {
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(build_filter(directive))
        .try_init()
        .is_ok()
}
