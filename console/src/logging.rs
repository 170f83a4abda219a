//! Subscriber setup for the console binary and its tests.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Installs the global subscriber. `env_filter` uses `EnvFilter` directive
/// syntax, e.g. `courier_core=debug,info`. Logs go to stderr so command
/// output on stdout stays clean.
pub fn initialize(env_filter: &str) {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .with(EnvFilter::new(env_filter))
        .init();
}

/// Like [`initialize`], but can be called multiple times in a row. Later calls
/// are ignored.
///
/// Useful for tests.
pub fn initialize_reentrant(env_filter: &str) {
    static ONCE: Once = Once::new();
    ONCE.call_once(|| initialize(env_filter));
}
