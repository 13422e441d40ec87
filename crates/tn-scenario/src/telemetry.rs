//! Tracing setup for binaries and tests embedding the engine
//!
//! The library only emits events; installing a subscriber is left to the
//! host. [`init_tracing`] is a convenience for hosts without their own.

use tracing_subscriber::EnvFilter;

/// Install a formatting subscriber filtered by `RUST_LOG` (default `info`)
///
/// Does nothing if a global subscriber is already installed, so it is safe to
/// call from every test.
pub fn init_tracing() {
    init_tracing_with_default("info");
}

/// Same as [`init_tracing`] with a different fallback filter
pub fn init_tracing_with_default(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
