//! Telemetry module
//!
//! Tracing subscriber setup shared by binaries and integration tests.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging. Honors `RUST_LOG` when set.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ledger_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Same as [`init_tracing`] but safe to call more than once. Intended for
/// tests, where several test functions may race to install the subscriber.
pub fn try_init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ledger_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
