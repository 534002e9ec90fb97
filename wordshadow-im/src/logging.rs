//! Process-wide logging setup

use std::sync::Once;

static INIT_LOGGING: Once = Once::new();

/// Install a stderr `tracing` subscriber filtered by `RUST_LOG` (default `warn`).
///
/// Safe to call more than once; only the first call has an effect, and an
/// already installed global subscriber is left alone.
pub fn init_logging() {
    INIT_LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_writer(std::io::stderr)
            .try_init();
    });
}
