use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

pub const DEFAULT_LOG_LEVEL: &str =
    "info,hostel_desk_allocation=debug,hostel_desk_backend=debug,tower_http=debug";

/// `RUST_LOG` wins over the configured filter, which wins over
/// [`DEFAULT_LOG_LEVEL`].
#[must_use]
pub fn env_filter(configured: Option<&str>) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(configured.unwrap_or(DEFAULT_LOG_LEVEL)))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL))
}

pub fn setup_telemetry(configured: Option<&str>) {
    let stdout_log = tracing_subscriber::fmt::layer().pretty();

    tracing_subscriber::registry()
        .with(stdout_log.with_filter(env_filter(configured)))
        .init();
}
