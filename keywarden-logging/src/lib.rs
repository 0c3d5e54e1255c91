//! Structured logging setup for keywarden functions

use tracing_subscriber::{
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Initialize structured logging for a Lambda function
///
/// Lambda forwards stdout to CloudWatch Logs line by line, and CloudWatch
/// stamps every record with its ingestion time, so records carry no
/// timestamp of their own. ANSI colors are off because CloudWatch shows
/// escape codes verbatim.
///
/// This sets up:
/// - JSON formatted logs, one object per line
/// - `RUST_LOG` overriding the configured level
pub fn init_logging(service_name: &str, default_level: &str) {
    tracing_subscriber::registry()
        .with(env_filter(default_level))
        .with(
            fmt::layer()
                .json()
                .with_ansi(false)
                .without_time()
                .with_target(true)
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    tracing::info!(
        service = service_name,
        "Logging initialized"
    );
}

/// Initialize simple console logging (for local runs)
pub fn init_console_logging(service_name: &str, default_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_level))
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!(
        service = service_name,
        "Console logging initialized"
    );
}
