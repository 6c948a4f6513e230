use tracing_subscriber::{EnvFilter, fmt};

/// Initialize JSON logging filtered by `RUST_LOG` (defaults to "info").
///
/// Event fields are flattened so `endpoint`, `error` and friends land at the top level of
/// each log line.
pub fn init_normal_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .json()
        .flatten_event(true)
        .init();
}

pub fn init_logging() {
    // tokio-console owns the subscriber when enabled
    if std::env::var("TOKIO_CONSOLE").is_ok() {
        init_console_logging();
    } else {
        init_normal_logging();
    }
}

fn init_console_logging() {
    console_subscriber::init();
}
