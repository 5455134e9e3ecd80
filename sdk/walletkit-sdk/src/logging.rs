use tracing_subscriber::EnvFilter;

/// Install a formatted tracing subscriber for binaries and examples.
///
/// `RUST_LOG` takes precedence over `default_filter`. Calling this more than
/// once is harmless; only the first subscriber is installed.
pub fn init(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
