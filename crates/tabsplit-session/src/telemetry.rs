//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

/// Installs the global fmt subscriber.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=tabsplit_core=trace` - Show trace for the core crate only
/// - Otherwise: `fallback`, usually the configured `[logging] filter`
///
/// Calling this twice is harmless; the second call is ignored.
pub fn init_tracing(fallback: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
