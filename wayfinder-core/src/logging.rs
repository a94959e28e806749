use tracing_subscriber::EnvFilter;

/// Install a global fmt subscriber filtered by `RUST_LOG`, defaulting to `info`.
///
/// Call once at startup, before [`Loader::load`](crate::Loader::load), so the
/// route registration lines are visible. Does nothing if a global subscriber
/// is already installed.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}
