//! Tracing subscriber initialisation.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Installs a formatted `tracing` subscriber as the global default.
///
/// `RUST_LOG` takes precedence over `default_filter`. Returns `false` when
/// a global subscriber was already installed, which is left in place.
#[must_use]
pub fn init_tracing(default_filter: &str) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let installed = tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .try_init()
        .is_ok();
    if installed {
        tracing::debug!(default_filter, "tracing initialised");
    }
    installed
}
