//! Structured logging.
//!
//! Line-oriented `tracing` output on stdout. The filter comes from `RUST_LOG`
//! when set, otherwise `function_chain=info,tower_http=info`.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "function_chain=info,tower_http=info";

/// Install the global subscriber. Safe to call more than once; later calls
/// leave the first subscriber in place.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
