//! Startup failures.
//!
//! Any of these aborts the process before (or instead of) serving traffic.

use std::path::PathBuf;

use thiserror::Error;

use crate::chain::ForwardError;
use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("cannot write readiness marker {}: {source}", path.display())]
    Marker {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Client(#[from] ForwardError),

    #[error("server terminated unexpectedly: {0}")]
    Serve(#[source] std::io::Error),
}
