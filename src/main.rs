//! Chain instance binary.
//!
//! ```text
//!                       ┌──────────────────────────────────────────────┐
//!   previous hop        │               function-chain                 │
//!   or client           │                                              │
//!   ───── POST / ──────▶│  intake ──▶ handler ──┬─▶ forward (sync) ────┼──▶ next hop
//!                       │                       ├─▶ queue ─▶ worker ───┼──▶ next hop
//!   ◀──── response ─────│                       └─▶ output (end)       │
//!                       │                                              │
//!   GET /_/health ─────▶│  readiness (flag + marker file)              │
//!                       └──────────────────────────────────────────────┘
//! ```
//!
//! Configuration comes from the environment (`forward`, `async`,
//! `input_mode`, `form_field`, `content_type`, `read_timeout`,
//! `write_timeout`, ...). The bundled handler tags its input with the host
//! name; embed the library to run your own.

use std::sync::Arc;

use function_chain::lifecycle::{signals, StartupError};
use function_chain::{config, observability, HandlerError, HttpServer};
use tokio::net::TcpListener;

/// Prefix the input with the name of the host that processed it.
fn tag_with_hostname(input: &[u8]) -> Result<Vec<u8>, HandlerError> {
    let hostname = hostname()?;
    Ok(format!("applying {} to {}", hostname, String::from_utf8_lossy(input)).into_bytes())
}

fn hostname() -> Result<String, HandlerError> {
    if let Ok(name) = std::env::var("HOSTNAME") {
        if !name.is_empty() {
            return Ok(name);
        }
    }
    std::fs::read_to_string("/proc/sys/kernel/hostname")
        .or_else(|_| std::fs::read_to_string("/etc/hostname"))
        .map(|name| name.trim().to_string())
        .map_err(|e| HandlerError::new(format!("failed to resolve hostname: {e}")))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    observability::logging::init();

    tracing::info!("function-chain v{} starting", env!("CARGO_PKG_VERSION"));

    let config = config::from_env().map_err(StartupError::from)?;
    tracing::info!(
        config = %serde_json::to_string(&config)?,
        "Configuration loaded"
    );

    let listener = TcpListener::bind(&config.bind_address)
        .await
        .map_err(|source| StartupError::Bind {
            address: config.bind_address.clone(),
            source,
        })?;

    let server = HttpServer::new(config, Arc::new(tag_with_hostname))?;
    server.run(listener, signals::termination()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
