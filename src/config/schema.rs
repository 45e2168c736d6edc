//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for a chain
//! instance. All types derive Serde traits so the effective configuration can
//! be logged at startup and built from structured sources in tests.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default multipart form field carrying the payload between hops.
pub const DEFAULT_FORM_FIELD: &str = "data";

/// Default upper bound for an inbound body or multipart form (32 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 32 << 20;

/// Default number of identifiers the async work queue can hold.
pub const DEFAULT_QUEUE_CAPACITY: usize = 10;

/// Fallback for read and write timeouts.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Root configuration for a chain instance.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// How inbound invocations are decoded.
    pub intake: IntakeConfig,

    /// Next-hop settings.
    pub forward: ForwardConfig,

    /// Content type used when the handler's own output is returned.
    pub response_content_type: String,

    /// Read/write timeouts.
    pub timeouts: TimeoutConfig,

    /// Zero-byte file whose presence gates the health check.
    pub readiness_marker: PathBuf,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            intake: IntakeConfig::default(),
            forward: ForwardConfig::default(),
            response_content_type: "application/octet-stream".to_string(),
            timeouts: TimeoutConfig::default(),
            readiness_marker: std::env::temp_dir().join(".lock"),
        }
    }
}

impl ChainConfig {
    /// Whether this instance forwards its output at all.
    pub fn forwarding_enabled(&self) -> bool {
        self.forward.address.is_some()
    }

    /// Whether forwarding happens on the background worker.
    pub fn is_async(&self) -> bool {
        self.forwarding_enabled() && self.forward.asynchronous
    }

    /// Drain budget applied on shutdown. Reuses the write timeout, so a zero
    /// write timeout drains without a deadline.
    pub fn drain_budget(&self) -> Option<Duration> {
        self.timeouts.write_limit()
    }
}

/// How the request identifier and payload are recovered from an invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum InputMode {
    /// Raw POST body; a fresh identifier is generated (chain origin).
    #[default]
    Raw,
    /// Multipart upload; the identifier is the field's filename (chain continuation).
    File,
}

/// Intake decoder configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IntakeConfig {
    /// Input mode.
    pub mode: InputMode,

    /// Form field holding the upload in file mode.
    pub field: String,

    /// Maximum body or form size in bytes.
    pub max_body_bytes: usize,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            mode: InputMode::Raw,
            field: DEFAULT_FORM_FIELD.to_string(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

/// Next-hop configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ForwardConfig {
    /// Next-hop URL. `None` marks the end of the chain.
    pub address: Option<String>,

    /// Forward on the background worker instead of inline.
    pub asynchronous: bool,

    /// Upload field name the next hop expects.
    pub field: String,

    /// Capacity of the async work queue.
    pub queue_capacity: usize,

    /// Timeout on the outbound call. Unset means no bound beyond the
    /// inbound write timeout (sync path) or none at all (async path).
    pub timeout: Option<Duration>,
}

impl Default for ForwardConfig {
    fn default() -> Self {
        Self {
            address: None,
            asynchronous: false,
            field: DEFAULT_FORM_FIELD.to_string(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            timeout: None,
        }
    }
}

/// Timeout configuration for the inbound side.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Bound on reading the request body. Zero means unbounded.
    pub read: Duration,

    /// Bound on the whole request pipeline; also the shutdown drain budget.
    /// Zero means unbounded.
    pub write: Duration,
}

impl TimeoutConfig {
    pub fn read_limit(&self) -> Option<Duration> {
        bounded(self.read)
    }

    pub fn write_limit(&self) -> Option<Duration> {
        bounded(self.write)
    }
}

fn bounded(timeout: Duration) -> Option<Duration> {
    (!timeout.is_zero()).then_some(timeout)
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            read: DEFAULT_TIMEOUT,
            write: DEFAULT_TIMEOUT,
        }
    }
}
