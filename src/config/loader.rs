//! Configuration loading from the process environment.

use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::config::duration::{parse_duration, parse_int_or_duration};
use crate::config::schema::{ChainConfig, InputMode, DEFAULT_TIMEOUT};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The next-hop address is not a usable HTTP URL.
    #[error("invalid forward address '{address}': {reason}")]
    InvalidForwardAddress { address: String, reason: String },

    /// `input_mode` names neither raw POST nor file upload.
    #[error("invalid input mode '{0}', expected POST or FILE")]
    InvalidInputMode(String),

    /// A form field name was set but empty.
    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    /// The work queue needs at least one slot.
    #[error("invalid queue capacity '{0}', expected a positive integer")]
    InvalidQueueCapacity(String),
}

/// Load configuration from the process environment.
pub fn from_env() -> Result<ChainConfig, ConfigError> {
    from_lookup(|key| std::env::var(key).ok())
}

/// Load configuration from an arbitrary key lookup.
pub fn from_lookup<F>(lookup: F) -> Result<ChainConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = ChainConfig::default();

    match lookup("forward").map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
        Some(raw) => config.forward.address = Some(normalize_forward_address(&raw)?),
        None => tracing::info!("No forward address provided, considering function as end of chain"),
    }

    if lookup("async").is_some_and(|v| v.to_uppercase() == "TRUE") {
        config.forward.asynchronous = true;
        if config.forwarding_enabled() {
            tracing::info!("Async flag is set, function won't wait for forward chain");
        } else {
            tracing::warn!("Async flag is set but there is no forward address; ignoring it");
        }
    }

    if let Some(mode) = lookup("input_mode") {
        config.intake.mode = match mode.trim().to_uppercase().as_str() {
            "POST" | "RAW" => InputMode::Raw,
            "FILE" | "UPLOAD" | "MULTIPART" => InputMode::File,
            _ => return Err(ConfigError::InvalidInputMode(mode)),
        };
    }

    if let Some(field) = lookup("form_field") {
        config.intake.field = non_empty(field, "form_field")?;
    }
    if let Some(field) = lookup("forward_field") {
        config.forward.field = non_empty(field, "forward_field")?;
    }

    if let Some(content_type) = lookup("content_type").filter(|v| !v.trim().is_empty()) {
        config.response_content_type = content_type.trim().to_string();
    }

    config.timeouts.read =
        parse_int_or_duration(&lookup("read_timeout").unwrap_or_default(), DEFAULT_TIMEOUT);
    config.timeouts.write =
        parse_int_or_duration(&lookup("write_timeout").unwrap_or_default(), DEFAULT_TIMEOUT);
    config.forward.timeout = lookup("forward_timeout").and_then(|v| optional_timeout(&v));

    if let Some(capacity) = lookup("queue_capacity") {
        config.forward.queue_capacity = match capacity.trim().parse::<usize>() {
            Ok(n) if n > 0 => n,
            _ => return Err(ConfigError::InvalidQueueCapacity(capacity)),
        };
    }

    Ok(config)
}

/// Turn `host:port` or a full URL into a normalized `http(s)://` URL string.
pub fn normalize_forward_address(raw: &str) -> Result<String, ConfigError> {
    let candidate = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("http://{raw}")
    };

    let invalid = |reason: String| ConfigError::InvalidForwardAddress {
        address: raw.to_string(),
        reason,
    };

    let url = Url::parse(&candidate).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(invalid("missing host".to_string()));
    }
    Ok(url.to_string())
}

fn non_empty(value: String, key: &'static str) -> Result<String, ConfigError> {
    let value = value.trim().to_string();
    if value.is_empty() {
        return Err(ConfigError::EmptyField(key));
    }
    Ok(value)
}

fn optional_timeout(value: &str) -> Option<Duration> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    let parsed = value
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
        .or_else(|| parse_duration(value));
    if parsed.is_none() {
        tracing::warn!(value = %value, "Ignoring unparseable forward_timeout");
    }
    parsed
}
