//! Function handler trait and error type.

use axum::body::Bytes;
use thiserror::Error;

/// A user-supplied function body: raw input bytes in, raw output bytes out.
///
/// The handler is treated as opaque and potentially slow. It runs on the
/// blocking thread pool, so implementations may perform blocking I/O.
pub trait Handler: Send + Sync + 'static {
    fn handle(&self, input: &[u8]) -> Result<Vec<u8>, HandlerError>;
}

impl<F> Handler for F
where
    F: Fn(&[u8]) -> Result<Vec<u8>, HandlerError> + Send + Sync + 'static,
{
    fn handle(&self, input: &[u8]) -> Result<Vec<u8>, HandlerError> {
        self(input)
    }
}

/// Error returned by a handler. Its message reaches the caller verbatim.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct HandlerError {
    message: String,
}

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<String> for HandlerError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for HandlerError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// Run the handler on the blocking pool.
///
/// A panic inside the handler is reported as a `HandlerError`.
pub async fn invoke(
    handler: std::sync::Arc<dyn Handler>,
    payload: Bytes,
) -> Result<Bytes, HandlerError> {
    let joined = tokio::task::spawn_blocking(move || handler.handle(&payload)).await;
    match joined {
        Ok(result) => result.map(Bytes::from),
        Err(e) => Err(HandlerError::new(format!("handler did not complete: {e}"))),
    }
}
