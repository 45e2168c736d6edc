//! Intake decoder.
//!
//! Recovers `(RequestId, payload)` from an invocation request.
//!
//! - File mode: the body is a multipart form; the configured field's filename
//!   is the identifier and its content is the payload.
//! - Raw mode: the whole body is the payload and a fresh identifier is
//!   generated.
//!
//! Both modes are bounded by the configured body ceiling and read timeout.

use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::extract::{FromRequest, Multipart, Request};
use thiserror::Error;

use crate::config::{InputMode, IntakeConfig};
use crate::http::request::RequestId;

/// Failure to recover an identifier and payload from a request.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The form could not be parsed or does not carry the expected file field.
    #[error("malformed multipart request: {0}")]
    MalformedMultipart(String),

    /// Reading the body failed partway (disconnect, timeout, size ceiling).
    #[error("failed to read request body: {0}")]
    ReadFailure(String),
}

/// A decoded invocation.
#[derive(Debug)]
pub struct Intake {
    pub request_id: RequestId,
    pub payload: Bytes,
}

/// Decodes invocation requests according to the configured input mode.
#[derive(Debug, Clone)]
pub struct IntakeDecoder {
    config: IntakeConfig,
    read_timeout: Option<Duration>,
}

impl IntakeDecoder {
    /// `read_timeout` of `None` leaves body reads unbounded.
    pub fn new(config: IntakeConfig, read_timeout: Option<Duration>) -> Self {
        Self {
            config,
            read_timeout,
        }
    }

    pub fn mode(&self) -> InputMode {
        self.config.mode
    }

    /// Consume the request body and produce the identifier and payload.
    pub async fn decode(&self, request: Request) -> Result<Intake, DecodeError> {
        let decoding = async {
            match self.config.mode {
                InputMode::File => self.decode_upload(request).await,
                InputMode::Raw => self.decode_raw(request.into_body()).await,
            }
        };

        let Some(limit) = self.read_timeout else {
            return decoding.await;
        };
        tokio::time::timeout(limit, decoding)
            .await
            .map_err(|_| DecodeError::ReadFailure(format!("read timeout of {limit:?} elapsed")))?
    }

    async fn decode_upload(&self, request: Request) -> Result<Intake, DecodeError> {
        let mut multipart = Multipart::from_request(request, &())
            .await
            .map_err(|e| DecodeError::MalformedMultipart(e.body_text()))?;

        loop {
            let field = multipart
                .next_field()
                .await
                .map_err(|e| DecodeError::MalformedMultipart(e.body_text()))?
                .ok_or_else(|| {
                    DecodeError::MalformedMultipart(format!(
                        "no file field named '{}'",
                        self.config.field
                    ))
                })?;

            if field.name() != Some(self.config.field.as_str()) {
                continue;
            }

            let request_id = match field.file_name() {
                Some(name) if !name.is_empty() => RequestId::from_upstream(name),
                _ => {
                    return Err(DecodeError::MalformedMultipart(format!(
                        "field '{}' has no filename",
                        self.config.field
                    )))
                }
            };

            let payload = field.bytes().await.map_err(|e| {
                DecodeError::ReadFailure(format!(
                    "failed to read forwarded request with ID '{}': {}",
                    request_id,
                    e.body_text()
                ))
            })?;

            tracing::info!(
                request_id = %request_id,
                size = payload.len(),
                "Received forwarded request"
            );
            return Ok(Intake {
                request_id,
                payload,
            });
        }
    }

    async fn decode_raw(&self, body: Body) -> Result<Intake, DecodeError> {
        let request_id = RequestId::generate();
        tracing::info!(request_id = %request_id, "Received fresh request, generated request ID");

        let payload = axum::body::to_bytes(body, self.config.max_body_bytes)
            .await
            .map_err(|e| {
                DecodeError::ReadFailure(format!(
                    "failed to read request '{}': {}",
                    request_id, e
                ))
            })?;

        Ok(Intake {
            request_id,
            payload,
        })
    }
}
