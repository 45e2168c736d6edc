//! Forward client.
//!
//! Packages a payload as a single-field multipart upload and POSTs it to the
//! next hop. The request identifier travels as the upload's filename, which
//! is where the next instance's intake decoder recovers it.
//!
//! One attempt per call: no retry, no backoff.

use std::time::Duration;

use axum::body::Bytes;
use axum::http::{header::CONTENT_TYPE, StatusCode};
use reqwest::multipart::{Form, Part};
use thiserror::Error;
use url::Url;

use crate::http::request::RequestId;

/// Failure of a single forward attempt.
#[derive(Debug, Error)]
pub enum ForwardError {
    /// The next hop answered with a non-success status.
    #[error("bad status: {status}")]
    BadUpstreamStatus { status: StatusCode },

    /// The request never completed (refused, reset, timed out, DNS).
    #[error("transport failure: {0}")]
    Transport(#[source] reqwest::Error),

    /// The outbound client could not be constructed.
    #[error("failed to build forward client: {0}")]
    Client(#[source] reqwest::Error),
}

/// The next hop's reply, relayed to the caller on the synchronous path.
#[derive(Debug, Clone)]
pub struct Forwarded {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: Bytes,
}

/// HTTP client bound to a single next-hop address.
#[derive(Debug, Clone)]
pub struct ForwardClient {
    client: reqwest::Client,
    target: Url,
    field: String,
}

impl ForwardClient {
    /// Create a client for `target`, uploading under form field `field`.
    pub fn new(target: Url, field: impl Into<String>, timeout: Option<Duration>) -> Result<Self, ForwardError> {
        let mut builder = reqwest::Client::builder().no_proxy();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(ForwardError::Client)?;

        Ok(Self {
            client,
            target,
            field: field.into(),
        })
    }

    pub fn target(&self) -> &Url {
        &self.target
    }

    /// POST `payload` to the next hop under `request_id`.
    pub async fn forward(&self, request_id: &RequestId, payload: Bytes) -> Result<Forwarded, ForwardError> {
        let part = Part::bytes(payload.to_vec()).file_name(request_id.to_string());
        let form = Form::new().part(self.field.clone(), part);

        tracing::debug!(
            request_id = %request_id,
            target = %self.target,
            size = payload.len(),
            "Forwarding request"
        );

        let response = self
            .client
            .post(self.target.clone())
            .multipart(form)
            .send()
            .await
            .map_err(ForwardError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ForwardError::BadUpstreamStatus { status });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await.map_err(ForwardError::Transport)?;

        Ok(Forwarded {
            status,
            content_type,
            body,
        })
    }
}
