//! Dispatch core.
//!
//! Per-request pipeline:
//! ```text
//! Received → Decoded → Handled → ForwardedSync | Enqueued | Failed
//! ```
//! - Decode and handle always run in order on the request's own task
//! - Sync: forward inline, relay the next hop's body and content type
//! - Async: reserve a queue slot, store the output, push the identifier
//! - End of chain: return the handler's output directly
//!
//! Any failure ends the request with a single 500 carrying the error text.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::Request;
use thiserror::Error;
use tokio::sync::mpsc;
use url::Url;

use crate::chain::forward::{ForwardClient, ForwardError};
use crate::chain::pending::PendingStore;
use crate::chain::worker::AsyncForwarder;
use crate::config::loader::normalize_forward_address;
use crate::config::{ChainConfig, ConfigError};
use crate::function::{self, Handler, HandlerError};
use crate::http::intake::{DecodeError, Intake, IntakeDecoder};
use crate::http::request::RequestId;
use crate::lifecycle::StartupError;

/// Terminal failure of a single invocation.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Handler(#[from] HandlerError),

    #[error("failed to forward request '{request_id}': {source}")]
    Forward {
        request_id: RequestId,
        #[source]
        source: ForwardError,
    },

    #[error("work queue closed, request '{0}' was not enqueued")]
    QueueClosed(RequestId),

    #[error("request did not complete within the {0:?} write timeout")]
    TimedOut(Duration),
}

/// Successful outcome of an invocation.
#[derive(Debug)]
pub enum Reply {
    /// Bytes to hand back: the handler's output at the end of the chain, or
    /// the next hop's reply on the synchronous path.
    Body {
        request_id: RequestId,
        content_type: String,
        body: Bytes,
    },
    /// Output queued for the async forwarder; nothing to relay.
    Accepted { request_id: RequestId },
}

/// What happens to handler output once produced.
#[derive(Debug)]
enum Route {
    Terminal,
    Sync(ForwardClient),
    Async {
        pending: Arc<PendingStore>,
        queue: mpsc::Sender<RequestId>,
    },
}

pub struct Dispatcher {
    intake: IntakeDecoder,
    handler: Arc<dyn Handler>,
    route: Route,
    content_type: String,
}

impl Dispatcher {
    /// Build the dispatcher for `config`. In async mode the matching
    /// forwarder is returned alongside; the caller spawns it.
    pub fn new(
        config: &ChainConfig,
        handler: Arc<dyn Handler>,
    ) -> Result<(Self, Option<AsyncForwarder>), StartupError> {
        let intake = IntakeDecoder::new(config.intake.clone(), config.timeouts.read_limit());

        let mut forwarder = None;
        let route = match &config.forward.address {
            None => Route::Terminal,
            Some(address) => {
                let client = ForwardClient::new(
                    parse_target(address)?,
                    config.forward.field.clone(),
                    config.forward.timeout,
                )?;

                if config.forward.asynchronous {
                    let (queue, rx) = mpsc::channel(config.forward.queue_capacity.max(1));
                    let pending = Arc::new(PendingStore::new());
                    forwarder = Some(AsyncForwarder::new(rx, pending.clone(), client));
                    Route::Async { pending, queue }
                } else {
                    Route::Sync(client)
                }
            }
        };

        let dispatcher = Self {
            intake,
            handler,
            route,
            content_type: config.response_content_type.clone(),
        };
        Ok((dispatcher, forwarder))
    }

    /// Outstanding async entries, if this instance forwards asynchronously.
    pub fn pending(&self) -> Option<Arc<PendingStore>> {
        match &self.route {
            Route::Async { pending, .. } => Some(pending.clone()),
            _ => None,
        }
    }

    /// Run one invocation through decode, handle and forward.
    pub async fn dispatch(&self, request: Request) -> Result<Reply, DispatchError> {
        let Intake {
            request_id,
            payload,
        } = self.intake.decode(request).await?;

        let output = function::invoke(self.handler.clone(), payload)
            .await
            .inspect_err(|e| {
                tracing::warn!(request_id = %request_id, error = %e, "Handler failed");
            })?;

        match &self.route {
            Route::Terminal => Ok(Reply::Body {
                request_id,
                content_type: self.content_type.clone(),
                body: output,
            }),
            Route::Sync(client) => {
                let forwarded = match client.forward(&request_id, output).await {
                    Ok(forwarded) => forwarded,
                    Err(source) => {
                        tracing::error!(
                            request_id = %request_id,
                            target = %client.target(),
                            error = %source,
                            "Failed to forward request"
                        );
                        return Err(DispatchError::Forward { request_id, source });
                    }
                };
                Ok(Reply::Body {
                    request_id,
                    content_type: forwarded
                        .content_type
                        .unwrap_or_else(|| self.content_type.clone()),
                    body: forwarded.body,
                })
            }
            Route::Async { pending, queue } => {
                // Blocks while the queue is full. Nothing is stored until a
                // slot is held, so an abandoned request leaves no entry.
                let Ok(permit) = queue.reserve().await else {
                    return Err(DispatchError::QueueClosed(request_id));
                };
                if pending.insert(request_id.clone(), output).is_some() {
                    tracing::warn!(request_id = %request_id, "Replaced pending output for duplicate request ID");
                }
                permit.send(request_id.clone());
                tracing::debug!(request_id = %request_id, "Request enqueued for async forward");
                Ok(Reply::Accepted { request_id })
            }
        }
    }
}

fn parse_target(address: &str) -> Result<Url, ConfigError> {
    let normalized = normalize_forward_address(address)?;
    Url::parse(&normalized).map_err(|e| ConfigError::InvalidForwardAddress {
        address: address.to_string(),
        reason: e.to_string(),
    })
}
