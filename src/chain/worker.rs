//! Async forwarder.
//!
//! A single long-lived task draining the work queue in FIFO order. Each
//! identifier's pending output is taken from the store and forwarded once;
//! failures are logged and dropped (at-most-once delivery).
//!
//! The loop ends when every queue sender is gone (the server has drained) or
//! when the stop signal fires (the drain budget ran out).

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};

use crate::chain::forward::ForwardClient;
use crate::chain::pending::PendingStore;
use crate::http::request::RequestId;

pub struct AsyncForwarder {
    queue: mpsc::Receiver<RequestId>,
    pending: Arc<PendingStore>,
    client: ForwardClient,
}

impl AsyncForwarder {
    pub fn new(queue: mpsc::Receiver<RequestId>, pending: Arc<PendingStore>, client: ForwardClient) -> Self {
        Self {
            queue,
            pending,
            client,
        }
    }

    pub async fn run(mut self, mut stop: broadcast::Receiver<()>) {
        tracing::info!(target = %self.client.target(), "Async forwarder started");

        loop {
            let request_id = tokio::select! {
                biased;
                _ = stop.recv() => {
                    tracing::warn!(
                        abandoned = self.pending.len(),
                        "Async forwarder stopped before the queue drained"
                    );
                    break;
                }
                next = self.queue.recv() => match next {
                    Some(id) => id,
                    None => {
                        tracing::info!("Work queue closed, async forwarder exiting");
                        break;
                    }
                },
            };

            self.forward_one(request_id).await;
        }
    }

    async fn forward_one(&self, request_id: RequestId) {
        tracing::info!(request_id = %request_id, "New request received from queue");

        let Some(output) = self.pending.take(&request_id) else {
            tracing::warn!(request_id = %request_id, "No pending output for queued request");
            return;
        };

        match self.client.forward(&request_id, output).await {
            Ok(forwarded) => tracing::debug!(
                request_id = %request_id,
                status = %forwarded.status,
                "Forwarded queued request"
            ),
            Err(e) => tracing::error!(
                request_id = %request_id,
                target = %self.client.target(),
                error = %e,
                "Failed to forward queued request"
            ),
        }
    }
}
