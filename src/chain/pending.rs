//! Pending response entries for the asynchronous path.
//!
//! The dispatcher stores the handler's output here before enqueueing the
//! identifier; the async forwarder takes it back out exactly once.

use axum::body::Bytes;
use dashmap::DashMap;

use crate::http::request::RequestId;

/// Concurrent map from request identifier to handler output.
#[derive(Debug, Default)]
pub struct PendingStore {
    inner: DashMap<RequestId, Bytes>,
}

impl PendingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store output for `id`. Returns the entry it replaced, if any.
    pub fn insert(&self, id: RequestId, output: Bytes) -> Option<Bytes> {
        self.inner.insert(id, output)
    }

    /// Remove and return the entry for `id`. A second call returns `None`.
    pub fn take(&self, id: &RequestId) -> Option<Bytes> {
        self.inner.remove(id).map(|(_, output)| output)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
