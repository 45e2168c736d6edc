//! Readiness state machine.
//!
//! # States
//! ```text
//! Starting → Ready → Draining → Stopped
//! ```
//! - Starting → Ready: readiness marker written
//! - Ready → Draining: termination signal, before the listener stops accepting
//! - Draining → Stopped: in-flight work done or drain budget spent
//!
//! The health probe passes only while Ready and while the marker exists.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU8, Ordering};

use crate::lifecycle::startup::StartupError;

/// Lifecycle state of the instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LifecycleState {
    Starting = 0,
    Ready = 1,
    Draining = 2,
    Stopped = 3,
}

impl LifecycleState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Starting,
            1 => Self::Ready,
            2 => Self::Draining,
            _ => Self::Stopped,
        }
    }
}

/// Process-wide readiness shared by the health endpoint and the lifecycle.
#[derive(Debug)]
pub struct Readiness {
    state: AtomicU8,
    marker: PathBuf,
}

impl Readiness {
    pub fn new(marker: impl Into<PathBuf>) -> Self {
        Self {
            state: AtomicU8::new(LifecycleState::Starting as u8),
            marker: marker.into(),
        }
    }

    pub fn state(&self) -> LifecycleState {
        LifecycleState::from_u8(self.state.load(Ordering::SeqCst))
    }

    pub fn marker(&self) -> &Path {
        &self.marker
    }

    /// Write the zero-byte marker and start accepting.
    pub async fn mark_ready(&self) -> Result<(), StartupError> {
        tracing::info!(path = %self.marker.display(), "Writing readiness marker");
        tokio::fs::write(&self.marker, b"")
            .await
            .map_err(|source| StartupError::Marker {
                path: self.marker.clone(),
                source,
            })?;

        self.transition(LifecycleState::Starting, LifecycleState::Ready);
        Ok(())
    }

    /// Stop passing health probes. Called before the listener is stopped.
    pub fn begin_drain(&self) {
        self.transition(LifecycleState::Ready, LifecycleState::Draining);
    }

    pub fn mark_stopped(&self) {
        let previous = self.state.swap(LifecycleState::Stopped as u8, Ordering::SeqCst);
        tracing::debug!(from = ?LifecycleState::from_u8(previous), "Lifecycle stopped");
    }

    /// The readiness flag: true only while Ready.
    pub fn is_accepting(&self) -> bool {
        self.state() == LifecycleState::Ready
    }

    /// Health check outcome: accepting and the marker is present.
    pub fn is_healthy(&self) -> bool {
        self.is_accepting() && self.marker.exists()
    }

    fn transition(&self, from: LifecycleState, to: LifecycleState) {
        match self
            .state
            .compare_exchange(from as u8, to as u8, Ordering::SeqCst, Ordering::SeqCst)
        {
            Ok(_) => tracing::debug!(?from, ?to, "Lifecycle transition"),
            Err(actual) => tracing::warn!(
                expected = ?from,
                actual = ?LifecycleState::from_u8(actual),
                requested = ?to,
                "Ignoring lifecycle transition"
            ),
        }
    }
}
