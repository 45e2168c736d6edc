//! Observability subsystem.
//!
//! Logging only: every subsystem emits structured `tracing` events keyed by
//! `request_id`, and logging.rs renders them as lines on stdout.

pub mod logging;
