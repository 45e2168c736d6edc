//! Request-chaining front end for a single serverless function.
//!
//! Accepts one payload over HTTP, runs a user-supplied [`Handler`] on it, and
//! propagates the output to the next function in a linear chain, either
//! inline (sync) or through a bounded queue drained by a background worker
//! (async). Also serves a readiness probe and drains gracefully on SIGTERM.

pub mod chain;
pub mod config;
pub mod function;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::ChainConfig;
pub use function::{Handler, HandlerError};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
