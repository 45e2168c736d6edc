//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, body limit, write timeout)
//!     → intake.rs (multipart upload or raw body → request ID + payload)
//!     → [chain dispatch: handler, then forward or enqueue]
//!     → response.rs (bytes + content type, or 500 with error text)
//!     → Send to client
//!
//! health.rs answers readiness probes from the lifecycle state.
//! ```

pub mod health;
pub mod intake;
pub mod request;
pub mod response;
pub mod server;

pub use intake::{DecodeError, IntakeDecoder};
pub use request::{RequestId, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
