//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     Load config → Build dispatcher → Bind listener
//!     → readiness.rs writes marker (Starting → Ready)
//!     → spawn async forwarder (async mode only)
//!
//! Shutdown (signals.rs → shutdown.rs):
//!     SIGTERM → Draining (health fails) → stop accepting
//!     → in-flight requests finish → queued forwards drain → Stopped
//! ```
//!
//! # Design Decisions
//! - Health fails before the listener stops, so orchestrators stop routing first
//! - Shutdown has a deadline: the write timeout doubles as the drain budget
//! - In-flight work is never cancelled explicitly; it is abandoned at the deadline

pub mod readiness;
pub mod shutdown;
pub mod signals;
pub mod startup;

pub use readiness::{LifecycleState, Readiness};
pub use shutdown::Shutdown;
pub use startup::StartupError;
