//! Chain propagation subsystem.
//!
//! # Data Flow
//! ```text
//! Sync mode:
//!     dispatch.rs (decode → handle)
//!     → forward.rs (multipart POST to next hop)
//!     → next hop's body relayed to the caller
//!
//! Async mode:
//!     dispatch.rs (decode → handle)
//!     → pending.rs (store output under request ID)
//!     → bounded mpsc queue (blocks when full)
//!     → worker.rs (single FIFO consumer)
//!     → forward.rs
//! ```
//!
//! # Design Decisions
//! - One outbound call per accepted request, inline or deferred
//! - A full queue is back-pressure onto the caller, not an error
//! - Async forward failures are logged and dropped

pub mod dispatch;
pub mod forward;
pub mod pending;
pub mod worker;

pub use dispatch::{DispatchError, Dispatcher, Reply};
pub use forward::{ForwardClient, ForwardError, Forwarded};
pub use pending::PendingStore;
pub use worker::AsyncForwarder;
