//! Handler adapter.
//!
//! Wraps the external function body. It takes raw input bytes and returns raw
//! output bytes or an error; it holds no state of its own.

pub mod handler;

pub use handler::{invoke, Handler, HandlerError};
