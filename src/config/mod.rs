//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! process environment
//!     → loader.rs (read keys, parse values)
//!     → duration.rs (integer-seconds-or-duration values)
//!     → loader.rs (semantic checks)
//!     → ChainConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is loaded once before the listener starts; there is no reload
//! - All fields have defaults so an empty environment is a valid terminal hop
//! - Unparseable timeouts fall back to a default instead of failing startup

pub mod duration;
pub mod loader;
pub mod schema;

pub use loader::{from_env, from_lookup, ConfigError};
pub use schema::{ChainConfig, ForwardConfig, InputMode, IntakeConfig, TimeoutConfig};
