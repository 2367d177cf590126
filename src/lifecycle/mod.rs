//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     trigger → every pending receipt wait returns Cancelled
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
