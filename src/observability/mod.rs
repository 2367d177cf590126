//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters and histograms via the metrics facade)
//! ```
//!
//! # Design Decisions
//! - Structured fields (tx_hash, nonce, gas) instead of formatted strings
//! - Private keys never reach a log line

pub mod logging;
pub mod metrics;
