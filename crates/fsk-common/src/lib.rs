//! Shared configuration, error types, IDs, and observability primitives for
//! FlashSink crates.
//!
//! Architecture role:
//! - defines session-wide write settings passed across layers
//! - provides common [`FskError`] / [`Result`] contracts
//! - hosts typed write-option values and write-path metrics
//!
//! Key modules:
//! - [`config`]
//! - [`error`]
//! - [`ids`]
//! - [`options`]
//! - [`metrics`]

pub mod config;
pub mod error;
pub mod ids;
pub mod metrics;
pub mod options;

pub use config::WriteSessionConfig;
pub use error::{FskError, Result};
pub use ids::*;
pub use metrics::MetricsRegistry;
pub use options::{CompressionCodec, SummaryLevel, TimestampPrecision};
