//! Logging setup for applications embedding the executor.
//!
//! The executor itself only emits `tracing` events and spans: one
//! `output` span per call carrying the run id, a debug event per executed
//! step, and a warning when execution stalls. This module installs a
//! subscriber to print them.
//!
//! # Configuration
//!
//! Logging format is controlled via `FRAMEGRAPH_LOG_FORMAT`:
//! - `json` - Structured JSON output
//! - `pretty` - Human-readable output (default for TTY)
//! - `compact` - Single-line output
//!
//! # Example
//!
//! ```no_run
//! use framegraph_executor::observability::{LogFormat, TracingConfig, init_tracing};
//!
//! let config = TracingConfig::builder()
//!     .log_format(LogFormat::Json)
//!     .log_filter("info,framegraph_executor=debug")
//!     .build();
//! let _guard = init_tracing(config)?;
//! # Ok::<(), anyhow::Error>(())
//! ```

mod config;
mod tracing_setup;

pub use config::{LogFormat, TracingConfig, TracingConfigBuilder};
pub use tracing_setup::{TracingGuard, init_tracing};
