//! Tracing subscriber setup.

use anyhow::{Context, Result};
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use super::{TracingConfig, config::LogFormat};

/// Guard returned by [`init_tracing`].
///
/// Keep it alive for as long as logging is needed.
#[derive(Debug)]
pub struct TracingGuard {
    format: LogFormat,
}

impl TracingGuard {
    /// Format the subscriber was installed with.
    pub fn format(&self) -> LogFormat {
        self.format
    }
}

/// Install a global tracing subscriber.
///
/// Fails if a global subscriber is already installed.
///
/// # Example
///
/// ```no_run
/// use framegraph_executor::observability::{TracingConfig, init_tracing};
///
/// let _guard = init_tracing(TracingConfig::from_env())?;
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn init_tracing(config: TracingConfig) -> Result<TracingGuard> {
    let filter = EnvFilter::try_new(config.log_filter()).unwrap_or_else(|_| EnvFilter::new("info"));
    let span_events = if config.span_close_events() {
        FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    match config.log_format() {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_file(config.include_location())
                        .with_line_number(config.include_location())
                        .with_target(config.include_target())
                        .with_span_events(span_events)
                        .flatten_event(true),
                )
                .try_init()
                .context("Failed to initialize tracing subscriber")?;
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .pretty()
                        .with_file(config.include_location())
                        .with_line_number(config.include_location())
                        .with_target(config.include_target())
                        .with_span_events(span_events),
                )
                .try_init()
                .context("Failed to initialize tracing subscriber")?;
        }
        LogFormat::Compact => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .compact()
                        .with_file(config.include_location())
                        .with_line_number(config.include_location())
                        .with_target(config.include_target())
                        .with_span_events(span_events),
                )
                .try_init()
                .context("Failed to initialize tracing subscriber")?;
        }
    }

    Ok(TracingGuard {
        format: config.log_format(),
    })
}
