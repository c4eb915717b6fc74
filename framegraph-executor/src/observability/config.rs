//! Logging configuration.

use std::env;
use std::io::IsTerminal;
use std::str::FromStr;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per event.
    Json,
    /// Multi-line human-readable output.
    Pretty,
    /// Single-line output.
    #[default]
    Compact,
}

impl FromStr for LogFormat {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "json" => Self::Json,
            "pretty" => Self::Pretty,
            "compact" => Self::Compact,
            _ => Self::default(),
        })
    }
}

/// Configuration for the tracing subscriber.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    log_format: LogFormat,
    /// Filter directives, e.g. "info" or "warn,framegraph_executor=debug".
    log_filter: String,
    include_location: bool,
    include_target: bool,
    /// Emit an event when each `output` span closes (with its duration).
    span_close_events: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::default(),
            log_filter: "info".to_string(),
            include_location: false,
            include_target: true,
            span_close_events: false,
        }
    }
}

impl TracingConfig {
    /// Create a new builder.
    pub fn builder() -> TracingConfigBuilder {
        TracingConfigBuilder::default()
    }

    /// Create configuration from environment variables.
    ///
    /// Environment variables:
    /// - `FRAMEGRAPH_LOG_FORMAT`: "json", "pretty", or "compact"
    ///   (defaults to pretty on a terminal, json otherwise)
    /// - `FRAMEGRAPH_LOG_LEVEL` or `RUST_LOG`: filter directives
    /// - `FRAMEGRAPH_LOG_LOCATION`: "true" to include file and line
    /// - `FRAMEGRAPH_LOG_SPANS`: "true" to log span close events
    pub fn from_env() -> Self {
        let log_format = env::var("FRAMEGRAPH_LOG_FORMAT")
            .ok()
            .and_then(|s| s.parse::<LogFormat>().ok())
            .unwrap_or_else(|| {
                if std::io::stdout().is_terminal() {
                    LogFormat::Pretty
                } else {
                    LogFormat::Json
                }
            });

        let log_filter = env::var("FRAMEGRAPH_LOG_LEVEL")
            .or_else(|_| env::var("RUST_LOG"))
            .unwrap_or_else(|_| "info".to_string());

        Self {
            log_format,
            log_filter,
            include_location: env_flag("FRAMEGRAPH_LOG_LOCATION"),
            include_target: true,
            span_close_events: env_flag("FRAMEGRAPH_LOG_SPANS"),
        }
    }

    /// Get the log format.
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Get the filter directives.
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Check if source location should be included.
    pub fn include_location(&self) -> bool {
        self.include_location
    }

    /// Check if the event target should be included.
    pub fn include_target(&self) -> bool {
        self.include_target
    }

    /// Check if span close events should be logged.
    pub fn span_close_events(&self) -> bool {
        self.span_close_events
    }
}

fn env_flag(name: &str) -> bool {
    env::var(name)
        .map(|s| s.eq_ignore_ascii_case("true") || s == "1")
        .unwrap_or(false)
}

/// Builder for TracingConfig.
#[derive(Debug, Clone, Default)]
pub struct TracingConfigBuilder {
    log_format: Option<LogFormat>,
    log_filter: Option<String>,
    include_location: Option<bool>,
    include_target: Option<bool>,
    span_close_events: Option<bool>,
}

impl TracingConfigBuilder {
    /// Set the log format.
    pub fn log_format(mut self, format: LogFormat) -> Self {
        self.log_format = Some(format);
        self
    }

    /// Set the filter directives.
    pub fn log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = Some(filter.into());
        self
    }

    /// Include source location in logs.
    pub fn include_location(mut self, include: bool) -> Self {
        self.include_location = Some(include);
        self
    }

    /// Include the event target in logs.
    pub fn include_target(mut self, include: bool) -> Self {
        self.include_target = Some(include);
        self
    }

    /// Log span close events.
    pub fn span_close_events(mut self, enable: bool) -> Self {
        self.span_close_events = Some(enable);
        self
    }

    /// Build the configuration.
    pub fn build(self) -> TracingConfig {
        let defaults = TracingConfig::default();
        TracingConfig {
            log_format: self.log_format.unwrap_or(defaults.log_format),
            log_filter: self.log_filter.unwrap_or(defaults.log_filter),
            include_location: self.include_location.unwrap_or(defaults.include_location),
            include_target: self.include_target.unwrap_or(defaults.include_target),
            span_close_events: self
                .span_close_events
                .unwrap_or(defaults.span_close_events),
        }
    }
}
