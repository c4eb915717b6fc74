//! Session configuration.

use framegraph_core::error::{FrameGraphError, Result};
use std::env;
use std::str::FromStr;

/// Configuration for a [`Session`](super::Session).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// How many missing variable names a scheduling-stall error lists.
    pub max_missing_reported: usize,
    /// Prefer ready steps in the frame/iteration of the previous step.
    ///
    /// Keeps a loop iteration together instead of interleaving frames.
    pub prefer_current_frame: bool,
    /// Abort after this many steps. `None` means unlimited.
    pub max_steps: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_missing_reported: 10,
            prefer_current_frame: true,
            max_steps: None,
        }
    }
}

impl SessionConfig {
    /// Set how many missing names are reported on a stall.
    pub fn with_max_missing_reported(mut self, n: usize) -> Self {
        self.max_missing_reported = n;
        self
    }

    /// Enable or disable current-frame preference.
    pub fn with_prefer_current_frame(mut self, prefer: bool) -> Self {
        self.prefer_current_frame = prefer;
        self
    }

    /// Limit the number of steps per call.
    pub fn with_max_steps(mut self, limit: u64) -> Self {
        self.max_steps = Some(limit);
        self
    }

    /// Create configuration from environment variables.
    ///
    /// Environment variables:
    /// - `FRAMEGRAPH_MAX_MISSING_REPORTED`: number of names listed on stall
    /// - `FRAMEGRAPH_PREFER_CURRENT_FRAME`: "true"/"1" or "false"/"0"
    /// - `FRAMEGRAPH_MAX_STEPS`: step limit per call
    ///
    /// Unset variables keep their defaults.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Some(n) = parse_var::<usize>("FRAMEGRAPH_MAX_MISSING_REPORTED")? {
            config.max_missing_reported = n;
        }
        if let Ok(raw) = env::var("FRAMEGRAPH_PREFER_CURRENT_FRAME") {
            config.prefer_current_frame = parse_bool("FRAMEGRAPH_PREFER_CURRENT_FRAME", &raw)?;
        }
        if let Some(limit) = parse_var::<u64>("FRAMEGRAPH_MAX_STEPS")? {
            config.max_steps = Some(limit);
        }

        Ok(config)
    }
}

fn parse_var<T: FromStr>(name: &str) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| FrameGraphError::ConfigValue {
                field: name.to_string(),
                cause: format!("'{}': {}", raw, e),
            }),
        Err(_) => Ok(None),
    }
}

fn parse_bool(name: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other => Err(FrameGraphError::ConfigValue {
            field: name.to_string(),
            cause: format!("expected true/false, got '{}'", other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.max_missing_reported, 10);
        assert!(config.prefer_current_frame);
        assert_eq!(config.max_steps, None);
    }

    #[test]
    fn builder_setters() {
        let config = SessionConfig::default()
            .with_max_missing_reported(3)
            .with_prefer_current_frame(false)
            .with_max_steps(500);
        assert_eq!(config.max_missing_reported, 3);
        assert!(!config.prefer_current_frame);
        assert_eq!(config.max_steps, Some(500));
    }

    #[test]
    fn bool_parsing() {
        assert!(parse_bool("X", "TRUE").unwrap());
        assert!(!parse_bool("X", "0").unwrap());
        let err = parse_bool("X", "maybe").unwrap_err();
        assert_eq!(err.code(), "E801");
    }
}
