//! Error types for framegraph.
//!
//! Errors carry the identifiers needed to debug a stalled or failing
//! execution: variable names, op names and the frame/iteration in which the
//! failure happened. Every variant has a stable code (e.g. `E301`) that is
//! also the prefix of its display message.

use thiserror::Error;

/// The main error type for framegraph operations.
#[derive(Error, Debug)]
pub enum FrameGraphError {
    // =========================================================================
    // Request Validation Errors (E100-E199)
    // =========================================================================
    /// Neither outputs nor required activations were requested.
    #[error("E101: No outputs or required activations were requested")]
    EmptyRequest,

    /// A requested name does not exist in the graph.
    #[error("E102: Variable '{name}' does not exist in the graph")]
    UnknownVariable {
        /// The requested variable name.
        name: String,
    },

    /// A placeholder needed by the requested outputs has no value.
    #[error(
        "E103: Placeholder '{name}' is required to calculate the requested outputs, but no value was provided"
    )]
    MissingPlaceholder {
        /// The placeholder variable name.
        name: String,
    },

    // =========================================================================
    // Graph Structure Errors (E200-E299)
    // =========================================================================
    /// The graph structure is inconsistent.
    #[error("E201: Invalid graph: {cause}")]
    InvalidGraph {
        /// Description of the structural problem.
        cause: String,
    },

    /// An op referenced by name does not exist.
    #[error("E202: Op '{name}' does not exist in the graph")]
    UnknownOp {
        /// The op name.
        name: String,
    },

    /// Two ops or two variables share a name.
    #[error("E203: Duplicate {entity} name '{name}'")]
    DuplicateName {
        /// What was duplicated ("op" or "variable").
        entity: &'static str,
        /// The duplicated name.
        name: String,
    },

    /// A control-flow op is wired incorrectly.
    #[error("E204: Invalid control-flow op '{op}': {cause}")]
    InvalidControlFlow {
        /// The op name.
        op: String,
        /// Description of the wiring problem.
        cause: String,
    },

    // =========================================================================
    // Scheduling Errors (E300-E399)
    // =========================================================================
    /// No step is runnable but required outputs are still missing.
    #[error(
        "E301: No steps are available for execution at step {step}: {remaining} required variables are still missing: {missing:?}"
    )]
    SchedulingStall {
        /// Number of steps executed before the stall.
        step: u64,
        /// Number of required variables not yet produced.
        remaining: usize,
        /// Up to a configured number of missing variable names.
        missing: Vec<String>,
    },

    /// Execution ran for more steps than the configured limit.
    #[error("E302: Step limit of {limit} exceeded with {remaining} required variables missing")]
    StepLimitExceeded {
        /// The configured limit.
        limit: u64,
        /// Number of required variables not yet produced.
        remaining: usize,
    },

    // =========================================================================
    // Internal Invariant Errors (E400-E499)
    // =========================================================================
    /// A Switch op did not produce exactly one output.
    #[error("E401: Switch op '{op}' must produce exactly one output, got {present}")]
    SwitchInvariant {
        /// The switch op name.
        op: String,
        /// Number of non-null outputs produced.
        present: usize,
    },

    /// A value was computed twice for the same variable/frame/iteration.
    #[error("E402: Value for '{var_id}' was already computed")]
    DuplicateValue {
        /// Display form of the variable identity.
        var_id: String,
    },

    /// A step that already ran acquired a dependency that is not satisfied.
    #[error("E403: Step {step} was already processed but gained unsatisfied dependency {dependency}")]
    DependencyRetracted {
        /// Display form of the processed step.
        step: String,
        /// Display form of the unsatisfied dependency.
        dependency: String,
    },

    /// An op handler returned the wrong number of outputs.
    #[error("E404: Op '{op}' declares {expected} outputs but the handler returned {actual}")]
    OutputArity {
        /// The op name.
        op: String,
        /// Number of declared outputs.
        expected: usize,
        /// Number of returned outputs.
        actual: usize,
    },

    /// Any other broken internal invariant.
    #[error("E405: Internal error: {cause}")]
    Internal {
        /// Description of the broken invariant.
        cause: String,
    },

    // =========================================================================
    // Op Execution Errors (E500-E599)
    // =========================================================================
    /// The op handler failed to execute an op.
    #[error("E501: Op '{op}' failed: {cause}")]
    OpExecution {
        /// The op name.
        op: String,
        /// Reason for the failure.
        cause: String,
    },

    // =========================================================================
    // Configuration Errors (E800-E899)
    // =========================================================================
    /// Invalid configuration value.
    #[error("E801: Invalid configuration '{field}': {cause}")]
    ConfigValue {
        /// The configuration field with invalid value.
        field: String,
        /// Description of why the value is invalid.
        cause: String,
    },

    /// Serialization/deserialization error.
    #[error("E802: Serialization error: {0}")]
    Serialization(
        /// The serialization error message.
        String,
    ),
}

impl FrameGraphError {
    /// Get the error code (e.g., "E301").
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyRequest => "E101",
            Self::UnknownVariable { .. } => "E102",
            Self::MissingPlaceholder { .. } => "E103",
            Self::InvalidGraph { .. } => "E201",
            Self::UnknownOp { .. } => "E202",
            Self::DuplicateName { .. } => "E203",
            Self::InvalidControlFlow { .. } => "E204",
            Self::SchedulingStall { .. } => "E301",
            Self::StepLimitExceeded { .. } => "E302",
            Self::SwitchInvariant { .. } => "E401",
            Self::DuplicateValue { .. } => "E402",
            Self::DependencyRetracted { .. } => "E403",
            Self::OutputArity { .. } => "E404",
            Self::Internal { .. } => "E405",
            Self::OpExecution { .. } => "E501",
            Self::ConfigValue { .. } => "E801",
            Self::Serialization(_) => "E802",
        }
    }

    /// Check if this error was raised by request or graph validation,
    /// before any op executed.
    #[must_use]
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            Self::EmptyRequest
                | Self::UnknownVariable { .. }
                | Self::MissingPlaceholder { .. }
                | Self::InvalidGraph { .. }
                | Self::UnknownOp { .. }
                | Self::DuplicateName { .. }
                | Self::InvalidControlFlow { .. }
        )
    }

    /// Check if this error indicates a broken engine or handler invariant.
    #[must_use]
    pub fn is_internal_error(&self) -> bool {
        matches!(
            self,
            Self::SwitchInvariant { .. }
                | Self::DuplicateValue { .. }
                | Self::DependencyRetracted { .. }
                | Self::OutputArity { .. }
                | Self::Internal { .. }
        )
    }

    /// Shorthand for an [`FrameGraphError::OpExecution`] error.
    pub fn op_failed(op: impl Into<String>, cause: impl Into<String>) -> Self {
        Self::OpExecution {
            op: op.into(),
            cause: cause.into(),
        }
    }

    /// Shorthand for an [`FrameGraphError::Internal`] error.
    pub fn internal(cause: impl Into<String>) -> Self {
        Self::Internal {
            cause: cause.into(),
        }
    }
}

/// Result type alias using `FrameGraphError`.
pub type Result<T> = std::result::Result<T, FrameGraphError>;

/// Extension trait for adding op context to foreign errors.
pub trait ResultExt<T> {
    /// Convert the error into an [`FrameGraphError::OpExecution`] for `op`.
    fn with_op(self, op: &str) -> Result<T>;
}

impl<T, E: std::fmt::Display> ResultExt<T> for std::result::Result<T, E> {
    fn with_op(self, op: &str) -> Result<T> {
        self.map_err(|e| FrameGraphError::OpExecution {
            op: op.to_string(),
            cause: e.to_string(),
        })
    }
}
