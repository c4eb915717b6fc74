//! Serializable graph definitions.
//!
//! A [`GraphDefinition`] is the plain-data form of a [`Graph`]: it lists
//! declared variables and ops without the derived back-references. Op
//! outputs do not need to be declared as variables; they become `array`
//! variables automatically.
//!
//! # Example
//!
//! ```yaml
//! name: add_two
//! variables:
//!   - name: a
//!     kind: placeholder
//!   - name: b
//!     kind: placeholder
//! ops:
//!   - name: add
//!     kind:
//!       type: op
//!       op_type: add
//!     inputs: [a, b]
//!     outputs: [c]
//! ```
//!
//! [`Graph`]: super::Graph

use super::op::OpKind;
use super::variable::VariableKind;
use crate::error::{FrameGraphError, Result};
use serde::{Deserialize, Serialize};

/// A complete graph definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDefinition {
    /// Optional graph name, used in logs.
    #[serde(default)]
    pub name: Option<String>,

    /// Declared variables (constants, parameters, placeholders).
    #[serde(default)]
    pub variables: Vec<VariableDefinition>,

    /// Ops, in declaration order.
    #[serde(default)]
    pub ops: Vec<OpDefinition>,
}

/// A declared variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDefinition {
    /// Variable name.
    pub name: String,

    /// Variable kind.
    pub kind: VariableKind,

    /// Ops that must run before the variable is usable.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub control_deps: Vec<String>,
}

impl VariableDefinition {
    /// Create a variable definition without control dependencies.
    pub fn new(name: impl Into<String>, kind: VariableKind) -> Self {
        Self {
            name: name.into(),
            kind,
            control_deps: Vec::new(),
        }
    }
}

/// A declared op.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpDefinition {
    /// Op name.
    pub name: String,

    /// Op kind.
    pub kind: OpKind,

    /// Input variable names.
    #[serde(default)]
    pub inputs: Vec<String>,

    /// Output variable names.
    #[serde(default)]
    pub outputs: Vec<String>,

    /// Ops that must run first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub control_deps: Vec<String>,

    /// Variables that must be available first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub var_control_deps: Vec<String>,
}

impl OpDefinition {
    /// Create an op definition without control dependencies.
    pub fn new(
        name: impl Into<String>,
        kind: OpKind,
        inputs: &[&str],
        outputs: &[&str],
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            inputs: inputs.iter().map(|s| s.to_string()).collect(),
            outputs: outputs.iter().map(|s| s.to_string()).collect(),
            control_deps: Vec::new(),
            var_control_deps: Vec::new(),
        }
    }
}

impl GraphDefinition {
    /// Parse a definition from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| FrameGraphError::Serialization(e.to_string()))
    }

    /// Serialize the definition to YAML.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| FrameGraphError::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_minimal_yaml() {
        let yaml = r#"
name: add_two
variables:
  - name: a
    kind: placeholder
  - name: b
    kind: placeholder
ops:
  - name: add
    kind:
      type: op
      op_type: add
    inputs: [a, b]
    outputs: [c]
"#;
        let def = GraphDefinition::from_yaml(yaml).unwrap();
        assert_eq!(def.name.as_deref(), Some("add_two"));
        assert_eq!(def.variables.len(), 2);
        assert_eq!(def.ops[0].kind, OpKind::op("add"));
        assert_eq!(def.ops[0].outputs, vec!["c".to_string()]);
    }

    #[test]
    fn parse_control_flow_kinds() {
        let yaml = r#"
ops:
  - name: enter_n
    kind: { type: enter, frame_name: loop, is_constant: true }
    inputs: [n]
    outputs: [n_in]
  - name: enter_i
    kind: { type: enter, frame_name: loop }
    inputs: [i0]
    outputs: [i_in]
  - name: next
    kind: { type: next_iteration }
    inputs: [i_body]
    outputs: [i_next]
"#;
        let def = GraphDefinition::from_yaml(yaml).unwrap();
        assert_eq!(def.ops[0].kind, OpKind::enter("loop", true));
        assert_eq!(def.ops[1].kind, OpKind::enter("loop", false));
        assert_eq!(def.ops[2].kind, OpKind::NextIteration);
    }

    #[test]
    fn invalid_yaml_is_a_serialization_error() {
        let err = GraphDefinition::from_yaml("ops: [ { name: 3 ").unwrap_err();
        assert_eq!(err.code(), "E802");
    }
}
