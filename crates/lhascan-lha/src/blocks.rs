//! Block and parameter-line definitions for the hierarchical input format.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Spacing rule applied when a grid range is expanded into a value list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Distribution {
    /// Evenly spaced values between start and end (inclusive).
    #[default]
    Linear,
    /// Evenly spaced exponents base 10 between start and end.
    Log10,
    /// Geometric progression from start to end.
    Geometric,
}

/// Value generator attached to a parameter line.
///
/// The variants mirror the keys accepted in scan configuration files; exactly
/// one of them is present per line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LineValue {
    /// Range descriptor `[start, end, count]` expanded by `distribution`.
    /// Bounds may be numeric literals or whitelisted math expressions.
    Grid {
        /// Range descriptor, `[start, end, count]`.
        scan: Vec<Value>,
        /// Spacing rule for the expansion.
        #[serde(default)]
        distribution: Distribution,
    },
    /// Explicit list of values to scan over.
    Explicit {
        /// The declared value list.
        values: Vec<Value>,
    },
    /// Uniform random draw from `[low, high)` per scan point.
    Random {
        /// Lower and upper draw bounds.
        random: [f64; 2],
    },
    /// Formula evaluated against the other parameters of each scan point.
    Dependent {
        /// Raw expression referencing other parameter names.
        dependent: String,
    },
    /// Value forwarded to the runner invocation instead of the input file.
    Argument {
        /// The forwarded value.
        argument: Value,
    },
    /// Fixed value written literally into the template.
    Constant {
        /// The literal value.
        value: Value,
    },
}

impl LineValue {
    /// True when the line's value is substituted per scan point and therefore
    /// rendered as a placeholder in the template.
    pub fn is_dynamic(&self) -> bool {
        matches!(
            self,
            LineValue::Grid { .. }
                | LineValue::Explicit { .. }
                | LineValue::Random { .. }
                | LineValue::Dependent { .. }
        )
    }
}

/// One parameter definition within a block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterLine {
    /// Position of the parameter within its block.
    pub id: Option<i64>,
    /// Symbolic name, unique across the whole parameter space.
    #[serde(default)]
    pub parameter: Option<String>,
    /// Free-form comment carried into the rendered line.
    #[serde(default)]
    pub comment: Option<String>,
    /// Value generator for the line.
    #[serde(flatten)]
    pub value: LineValue,
}

/// Named, ordered collection of parameter lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Block name; the namespace for the hierarchical document.
    pub block: String,
    /// Parameter lines in declaration order.
    #[serde(default)]
    pub lines: Vec<ParameterLine>,
}

/// Returns the template parameter name for a line, synthesizing
/// `<block>.<id>` when no symbolic name is declared.
pub fn placeholder_name(block: &str, line: &ParameterLine, id: i64) -> String {
    match &line.parameter {
        Some(name) => name.clone(),
        None => {
            let synthesized = format!("{block}.{id}");
            tracing::info!("using {synthesized} as template parameter");
            synthesized
        }
    }
}
