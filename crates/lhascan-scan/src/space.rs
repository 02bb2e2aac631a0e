//! Parameter-space construction: grid expansion and random draws.

use lhascan_core::{ErrorInfo, RngHandle, ScanError};
use lhascan_lha::{Distribution, LineValue};
use serde_json::{Number, Value};

use crate::config::ScanConfig;
use crate::expr::{eval_number, EmptyScope};
use crate::resolve::{resolve, RawAssignment, ScanPoint};

fn space_error(code: &str, message: &str) -> ErrorInfo {
    ErrorInfo::new(code, message)
}

fn number_value(value: f64) -> Value {
    Number::from_f64(value)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

/// Evaluates a range bound, which may be a literal or a math expression.
fn bound(value: &Value, parameter: &str) -> Result<f64, ScanError> {
    if let Some(number) = value.as_f64() {
        return Ok(number);
    }
    let text = value.as_str().ok_or_else(|| {
        ScanError::Config(
            space_error("bad-bound", "range bound is neither a number nor an expression")
                .with_context("parameter", parameter),
        )
    })?;
    eval_number(text, &EmptyScope).map_err(|err| {
        ScanError::Config(
            space_error("bad-bound", "range bound expression failed to evaluate")
                .with_context("parameter", parameter)
                .with_hint(err.to_string()),
        )
    })
}

/// Expands a `[start, end, count]` descriptor into a value list.
pub fn expand_range(
    scan: &[Value],
    distribution: Distribution,
    parameter: &str,
) -> Result<Vec<Value>, ScanError> {
    let [start, end, count] = scan else {
        return Err(ScanError::Config(
            space_error("bad-scan-range", "scan range must be [start, end, count]")
                .with_context("parameter", parameter),
        ));
    };
    let start = bound(start, parameter)?;
    let end = bound(end, parameter)?;
    let count = bound(count, parameter)? as usize;
    if count == 0 {
        return Err(ScanError::Config(
            space_error("bad-scan-range", "scan range count must be positive")
                .with_context("parameter", parameter),
        ));
    }
    if count == 1 {
        return Ok(vec![number_value(start)]);
    }
    let steps = (count - 1) as f64;
    let values = match distribution {
        Distribution::Linear => (0..count)
            .map(|i| start + (end - start) * i as f64 / steps)
            .collect(),
        // Bounds are exponents: values run from 10^start to 10^end.
        Distribution::Log10 => (0..count)
            .map(|i| 10f64.powf(start + (end - start) * i as f64 / steps))
            .collect(),
        Distribution::Geometric => {
            if start == 0.0 || end == 0.0 || start.signum() != end.signum() {
                return Err(ScanError::Config(
                    space_error(
                        "bad-scan-range",
                        "geometric range bounds must be non-zero with equal sign",
                    )
                    .with_context("parameter", parameter),
                ));
            }
            let ratio = (end / start).powf(1.0 / steps);
            (0..count)
                .map(|i| start * ratio.powi(i as i32))
                .collect::<Vec<f64>>()
        }
    };
    Ok(values.into_iter().map(number_value).collect())
}

/// Enumerable parameter space derived from a scan configuration.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScanSpace {
    /// Grid axes in declaration order: `(name, value list)`.
    axes: Vec<(String, Vec<Value>)>,
    /// Dependent parameters: `(name, raw formula)`.
    dependents: Vec<(String, String)>,
    /// Random parameters: `(name, [low, high))`.
    randoms: Vec<(String, [f64; 2])>,
}

impl ScanSpace {
    /// Collects grid axes, dependent formulas, and random bounds from the
    /// configuration. Grid ranges expand through their declared
    /// distribution at this point, so the axis lists are final.
    pub fn from_config(config: &ScanConfig) -> Result<Self, ScanError> {
        let mut space = ScanSpace::default();
        for (name, _block, line) in config.parameters() {
            match &line.value {
                LineValue::Grid { scan, distribution } => {
                    let values = expand_range(scan, *distribution, &name)?;
                    space.axes.push((name, values));
                }
                LineValue::Explicit { values } => {
                    space.axes.push((name, values.clone()));
                }
                LineValue::Random { random } => {
                    space.randoms.push((name, *random));
                }
                LineValue::Dependent { dependent } => {
                    space.dependents.push((name, dependent.clone()));
                }
                LineValue::Constant { .. } | LineValue::Argument { .. } => {}
            }
        }
        Ok(space)
    }

    /// Exact number of grid points: the product of the axis lengths.
    pub fn grid_size(&self) -> usize {
        self.axes.iter().map(|(_, values)| values.len()).product()
    }

    /// True when no grid axis and no random parameter is declared.
    pub fn is_empty(&self) -> bool {
        self.axes.is_empty() && self.randoms.is_empty()
    }

    /// Builds the full Cartesian grid, resolving every combination into a
    /// scan point. Axis order follows declaration order; the later entry
    /// wins on a name collision.
    pub fn build_grid(&self) -> Result<Vec<ScanPoint>, ScanError> {
        let mut assignments = Vec::with_capacity(self.grid_size());
        expand_axes(&self.axes, 0, RawAssignment::new(), &mut assignments);
        let mut points = Vec::with_capacity(assignments.len());
        for mut assignment in assignments {
            for (name, formula) in &self.dependents {
                assignment.insert(name.clone(), Value::String(formula.clone()));
            }
            points.push(resolve(&assignment)?);
        }
        Ok(points)
    }

    /// Draws one scan point: an independent uniform draw from `[low, high)`
    /// per random parameter, with dependent formulas resolved against the
    /// drawn values. No state is carried between calls beyond the RNG.
    pub fn draw(&self, rng: &mut RngHandle) -> Result<ScanPoint, ScanError> {
        let mut assignment = RawAssignment::new();
        for (name, formula) in &self.dependents {
            assignment.insert(name.clone(), Value::String(formula.clone()));
        }
        for (name, [low, high]) in &self.randoms {
            assignment.insert(name.clone(), number_value(rng.uniform(*low, *high)));
        }
        resolve(&assignment)
    }
}

fn expand_axes(
    axes: &[(String, Vec<Value>)],
    idx: usize,
    current: RawAssignment,
    outputs: &mut Vec<RawAssignment>,
) {
    if idx == axes.len() {
        outputs.push(current);
        return;
    }
    let (name, values) = &axes[idx];
    for value in values {
        let mut next = current.clone();
        next.insert(name.clone(), value.clone());
        expand_axes(axes, idx + 1, next, outputs);
    }
}
