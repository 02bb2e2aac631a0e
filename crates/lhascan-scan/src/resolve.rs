//! Raw-assignment resolution via dependency ordering.
//!
//! Formula-valued parameters are ordered along their reference graph and
//! evaluated once each, so a circular or undefined reference surfaces as a
//! typed error instead of a runaway substitution loop.

use std::collections::{BTreeMap, BTreeSet};

use lhascan_core::{ErrorInfo, ScanError};
use serde_json::Value;

use crate::expr::{parse, Expr, ExprError};

/// Mapping from parameter name to raw value: a literal number, or a string
/// formula that may reference other parameter names.
pub type RawAssignment = BTreeMap<String, Value>;

/// Mapping from parameter name to a concrete number, free of references.
pub type ScanPoint = BTreeMap<String, f64>;

fn resolve_error(code: &str, message: &str) -> ErrorInfo {
    ErrorInfo::new(code, message)
}

enum RawEntry {
    Literal(f64),
    Formula(Expr, BTreeSet<String>),
}

fn classify(name: &str, value: &Value, names: &BTreeSet<String>) -> Result<RawEntry, ScanError> {
    if let Some(number) = value.as_f64() {
        return Ok(RawEntry::Literal(number));
    }
    let text = value.as_str().ok_or_else(|| {
        ScanError::Resolve(
            resolve_error("non-scalar", "parameter value is neither a number nor a formula")
                .with_context("parameter", name),
        )
    })?;
    let expr = parse(text).map_err(|err| {
        ScanError::Resolve(
            resolve_error("invalid-formula", "could not parse parameter formula")
                .with_context("parameter", name)
                .with_hint(err.to_string()),
        )
    })?;
    let deps: BTreeSet<String> = expr
        .identifiers()
        .into_iter()
        .filter(|ident| names.contains(ident))
        .collect();
    Ok(RawEntry::Formula(expr, deps))
}

/// Resolves a raw assignment into concrete numbers.
///
/// Literal entries pass through unchanged, so resolving an already-resolved
/// assignment is the identity. Formulas evaluate in dependency order; a
/// reference cycle or an undefined name is a fatal `Resolve` error.
pub fn resolve(raw: &RawAssignment) -> Result<ScanPoint, ScanError> {
    let names: BTreeSet<String> = raw.keys().cloned().collect();
    let mut pending: BTreeMap<String, (Expr, BTreeSet<String>)> = BTreeMap::new();
    let mut resolved: ScanPoint = BTreeMap::new();
    for (name, value) in raw {
        match classify(name, value, &names)? {
            RawEntry::Literal(number) => {
                resolved.insert(name.clone(), number);
            }
            RawEntry::Formula(expr, deps) => {
                pending.insert(name.clone(), (expr, deps));
            }
        }
    }

    while !pending.is_empty() {
        let ready: Vec<String> = pending
            .iter()
            .filter(|(_, (_, deps))| deps.iter().all(|dep| resolved.contains_key(dep)))
            .map(|(name, _)| name.clone())
            .collect();
        if ready.is_empty() {
            let cycle: Vec<String> = pending.keys().cloned().collect();
            return Err(ScanError::Resolve(
                resolve_error("cycle", "circular reference between parameters")
                    .with_context("parameters", cycle.join(", ")),
            ));
        }
        for name in ready {
            let Some((expr, _)) = pending.remove(&name) else {
                continue;
            };
            let value = expr.eval(&resolved).map_err(|err| match err {
                ExprError::UnknownName(unknown) => ScanError::Resolve(
                    resolve_error("undefined-reference", "formula references an undefined name")
                        .with_context("parameter", name.clone())
                        .with_context("name", unknown),
                ),
                ExprError::Invalid(message) => ScanError::Resolve(
                    resolve_error("invalid-formula", "formula evaluation failed")
                        .with_context("parameter", name.clone())
                        .with_hint(message),
                ),
            })?;
            let number = value.as_number().map_err(|_| {
                ScanError::Resolve(
                    resolve_error("non-numeric", "formula did not produce a number")
                        .with_context("parameter", name.clone()),
                )
            })?;
            resolved.insert(name, number);
        }
    }
    Ok(resolved)
}
