//! Execution scheduling: batch chunking and streaming accept-loops.

use std::collections::BTreeMap;

use lhascan_core::{derive_substream_seed, ErrorInfo, RngHandle, ScanError};
use lhascan_lha::flatten_value;
use rayon::prelude::*;
use serde_json::{json, Value};

use crate::expr::{parse, Expr, ExprError};
use crate::resolve::ScanPoint;
use crate::runner::Runner;
use crate::space::ScanSpace;

fn schedule_error(code: &str, message: &str, err: impl ToString) -> ScanError {
    ScanError::Schedule(ErrorInfo::new(code, message).with_hint(err.to_string()))
}

/// Default worker count: the host CPU count.
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Outcome of applying the constraint set to one parsed record.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstraintOutcome {
    /// Every constraint held.
    Accept,
    /// A constraint evaluated false, or referenced an absent field.
    Reject,
    /// Constraint evaluation failed for another reason; the text is kept as
    /// a diagnostic payload.
    Diagnostic(String),
}

/// Compiled boolean constraints over flattened result fields.
#[derive(Debug, Clone)]
pub struct ConstraintSet {
    exprs: Vec<(String, Expr)>,
}

impl ConstraintSet {
    /// Parses the constraint expressions up front so malformed constraints
    /// fail before any point is run.
    pub fn compile(sources: &[String]) -> Result<Self, ScanError> {
        let mut exprs = Vec::with_capacity(sources.len());
        for source in sources {
            let expr = parse(source).map_err(|err| {
                ScanError::Config(
                    ErrorInfo::new("bad-constraint", "could not parse constraint")
                        .with_context("constraint", source)
                        .with_hint(err.to_string()),
                )
            })?;
            exprs.push((source.clone(), expr));
        }
        Ok(Self { exprs })
    }

    /// Evaluates all constraints against a parsed record.
    pub fn evaluate(&self, record: &Value) -> ConstraintOutcome {
        let scope: BTreeMap<String, Value> = flatten_value(record);
        for (source, expr) in &self.exprs {
            match expr.eval(&scope) {
                Ok(value) if value.truthy() => continue,
                Ok(_) => return ConstraintOutcome::Reject,
                Err(ExprError::UnknownName(_)) => return ConstraintOutcome::Reject,
                Err(ExprError::Invalid(message)) => {
                    return ConstraintOutcome::Diagnostic(format!("{source}: {message}"))
                }
            }
        }
        ConstraintOutcome::Accept
    }

    /// True when no constraint is declared.
    pub fn is_empty(&self) -> bool {
        self.exprs.is_empty()
    }
}

/// Splits a batch of `total` points into contiguous chunk sizes, capped at
/// 1000 points per chunk.
fn chunk_size(total: usize, workers: usize) -> usize {
    (total / workers.max(1)).clamp(1, 1000)
}

/// Runs precomputed scan points through the runner on a fixed-size worker
/// pool, dropping points the runner rejects.
///
/// Chunk results are collected as tasks finish; callers must not rely on
/// the output order matching the scan-point order.
pub fn run_batch(
    points: &[ScanPoint],
    runner: &dyn Runner,
    workers: usize,
) -> Result<Vec<Value>, ScanError> {
    if points.is_empty() {
        return Ok(Vec::new());
    }
    if workers <= 1 {
        return Ok(points.iter().filter_map(|point| runner.run(point)).collect());
    }
    let chunk = chunk_size(points.len(), workers);
    tracing::info!(
        "splitting {} points into {} chunks across {workers} workers",
        points.len(),
        points.len().div_ceil(chunk),
    );
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()
        .map_err(|err| schedule_error("thread-pool", "failed to build worker pool", err))?;
    let results = pool.install(|| {
        points
            .par_chunks(chunk)
            .flat_map_iter(|chunk| {
                chunk
                    .iter()
                    .filter_map(|point| runner.run(point))
                    .collect::<Vec<_>>()
            })
            .collect()
    });
    Ok(results)
}

/// Per-worker accepted-point quotas: `⌊target/workers⌋` each, with the
/// remainder added to the last worker's share.
pub fn partition_quotas(target: usize, workers: usize) -> Vec<usize> {
    let workers = workers.max(1);
    let share = target / workers;
    let mut quotas = vec![share; workers];
    if let Some(last) = quotas.last_mut() {
        *last += target % workers;
    }
    quotas
}

/// Runs the streaming accept-loop until every worker has met its quota.
///
/// Each worker owns an RNG substream derived from the master seed. A record
/// failing a constraint (or referencing an absent field) is discarded and
/// redrawn; a constraint-evaluation logic error keeps a diagnostic record
/// `{"log": <text>}` that counts toward the quota. The merged output order
/// is unspecified.
pub fn run_streaming(
    space: &ScanSpace,
    runner: &dyn Runner,
    constraints: &ConstraintSet,
    target: usize,
    workers: usize,
    master_seed: u64,
) -> Result<Vec<Value>, ScanError> {
    if target == 0 {
        return Ok(Vec::new());
    }
    let quotas = partition_quotas(target, workers);
    tracing::info!("working on {} points across {} workers", target, quotas.len());
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(quotas.len())
        .build()
        .map_err(|err| schedule_error("thread-pool", "failed to build worker pool", err))?;
    let collected: Result<Vec<Vec<Value>>, ScanError> = pool.install(|| {
        quotas
            .par_iter()
            .enumerate()
            .map(|(index, &quota)| {
                accept_loop(space, runner, constraints, quota, master_seed, index as u64)
            })
            .collect()
    });
    Ok(collected?.into_iter().flatten().collect())
}

fn accept_loop(
    space: &ScanSpace,
    runner: &dyn Runner,
    constraints: &ConstraintSet,
    quota: usize,
    master_seed: u64,
    worker: u64,
) -> Result<Vec<Value>, ScanError> {
    let mut rng = RngHandle::from_seed(derive_substream_seed(master_seed, worker));
    let mut accepted = Vec::with_capacity(quota);
    while accepted.len() < quota {
        let point = space.draw(&mut rng)?;
        let record = match runner.run(&point) {
            Some(record) => record,
            None => continue,
        };
        match constraints.evaluate(&record) {
            ConstraintOutcome::Accept => accepted.push(record),
            ConstraintOutcome::Reject => continue,
            ConstraintOutcome::Diagnostic(text) => accepted.push(json!({ "log": text })),
        }
    }
    Ok(accepted)
}
