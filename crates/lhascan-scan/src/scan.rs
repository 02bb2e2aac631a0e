//! Top-level scan orchestration.

use lhascan_core::{wall_clock_seed, ErrorInfo, ScanError};
use lhascan_lha::{render_template, ParameterLine};
use lhascan_store::{ResultTable, TableMeta};
use serde_json::Value;

use crate::config::ScanConfig;
use crate::dispatch::{default_workers, run_batch, run_streaming, ConstraintSet};
use crate::expr::{eval_number, EmptyScope};
use crate::resolve::ScanPoint;
use crate::runner::Runner;
use crate::space::ScanSpace;

/// Grid scan: exhaustive Cartesian enumeration of the declared value lists.
#[derive(Debug, Clone)]
pub struct Scan {
    config: ScanConfig,
    template: String,
    scan_set: Vec<ScanPoint>,
    num_points: usize,
}

impl Scan {
    /// Builds a scan over the given configuration and renders the initial
    /// template.
    pub fn new(config: ScanConfig) -> Self {
        let template = render_template(&config.blocks);
        if !config.has_scan_parameters() {
            tracing::info!("no scan parameters defined in config");
            tracing::info!(
                "register a grid range or value list with set_line(<block>, <line>)"
            );
        }
        Self {
            config,
            template,
            scan_set: Vec::new(),
            num_points: 0,
        }
    }

    /// Current placeholder-bearing template text.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Configuration accessor.
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Upserts a parameter line and regenerates the template; a stale
    /// template would materialize outdated values.
    pub fn set_line(&mut self, block: &str, line: ParameterLine) {
        self.config.set_line(block, line);
        self.template = render_template(&self.config.blocks);
        self.scan_set.clear();
        self.num_points = 0;
    }

    /// Builds the full scan set, failing fast when the configuration does
    /// not validate. Returns the exact number of points.
    pub fn build(&mut self) -> Result<usize, ScanError> {
        self.config.validate()?;
        let space = ScanSpace::from_config(&self.config)?;
        self.num_points = space.grid_size();
        tracing::info!("building all {} parameter points", self.num_points);
        self.scan_set = space.build_grid()?;
        Ok(self.num_points)
    }

    /// Runs every scan point through the runner on `workers` workers
    /// (defaulting to the host CPU count) and aggregates the accepted
    /// records. Builds the scan set first if needed.
    pub fn submit(
        &mut self,
        runner: &dyn Runner,
        workers: Option<usize>,
    ) -> Result<ResultTable, ScanError> {
        if self.scan_set.is_empty() {
            self.build()?;
        }
        let workers = workers.unwrap_or_else(default_workers);
        let records = run_batch(&self.scan_set, runner, workers)?;
        let meta = TableMeta::new(self.config.snapshot()?, None)?;
        Ok(ResultTable::from_records(records, meta))
    }

    /// The built scan points.
    pub fn scan_set(&self) -> &[ScanPoint] {
        &self.scan_set
    }
}

/// Random scan: streaming generation of independently drawn points until an
/// accepted-count target is met.
#[derive(Debug, Clone)]
pub struct RandomScan {
    config: ScanConfig,
    template: String,
    space: ScanSpace,
    constraints: ConstraintSet,
    target: usize,
    seed: u64,
}

impl RandomScan {
    /// Builds a random scan, failing fast on an invalid configuration or a
    /// missing target count. The master seed is drawn from the wall clock
    /// and recorded in the stored metadata.
    pub fn new(config: ScanConfig) -> Result<Self, ScanError> {
        config.validate()?;
        let target = target_count(&config)?;
        let template = render_template(&config.blocks);
        let space = ScanSpace::from_config(&config)?;
        let constraints = ConstraintSet::compile(&config.runner.constraints)?;
        let seed = wall_clock_seed();
        tracing::info!("random scan seeded with {seed}");
        Ok(Self {
            config,
            template,
            space,
            constraints,
            target,
            seed,
        })
    }

    /// Overrides the master seed (reproducing a recorded run).
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// The master seed recorded for this run.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Accepted-count target.
    pub fn target(&self) -> usize {
        self.target
    }

    /// Current placeholder-bearing template text.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Runs the streaming accept-loop across `workers` workers (defaulting
    /// to the host CPU count) and aggregates accepted records with the seed
    /// in the sidecar metadata.
    pub fn submit(
        &self,
        runner: &dyn Runner,
        workers: Option<usize>,
    ) -> Result<ResultTable, ScanError> {
        let workers = workers.unwrap_or_else(default_workers);
        let records = run_streaming(
            &self.space,
            runner,
            &self.constraints,
            self.target,
            workers,
            self.seed,
        )?;
        let meta = TableMeta::new(self.config.snapshot()?, Some(self.seed))?;
        Ok(ResultTable::from_records(records, meta))
    }
}

fn target_count(config: &ScanConfig) -> Result<usize, ScanError> {
    let declared = config.runner.numparas.as_ref().ok_or_else(|| {
        ScanError::Config(ErrorInfo::new(
            "missing-numparas",
            "random scans require runner.numparas",
        ))
    })?;
    let value = match declared {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(text) => eval_number(text, &EmptyScope).map_err(|err| {
            ScanError::Config(
                ErrorInfo::new("bad-numparas", "could not evaluate runner.numparas")
                    .with_hint(err.to_string()),
            )
        })?,
        _ => {
            return Err(ScanError::Config(ErrorInfo::new(
                "bad-numparas",
                "runner.numparas must be a number or expression",
            )))
        }
    };
    if value < 1.0 {
        return Err(ScanError::Config(ErrorInfo::new(
            "bad-numparas",
            "runner.numparas must be at least one",
        )));
    }
    Ok(value as usize)
}
