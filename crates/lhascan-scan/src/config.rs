//! Scan configuration loading and validation.

use std::fs;
use std::path::Path;

use lhascan_core::serde::from_yaml_slice;
use lhascan_core::{ErrorInfo, ScanError};
use lhascan_lha::{Block, LineValue, ParameterLine};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

fn config_error(code: &str, message: &str) -> ErrorInfo {
    ErrorInfo::new(code, message)
}

/// Runner section of the scan configuration.
///
/// Only the keys the engine itself consumes are modelled; everything else is
/// forwarded untouched to the runner implementation (binary paths, timeouts,
/// work-directory policy).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RunnerConfig {
    /// Target number of accepted points for random scans. May be a number
    /// or a whitelisted math expression.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numparas: Option<Value>,
    /// Boolean constraint expressions applied to parsed results.
    #[serde(default)]
    pub constraints: Vec<String>,
    /// Runner-specific keys, passed through verbatim.
    #[serde(default, flatten)]
    pub extra: Map<String, Value>,
}

/// Scan configuration: block definitions plus runner and filter settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Parameter blocks in declaration order.
    pub blocks: Vec<Block>,
    /// Runner section.
    #[serde(default)]
    pub runner: RunnerConfig,
    /// Block names to retain when parsing runner output; empty keeps all.
    #[serde(default)]
    pub getblocks: Vec<String>,
}

impl ScanConfig {
    /// Loads a configuration from a YAML file.
    pub fn load(path: &Path) -> Result<Self, ScanError> {
        let bytes = fs::read(path).map_err(|err| {
            ScanError::Config(
                config_error("config-read", "failed to read configuration")
                    .with_context("path", path.display().to_string())
                    .with_hint(err.to_string()),
            )
        })?;
        from_yaml_slice(&bytes)
    }

    /// Flat list of `(name, block, line)` for every line carrying an id, in
    /// declaration order. Names follow the template placeholder rule:
    /// the declared symbolic name, or `<block>.<id>`.
    pub fn parameters(&self) -> Vec<(String, &str, &ParameterLine)> {
        let mut entries = Vec::new();
        for block in &self.blocks {
            for line in &block.lines {
                let id = match line.id {
                    Some(id) => id,
                    None => continue,
                };
                let name = match &line.parameter {
                    Some(name) => name.clone(),
                    None => format!("{}.{}", block.block, id),
                };
                entries.push((name, block.block.as_str(), line));
            }
        }
        entries
    }

    /// Validates the configuration: unique parameter names, well-formed grid
    /// ranges, non-empty value lists, ordered random bounds.
    pub fn validate(&self) -> Result<(), ScanError> {
        let mut seen = std::collections::BTreeSet::new();
        for (name, block, line) in self.parameters() {
            if !seen.insert(name.clone()) {
                return Err(ScanError::Config(
                    config_error("duplicate-parameter", "parameter name declared twice")
                        .with_context("parameter", name)
                        .with_context("block", block),
                ));
            }
            match &line.value {
                LineValue::Grid { scan, .. } => {
                    if scan.len() != 3 {
                        return Err(ScanError::Config(
                            config_error("bad-scan-range", "scan range must be [start, end, count]")
                                .with_context("parameter", name),
                        ));
                    }
                }
                LineValue::Explicit { values } => {
                    if values.is_empty() {
                        return Err(ScanError::Config(
                            config_error("empty-values", "scan value list is empty")
                                .with_context("parameter", name),
                        ));
                    }
                }
                LineValue::Random { random } => {
                    if random[0] > random[1] {
                        return Err(ScanError::Config(
                            config_error("bad-random-range", "random bounds are reversed")
                                .with_context("parameter", name),
                        ));
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Upserts a parameter line within the named block (created on demand),
    /// matching existing lines by id. A line without an id is logged as an
    /// error and skipped.
    pub fn set_line(&mut self, block_name: &str, line: ParameterLine) {
        let Some(id) = line.id else {
            tracing::error!("no 'id' set for parameter");
            return;
        };
        let idx = match self.blocks.iter().position(|b| b.block == block_name) {
            Some(idx) => idx,
            None => {
                self.blocks.push(Block {
                    block: block_name.to_string(),
                    lines: Vec::new(),
                });
                self.blocks.len() - 1
            }
        };
        let block = &mut self.blocks[idx];
        match block.lines.iter_mut().find(|l| l.id == Some(id)) {
            Some(slot) => *slot = line,
            None => block.lines.push(line),
        }
    }

    /// Full dict-snapshot of the configuration for metadata embedding.
    pub fn snapshot(&self) -> Result<Value, ScanError> {
        serde_json::to_value(self).map_err(|err| {
            ScanError::Serde(
                config_error("config-snapshot", "failed to snapshot configuration")
                    .with_hint(err.to_string()),
            )
        })
    }

    /// True when at least one line declares a grid, value list, or random
    /// range (i.e. the scan has something to vary).
    pub fn has_scan_parameters(&self) -> bool {
        self.parameters().iter().any(|(_, _, line)| {
            matches!(
                line.value,
                LineValue::Grid { .. } | LineValue::Explicit { .. } | LineValue::Random { .. }
            )
        })
    }
}
