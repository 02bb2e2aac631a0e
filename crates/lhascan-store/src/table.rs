//! Tabular result model: flattened dotted-key rows plus sidecar metadata.

use std::collections::{BTreeMap, BTreeSet};

use lhascan_core::{stable_hash_string, ScanError};
use lhascan_lha::flatten_value;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Sidecar metadata attached to every stored table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableMeta {
    /// Full configuration snapshot of the scan that produced the table.
    pub config: Value,
    /// Stable hash of the configuration snapshot.
    pub config_hash: String,
    /// Master random seed; present for random scans only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// ISO-8601 timestamp recording when the table was assembled.
    pub created_at: String,
}

impl TableMeta {
    /// Builds metadata from a configuration snapshot and optional seed.
    pub fn new(config: Value, seed: Option<u64>) -> Result<Self, ScanError> {
        let config_hash = stable_hash_string(&config)?;
        Ok(Self {
            config,
            config_hash,
            seed,
            created_at: chrono::Utc::now().to_rfc3339(),
        })
    }
}

/// Rows of accepted result records, flattened to dotted-key columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultTable {
    /// One entry per accepted record.
    pub rows: Vec<BTreeMap<String, Value>>,
    /// Sidecar metadata.
    pub meta: TableMeta,
}

impl ResultTable {
    /// Flattens nested result records into table rows.
    pub fn from_records(records: Vec<Value>, meta: TableMeta) -> Self {
        let rows = records.iter().map(flatten_value).collect();
        Self { rows, meta }
    }

    /// Sorted union of all column names appearing in any row.
    pub fn columns(&self) -> Vec<String> {
        let mut columns = BTreeSet::new();
        for row in &self.rows {
            columns.extend(row.keys().cloned());
        }
        columns.into_iter().collect()
    }

    /// Number of rows in the table.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when the table holds no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
