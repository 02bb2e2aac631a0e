//! CSV and SQLite persistence backends for result tables.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, WriterBuilder};
use lhascan_core::serde::{from_json_slice, to_canonical_json_bytes};
use lhascan_core::{ErrorInfo, ScanError};
use rusqlite::Connection;
use serde_json::Value;

use crate::table::{ResultTable, TableMeta};

fn store_error(code: &str, message: &str, err: impl ToString) -> ScanError {
    ScanError::Store(ErrorInfo::new(code, message).with_hint(err.to_string()))
}

/// Supported persistence backends, selected by path extension.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultStore {
    /// Directory of `<dataset>.csv` / `<dataset>.meta.json` pairs.
    Csv(PathBuf),
    /// Single SQLite database with one table per dataset.
    Sqlite(PathBuf),
}

impl ResultStore {
    /// Constructs a store handle from a filesystem path.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("sqlite") | Some("db") => ResultStore::Sqlite(path),
            _ => ResultStore::Csv(path),
        }
    }

    /// Persists the table under the given dataset name, returning the
    /// effective name. The reserved name `config` is remapped to `config2`
    /// with a logged warning; every other name is stored unchanged.
    pub fn save(&self, table: &ResultTable, dataset: &str) -> Result<String, ScanError> {
        let dataset = effective_dataset(dataset);
        match self {
            ResultStore::Csv(dir) => save_csv(dir, table, &dataset)?,
            ResultStore::Sqlite(path) => save_sqlite(path, table, &dataset)?,
        }
        Ok(dataset)
    }

    /// Loads a previously stored table.
    pub fn load(&self, dataset: &str) -> Result<ResultTable, ScanError> {
        match self {
            ResultStore::Csv(dir) => load_csv(dir, dataset),
            ResultStore::Sqlite(path) => load_sqlite(path, dataset),
        }
    }
}

fn effective_dataset(dataset: &str) -> String {
    if dataset == "config" {
        tracing::warn!("cannot use \"config\" as dataset name, using \"config2\" instead");
        "config2".to_string()
    } else {
        dataset.to_string()
    }
}

fn cell_text(value: &Value) -> Result<String, ScanError> {
    match value {
        Value::String(text) => Ok(text.clone()),
        Value::Null => Ok(String::new()),
        Value::Object(_) | Value::Array(_) => {
            let bytes = to_canonical_json_bytes(value)?;
            String::from_utf8(bytes)
                .map_err(|err| store_error("cell-encode", "failed to encode cell", err))
        }
        other => Ok(other.to_string()),
    }
}

fn cell_value(text: &str) -> Option<Value> {
    if text.is_empty() {
        return None;
    }
    if let Ok(int) = text.parse::<i64>() {
        return Some(Value::Number(int.into()));
    }
    if let Ok(float) = text.parse::<f64>() {
        if let Some(number) = serde_json::Number::from_f64(float) {
            return Some(Value::Number(number));
        }
    }
    if text.starts_with('{') || text.starts_with('[') {
        if let Ok(value) = serde_json::from_str(text) {
            return Some(value);
        }
    }
    Some(Value::String(text.to_string()))
}

fn save_csv(dir: &Path, table: &ResultTable, dataset: &str) -> Result<(), ScanError> {
    fs::create_dir_all(dir)
        .map_err(|err| store_error("store-create", "failed to create store directory", err))?;
    let columns = table.columns();
    let csv_path = dir.join(format!("{dataset}.csv"));
    if columns.is_empty() {
        // No accepted rows; the dataset file stays empty.
        fs::write(&csv_path, "")
            .map_err(|err| store_error("store-write", "failed to write dataset", err))?;
    } else {
        let mut writer = WriterBuilder::new()
            .from_path(&csv_path)
            .map_err(|err| store_error("store-open", "failed to open CSV dataset", err))?;
        writer
            .write_record(&columns)
            .map_err(|err| store_error("store-write-header", "failed to write header", err))?;
        for row in &table.rows {
            let mut record = Vec::with_capacity(columns.len());
            for column in &columns {
                match row.get(column) {
                    Some(value) => record.push(cell_text(value)?),
                    None => record.push(String::new()),
                }
            }
            writer
                .write_record(&record)
                .map_err(|err| store_error("store-write-row", "failed to write row", err))?;
        }
        writer
            .flush()
            .map_err(|err| store_error("store-flush", "failed to flush dataset", err))?;
    }
    let meta_bytes = to_canonical_json_bytes(&table.meta)?;
    fs::write(dir.join(format!("{dataset}.meta.json")), meta_bytes)
        .map_err(|err| store_error("store-meta-write", "failed to write metadata", err))?;
    Ok(())
}

fn load_csv(dir: &Path, dataset: &str) -> Result<ResultTable, ScanError> {
    let meta_bytes = fs::read(dir.join(format!("{dataset}.meta.json")))
        .map_err(|err| store_error("store-meta-read", "failed to read metadata", err))?;
    let meta: TableMeta = from_json_slice(&meta_bytes)?;
    let csv_path = dir.join(format!("{dataset}.csv"));
    let bytes = fs::read(&csv_path)
        .map_err(|err| store_error("store-read", "failed to read CSV dataset", err))?;
    if bytes.is_empty() {
        return Ok(ResultTable {
            rows: Vec::new(),
            meta,
        });
    }
    let mut reader = ReaderBuilder::new().from_reader(bytes.as_slice());
    let columns: Vec<String> = reader
        .headers()
        .map_err(|err| store_error("store-header", "failed to read header", err))?
        .iter()
        .map(str::to_string)
        .collect();
    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|err| store_error("store-record", "failed to read row", err))?;
        let mut row = BTreeMap::new();
        for (column, text) in columns.iter().zip(record.iter()) {
            if let Some(value) = cell_value(text) {
                row.insert(column.clone(), value);
            }
        }
        rows.push(row);
    }
    Ok(ResultTable { rows, meta })
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn save_sqlite(path: &Path, table: &ResultTable, dataset: &str) -> Result<(), ScanError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|err| store_error("store-create", "failed to create store directory", err))?;
    }
    let mut conn = Connection::open(path)
        .map_err(|err| store_error("store-open", "failed to open sqlite store", err))?;
    let columns = table.columns();
    let column_defs: Vec<String> = columns
        .iter()
        .map(|c| format!("{} TEXT", quote_ident(c)))
        .collect();
    conn.execute_batch(&format!(
        "DROP TABLE IF EXISTS {table};\n\
         CREATE TABLE {table} ({defs});\n\
         CREATE TABLE IF NOT EXISTS _meta (dataset TEXT PRIMARY KEY, meta TEXT NOT NULL);",
        table = quote_ident(dataset),
        defs = if column_defs.is_empty() {
            "placeholder TEXT".to_string()
        } else {
            column_defs.join(", ")
        },
    ))
    .map_err(|err| store_error("store-schema", "failed to ensure dataset schema", err))?;
    let tx = conn
        .transaction()
        .map_err(|err| store_error("store-transaction", "failed to start transaction", err))?;
    {
        let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{i}")).collect();
        let sql = format!(
            "INSERT INTO {table} ({cols}) VALUES ({vals})",
            table = quote_ident(dataset),
            cols = columns
                .iter()
                .map(|c| quote_ident(c))
                .collect::<Vec<_>>()
                .join(", "),
            vals = placeholders.join(", "),
        );
        for row in &table.rows {
            if columns.is_empty() {
                continue;
            }
            let mut cells = Vec::with_capacity(columns.len());
            for column in &columns {
                match row.get(column) {
                    Some(value) => cells.push(cell_text(value)?),
                    None => cells.push(String::new()),
                }
            }
            tx.execute(&sql, rusqlite::params_from_iter(cells.iter()))
                .map_err(|err| store_error("store-insert", "failed to append row", err))?;
        }
        let meta_bytes = to_canonical_json_bytes(&table.meta)?;
        let meta_text = String::from_utf8(meta_bytes)
            .map_err(|err| store_error("store-meta-encode", "failed to encode metadata", err))?;
        tx.execute(
            "INSERT INTO _meta (dataset, meta) VALUES (?1, ?2)
             ON CONFLICT(dataset) DO UPDATE SET meta = excluded.meta",
            rusqlite::params![dataset, meta_text],
        )
        .map_err(|err| store_error("store-meta-insert", "failed to store metadata", err))?;
    }
    tx.commit()
        .map_err(|err| store_error("store-commit", "failed to commit dataset", err))?;
    Ok(())
}

fn load_sqlite(path: &Path, dataset: &str) -> Result<ResultTable, ScanError> {
    let conn = Connection::open(path)
        .map_err(|err| store_error("store-open", "failed to open sqlite store", err))?;
    let meta_text: String = conn
        .query_row(
            "SELECT meta FROM _meta WHERE dataset = ?1",
            rusqlite::params![dataset],
            |row| row.get(0),
        )
        .map_err(|err| store_error("store-meta-read", "failed to read metadata", err))?;
    let meta: TableMeta = from_json_slice(meta_text.as_bytes())?;
    let mut stmt = conn
        .prepare(&format!("SELECT * FROM {}", quote_ident(dataset)))
        .map_err(|err| store_error("store-prepare", "failed to prepare dataset query", err))?;
    let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
    let mut rows_iter = stmt
        .query([])
        .map_err(|err| store_error("store-query", "failed to query dataset", err))?;
    let mut rows = Vec::new();
    while let Some(row) = rows_iter
        .next()
        .map_err(|err| store_error("store-row", "failed to fetch row", err))?
    {
        let mut entry = BTreeMap::new();
        for (idx, column) in columns.iter().enumerate() {
            let text: String = row
                .get(idx)
                .map_err(|err| store_error("store-get", "failed to read column", err))?;
            if let Some(value) = cell_value(&text) {
                entry.insert(column.clone(), value);
            }
        }
        rows.push(entry);
    }
    Ok(ResultTable { rows, meta })
}
