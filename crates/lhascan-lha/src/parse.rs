//! Parsing of hierarchical flat-file simulation output.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use lhascan_core::{ErrorInfo, ScanError};
use serde_json::{Map, Number, Value};
use thiserror::Error;

use crate::nested::{list_to_nested, merge_nested};

/// Parse failure, with the file-absent and malformed-content cases kept as
/// distinct variants so callers can tell them apart.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LhaParseError {
    /// The document file does not exist or could not be opened.
    #[error("document not found: {0}")]
    NotFound(ErrorInfo),
    /// The file exists but its content does not form a valid document.
    #[error("malformed document: {0}")]
    Malformed(ErrorInfo),
}

impl From<LhaParseError> for ScanError {
    fn from(err: LhaParseError) -> Self {
        match err {
            LhaParseError::NotFound(info) | LhaParseError::Malformed(info) => {
                ScanError::Parse(info)
            }
        }
    }
}

/// One raw section of the document: positional value lines plus textual
/// info fragments, in file order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawSection {
    /// Positional lines whose tokens are all numeric.
    pub values: Vec<Vec<Value>>,
    /// Informational fragments (header tails and non-numeric payloads).
    pub info: Vec<Value>,
}

/// Raw document structure before filtering and nested conversion.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawDocument {
    /// Ordinary blocks keyed by block name.
    pub blocks: BTreeMap<String, RawSection>,
    /// Decay sections keyed by particle id.
    pub decays: BTreeMap<String, RawSection>,
}

fn parse_token(token: &str) -> Value {
    if let Ok(int) = token.parse::<i64>() {
        return Value::Number(int.into());
    }
    if let Ok(float) = token.parse::<f64>() {
        if let Some(number) = Number::from_f64(float) {
            return Value::Number(number);
        }
    }
    Value::String(token.to_string())
}

fn tail_fragment(tokens: &[&str]) -> Value {
    if let [single] = tokens {
        parse_token(single)
    } else {
        Value::String(tokens.join(" "))
    }
}

fn malformed(code: &str, message: &str, line_no: usize) -> LhaParseError {
    LhaParseError::Malformed(
        ErrorInfo::new(code, message).with_context("line", (line_no + 1).to_string()),
    )
}

enum Cursor {
    None,
    Block(String),
    Decay(String),
}

/// Loads the raw section structure from document text.
pub fn parse_raw_text(text: &str) -> Result<RawDocument, LhaParseError> {
    let mut doc = RawDocument::default();
    let mut cursor = Cursor::None;
    for (line_no, raw_line) in text.lines().enumerate() {
        let content = raw_line.split('#').next().unwrap_or("").trim();
        if content.is_empty() {
            continue;
        }
        let tokens: Vec<&str> = content.split_whitespace().collect();
        match tokens[0].to_ascii_uppercase().as_str() {
            "BLOCK" => {
                let name = tokens
                    .get(1)
                    .ok_or_else(|| malformed("block-header", "block header without a name", line_no))?
                    .to_string();
                let section = doc.blocks.entry(name.clone()).or_default();
                if tokens.len() > 2 {
                    section.info.push(tail_fragment(&tokens[2..]));
                }
                cursor = Cursor::Block(name);
            }
            "DECAY" => {
                let pid = tokens
                    .get(1)
                    .ok_or_else(|| malformed("decay-header", "decay header without a pid", line_no))?
                    .to_string();
                let section = doc.decays.entry(pid.clone()).or_default();
                if tokens.len() > 2 {
                    section.info.push(tail_fragment(&tokens[2..]));
                }
                cursor = Cursor::Decay(pid);
            }
            _ => {
                let section = match &cursor {
                    Cursor::None => {
                        return Err(malformed(
                            "stray-content",
                            "data line outside any block",
                            line_no,
                        ))
                    }
                    Cursor::Block(name) => doc.blocks.get_mut(name),
                    Cursor::Decay(pid) => doc.decays.get_mut(pid),
                };
                let section = section.ok_or_else(|| {
                    malformed("stray-content", "data line outside any block", line_no)
                })?;
                let parsed: Vec<Value> = tokens.iter().map(|t| parse_token(t)).collect();
                match parsed.iter().position(|v| !v.is_number()) {
                    None => section.values.push(parsed),
                    Some(first_text) => section.info.push(tail_fragment(&tokens[first_text..])),
                }
            }
        }
    }
    Ok(doc)
}

/// Loads the raw document from a file.
pub fn load_raw(path: &Path) -> Result<RawDocument, LhaParseError> {
    let text = fs::read_to_string(path).map_err(|err| {
        if err.kind() == ErrorKind::NotFound {
            tracing::error!("file {} not found", path.display());
            LhaParseError::NotFound(
                ErrorInfo::new("not-found", "document file not found")
                    .with_context("path", path.display().to_string()),
            )
        } else {
            tracing::error!("could not read {}: {err}", path.display());
            LhaParseError::Malformed(
                ErrorInfo::new("unreadable", "document file could not be read")
                    .with_context("path", path.display().to_string())
                    .with_hint(err.to_string()),
            )
        }
    })?;
    parse_raw_text(&text).map_err(|err| {
        tracing::error!("could not parse {}", path.display());
        err
    })
}

fn info_text(fragment: &Value) -> String {
    match fragment {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn section_value(section: &RawSection, decay: bool) -> Value {
    let mut map = Map::new();
    if !section.values.is_empty() {
        let lines = section
            .values
            .iter()
            .map(|line| {
                if decay {
                    let reversed: Vec<Value> = line.iter().rev().cloned().collect();
                    list_to_nested(&reversed)
                } else {
                    list_to_nested(line)
                }
            })
            .collect();
        map.insert("values".to_string(), merge_nested(lines));
    }
    if !section.info.is_empty() {
        let info = if decay && section.info.len() == 1 {
            section.info[0].clone()
        } else {
            Value::String(section.info.iter().map(info_text).collect())
        };
        map.insert("info".to_string(), info);
    }
    Value::Object(map)
}

/// Parses a document file into its nested mapping form.
///
/// When `wanted_blocks` is non-empty only matching block names are retained.
/// Positional value lines convert to right-nested mappings and deep-merge per
/// block; info fragments concatenate. Decay sections are always surfaced,
/// under `DECAY`, or under `DECAYS` when the filtered output already contains
/// a block of that name. Decay value lines reverse their element order before
/// conversion, and a decay's info collapses to the bare fragment when exactly
/// one is present.
pub fn parse_document(path: &Path, wanted_blocks: &[String]) -> Result<Value, LhaParseError> {
    let raw = load_raw(path)?;
    let mut doc = Map::new();
    for (name, section) in &raw.blocks {
        if !wanted_blocks.is_empty() && !wanted_blocks.iter().any(|w| w == name) {
            continue;
        }
        doc.insert(name.clone(), section_value(section, false));
    }
    if !raw.decays.is_empty() {
        let decay_key = if doc.contains_key("DECAY") {
            "DECAYS"
        } else {
            "DECAY"
        };
        let mut decays = Map::new();
        for (pid, section) in &raw.decays {
            decays.insert(pid.clone(), section_value(section, true));
        }
        doc.insert(decay_key.to_string(), Value::Object(decays));
    }
    Ok(Value::Object(doc))
}
