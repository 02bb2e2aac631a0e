#![doc = "Hierarchical flat-file codec and template engine for the lhascan parameter-scan engine."]

/// Block and parameter-line definitions.
pub mod blocks;
/// Nested-mapping conversion and merge helpers.
pub mod nested;
/// Document parsing.
pub mod parse;
/// Template rendering and materialization.
pub mod template;

pub use blocks::{placeholder_name, Block, Distribution, LineValue, ParameterLine};
pub use nested::{flatten_value, list_to_nested, merge_nested};
pub use parse::{load_raw, parse_document, parse_raw_text, LhaParseError, RawDocument, RawSection};
pub use template::{materialize, render_template};
