use std::fs;

use lhascan_core::serde::from_yaml_slice;
use lhascan_lha::{materialize, parse_document};
use lhascan_scan::resolve::ScanPoint;
use lhascan_scan::{RandomScan, Scan, ScanConfig};
use lhascan_store::ResultStore;
use serde_json::json;
use tempfile::TempDir;

const GRID_CONFIG: &str = r#"
blocks:
  - block: MINPAR
    lines:
      - id: 1
        parameter: m0
        values: [100.0, 200.0]
      - id: 2
        parameter: m12
        scan: [1, 3, 3]
      - id: 3
        parameter: tanb
        value: 10
"#;

const RANDOM_CONFIG: &str = r#"
blocks:
  - block: MINPAR
    lines:
      - id: 1
        parameter: x
        random: [0, 1]
      - id: 2
        parameter: y
        dependent: "x * 2"
runner:
  numparas: 9
  constraints:
    - "x < 0.9"
"#;

#[test]
fn grid_scan_builds_runs_and_stores() {
    let config: ScanConfig = from_yaml_slice(GRID_CONFIG.as_bytes()).expect("config");
    let mut scan = Scan::new(config);
    assert!(scan.template().contains("{%m0%}"));
    assert!(scan.template().contains("3 10 #tanb"));

    let count = scan.build().expect("build");
    assert_eq!(count, 6);

    let runner = |point: &ScanPoint| {
        Some(json!({
            "m0": point["m0"],
            "MASS": {"values": {"25": point["m0"] + point["m12"]}},
        }))
    };
    let table = scan.submit(&runner, Some(2)).expect("submit");
    assert_eq!(table.len(), 6);
    assert!(table.meta.seed.is_none());
    assert!(table.columns().contains(&"MASS.values.25".to_string()));

    let dir = TempDir::new().expect("tempdir");
    let store = ResultStore::from_path(dir.path().join("scan"));
    store.save(&table, "results").expect("save");
    let loaded = store.load("results").expect("load");
    assert_eq!(loaded.len(), 6);
    assert_eq!(loaded.meta.config_hash, table.meta.config_hash);
}

#[test]
fn grid_scan_points_materialize_into_parseable_documents() {
    let config: ScanConfig = from_yaml_slice(GRID_CONFIG.as_bytes()).expect("config");
    let mut scan = Scan::new(config);
    scan.build().expect("build");

    let dir = TempDir::new().expect("tempdir");
    let point = &scan.scan_set()[0];
    let text = materialize(scan.template(), point).expect("materialize");
    let path = dir.path().join("input.lha");
    fs::write(&path, &text).expect("write");
    let doc = parse_document(&path, &[]).expect("parse");
    assert_eq!(doc["MINPAR"]["values"]["1"].as_f64(), Some(point["m0"]));
    assert_eq!(doc["MINPAR"]["values"]["3"].as_f64(), Some(10.0));
}

#[test]
fn rebuilding_after_set_line_regenerates_template_and_grid() {
    let config: ScanConfig = from_yaml_slice(GRID_CONFIG.as_bytes()).expect("config");
    let mut scan = Scan::new(config);
    assert_eq!(scan.build().expect("build"), 6);

    let mut line = scan.config().blocks[0].lines[0].clone();
    line.value = lhascan_lha::LineValue::Explicit {
        values: vec![json!(100.0), json!(200.0), json!(300.0)],
    };
    scan.set_line("MINPAR", line);
    assert_eq!(scan.build().expect("build"), 9);
}

#[test]
fn invalid_configs_fail_build_before_any_execution() {
    let config: ScanConfig = from_yaml_slice(
        b"blocks:\n  - block: MINPAR\n    lines:\n      - id: 1\n        parameter: m0\n        scan: [1, 2]\n",
    )
    .expect("config");
    let mut scan = Scan::new(config);
    assert!(scan.build().is_err());
    assert!(scan.scan_set().is_empty());
}

#[test]
fn random_scan_records_seed_and_meets_target() {
    let config: ScanConfig = from_yaml_slice(RANDOM_CONFIG.as_bytes()).expect("config");
    let scan = RandomScan::new(config).expect("scan").with_seed(77);
    assert_eq!(scan.target(), 9);

    let runner = |point: &ScanPoint| Some(json!({ "x": point["x"], "y": point["y"] }));
    let table = scan.submit(&runner, Some(2)).expect("submit");
    assert_eq!(table.len(), 9);
    assert_eq!(table.meta.seed, Some(77));
    for row in &table.rows {
        let x = row["x"].as_f64().expect("x");
        let y = row["y"].as_f64().expect("y");
        assert!(x < 0.9);
        assert!((y - 2.0 * x).abs() < 1e-12);
    }
}

#[test]
fn random_scan_requires_a_target_count() {
    let config: ScanConfig = from_yaml_slice(
        b"blocks:\n  - block: MINPAR\n    lines:\n      - id: 1\n        parameter: x\n        random: [0, 1]\n",
    )
    .expect("config");
    let err = RandomScan::new(config).expect_err("missing numparas");
    assert_eq!(err.info().code, "missing-numparas");
}
