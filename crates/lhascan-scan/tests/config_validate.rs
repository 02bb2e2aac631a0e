use lhascan_core::serde::from_yaml_slice;
use lhascan_lha::{LineValue, ParameterLine};
use lhascan_scan::ScanConfig;
use serde_json::json;

const SAMPLE: &str = r#"
blocks:
  - block: MODSEL
    lines:
      - id: 1
        value: 1
  - block: MINPAR
    lines:
      - id: 1
        parameter: m0
        scan: [100, 500, 5]
      - id: 2
        parameter: m12
        values: [100, 200]
      - id: 3
        parameter: tanb
        value: 10
      - id: 4
        parameter: a0
        dependent: "-2 * m0"
      - id: 5
        parameter: signmu
        random: [0, 1]
runner:
  numparas: "10^2"
  constraints:
    - "MASS.values.25 > 100"
getblocks:
  - MASS
"#;

#[test]
fn yaml_configs_deserialize_into_typed_lines() {
    let config: ScanConfig = from_yaml_slice(SAMPLE.as_bytes()).expect("load");
    assert_eq!(config.blocks.len(), 2);
    assert_eq!(config.getblocks, vec!["MASS"]);
    assert_eq!(config.runner.constraints.len(), 1);

    let params = config.parameters();
    let names: Vec<&str> = params.iter().map(|(name, _, _)| name.as_str()).collect();
    assert_eq!(names, vec!["MODSEL.1", "m0", "m12", "tanb", "a0", "signmu"]);

    let (_, _, m0) = &params[1];
    assert!(matches!(m0.value, LineValue::Grid { .. }));
    let (_, _, tanb) = &params[3];
    assert!(matches!(tanb.value, LineValue::Constant { .. }));
    config.validate().expect("valid");
}

#[test]
fn duplicate_parameter_names_fail_validation() {
    let mut config: ScanConfig = from_yaml_slice(SAMPLE.as_bytes()).expect("load");
    config.set_line(
        "MODSEL",
        ParameterLine {
            id: Some(9),
            parameter: Some("m0".to_string()),
            comment: None,
            value: LineValue::Constant { value: json!(1) },
        },
    );
    let err = config.validate().expect_err("duplicate");
    assert_eq!(err.info().code, "duplicate-parameter");
}

#[test]
fn malformed_scan_ranges_fail_validation() {
    let mut config: ScanConfig = from_yaml_slice(SAMPLE.as_bytes()).expect("load");
    config.set_line(
        "MINPAR",
        ParameterLine {
            id: Some(1),
            parameter: Some("m0".to_string()),
            comment: None,
            value: LineValue::Grid {
                scan: vec![json!(100), json!(500)],
                distribution: Default::default(),
            },
        },
    );
    let err = config.validate().expect_err("bad range");
    assert_eq!(err.info().code, "bad-scan-range");
}

#[test]
fn set_line_upserts_by_id_and_skips_idless_lines() {
    let mut config: ScanConfig = from_yaml_slice(SAMPLE.as_bytes()).expect("load");
    config.set_line(
        "MINPAR",
        ParameterLine {
            id: Some(3),
            parameter: Some("tanb".to_string()),
            comment: None,
            value: LineValue::Explicit {
                values: vec![json!(10), json!(40)],
            },
        },
    );
    let minpar = config.blocks.iter().find(|b| b.block == "MINPAR").expect("block");
    assert_eq!(minpar.lines.len(), 5, "upsert replaces in place");

    let before = config.clone();
    config.set_line(
        "MINPAR",
        ParameterLine {
            id: None,
            parameter: Some("ignored".to_string()),
            comment: None,
            value: LineValue::Constant { value: json!(1) },
        },
    );
    assert_eq!(config, before, "id-less lines are skipped");
}

#[test]
fn snapshot_embeds_the_whole_configuration() {
    let config: ScanConfig = from_yaml_slice(SAMPLE.as_bytes()).expect("load");
    let snapshot = config.snapshot().expect("snapshot");
    assert_eq!(snapshot["runner"]["numparas"], json!("10^2"));
    assert_eq!(snapshot["blocks"][1]["block"], json!("MINPAR"));
}

#[test]
fn scan_parameter_presence_is_detected() {
    let config: ScanConfig = from_yaml_slice(SAMPLE.as_bytes()).expect("load");
    assert!(config.has_scan_parameters());
    let constant_only: ScanConfig = from_yaml_slice(
        b"blocks:\n  - block: MODSEL\n    lines:\n      - id: 1\n        value: 1\n",
    )
    .expect("load");
    assert!(!constant_only.has_scan_parameters());
}
