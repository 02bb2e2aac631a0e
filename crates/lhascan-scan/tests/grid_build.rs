use std::collections::BTreeSet;

use lhascan_core::RngHandle;
use lhascan_lha::{Block, Distribution, LineValue, ParameterLine};
use lhascan_scan::space::{expand_range, ScanSpace};
use lhascan_scan::{RunnerConfig, ScanConfig};
use serde_json::json;

fn line(id: i64, parameter: &str, value: LineValue) -> ParameterLine {
    ParameterLine {
        id: Some(id),
        parameter: Some(parameter.to_string()),
        comment: None,
        value,
    }
}

fn config(lines: Vec<ParameterLine>) -> ScanConfig {
    ScanConfig {
        blocks: vec![Block {
            block: "MINPAR".to_string(),
            lines,
        }],
        runner: RunnerConfig::default(),
        getblocks: Vec::new(),
    }
}

#[test]
fn grid_has_exactly_the_product_of_axis_lengths() {
    let config = config(vec![
        line(
            1,
            "m0",
            LineValue::Explicit {
                values: vec![json!(100), json!(200)],
            },
        ),
        line(
            2,
            "m12",
            LineValue::Explicit {
                values: vec![json!(1), json!(2), json!(3)],
            },
        ),
    ]);
    let space = ScanSpace::from_config(&config).expect("space");
    assert_eq!(space.grid_size(), 6);
    let points = space.build_grid().expect("grid");
    assert_eq!(points.len(), 6);

    let combos: BTreeSet<(i64, i64)> = points
        .iter()
        .map(|p| (p["m0"] as i64, p["m12"] as i64))
        .collect();
    assert_eq!(combos.len(), 6, "every combination appears exactly once");
}

#[test]
fn dependents_resolve_against_each_grid_point() {
    let config = config(vec![
        line(
            1,
            "m0",
            LineValue::Explicit {
                values: vec![json!(100.0), json!(200.0)],
            },
        ),
        line(
            2,
            "a0",
            LineValue::Dependent {
                dependent: "-2 * m0".to_string(),
            },
        ),
    ]);
    let space = ScanSpace::from_config(&config).expect("space");
    let points = space.build_grid().expect("grid");
    for point in &points {
        assert_eq!(point["a0"], -2.0 * point["m0"]);
    }
}

#[test]
fn linear_range_expansion_is_inclusive() {
    let values = expand_range(
        &[json!(0.0), json!(10.0), json!(5)],
        Distribution::Linear,
        "m0",
    )
    .expect("expand");
    let numbers: Vec<f64> = values.iter().map(|v| v.as_f64().unwrap()).collect();
    assert_eq!(numbers, vec![0.0, 2.5, 5.0, 7.5, 10.0]);
}

#[test]
fn log10_range_bounds_are_exponents() {
    let values = expand_range(&[json!(0), json!(2), json!(3)], Distribution::Log10, "m0")
        .expect("expand");
    let numbers: Vec<f64> = values.iter().map(|v| v.as_f64().unwrap()).collect();
    assert!((numbers[0] - 1.0).abs() < 1e-9);
    assert!((numbers[1] - 10.0).abs() < 1e-9);
    assert!((numbers[2] - 100.0).abs() < 1e-9);
}

#[test]
fn geometric_range_multiplies_evenly() {
    let values = expand_range(&[json!(1), json!(8), json!(4)], Distribution::Geometric, "m0")
        .expect("expand");
    let numbers: Vec<f64> = values.iter().map(|v| v.as_f64().unwrap()).collect();
    for (actual, expected) in numbers.iter().zip([1.0, 2.0, 4.0, 8.0]) {
        assert!((actual - expected).abs() < 1e-9);
    }
}

#[test]
fn geometric_range_rejects_sign_changes() {
    let err = expand_range(&[json!(-1), json!(8), json!(4)], Distribution::Geometric, "m0")
        .expect_err("must fail");
    assert_eq!(err.info().code, "bad-scan-range");
}

#[test]
fn range_bounds_may_be_expressions() {
    let values = expand_range(
        &[json!("10^2"), json!("2 * 100"), json!(2)],
        Distribution::Linear,
        "m0",
    )
    .expect("expand");
    let numbers: Vec<f64> = values.iter().map(|v| v.as_f64().unwrap()).collect();
    assert_eq!(numbers, vec![100.0, 200.0]);
}

#[test]
fn single_count_range_collapses_to_start() {
    let values = expand_range(&[json!(5), json!(9), json!(1)], Distribution::Linear, "m0")
        .expect("expand");
    assert_eq!(values.len(), 1);
    assert_eq!(values[0].as_f64(), Some(5.0));
}

#[test]
fn draw_respects_bounds_and_resolves_dependents() {
    let config = config(vec![
        line(1, "x", LineValue::Random { random: [0.0, 1.0] }),
        line(
            2,
            "y",
            LineValue::Dependent {
                dependent: "x * 10".to_string(),
            },
        ),
    ]);
    let space = ScanSpace::from_config(&config).expect("space");
    let mut rng = RngHandle::from_seed(7);
    for _ in 0..100 {
        let point = space.draw(&mut rng).expect("draw");
        assert!((0.0..1.0).contains(&point["x"]));
        assert_eq!(point["y"], point["x"] * 10.0);
    }
}
