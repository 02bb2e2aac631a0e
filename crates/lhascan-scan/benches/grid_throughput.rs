use criterion::{criterion_group, criterion_main, Criterion};
use lhascan_lha::{Block, LineValue, ParameterLine};
use lhascan_scan::space::ScanSpace;
use lhascan_scan::{RunnerConfig, ScanConfig};
use serde_json::json;

fn sample_config() -> ScanConfig {
    let axis = |id: i64, name: &str| ParameterLine {
        id: Some(id),
        parameter: Some(name.to_string()),
        comment: None,
        value: LineValue::Explicit {
            values: (0..10).map(|i| json!(i as f64)).collect(),
        },
    };
    ScanConfig {
        blocks: vec![Block {
            block: "MINPAR".to_string(),
            lines: vec![
                axis(1, "m0"),
                axis(2, "m12"),
                axis(3, "tanb"),
                ParameterLine {
                    id: Some(4),
                    parameter: Some("a0".to_string()),
                    comment: None,
                    value: LineValue::Dependent {
                        dependent: "-2 * m0 + sqrt(tanb + 1)".to_string(),
                    },
                },
            ],
        }],
        runner: RunnerConfig::default(),
        getblocks: Vec::new(),
    }
}

fn bench_grid(c: &mut Criterion) {
    let config = sample_config();
    let space = ScanSpace::from_config(&config).expect("space");
    c.bench_function("grid_expand_resolve_1k", |b| {
        b.iter(|| space.build_grid().expect("grid"))
    });
}

criterion_group!(benches, bench_grid);
criterion_main!(benches);
