use std::fs;
use std::path::PathBuf;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use interp_engine::{InterpretationEngine, StatisticalResult};
use serde_json::Value;

fn fixture(name: &str) -> Value {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(format!("{name}.json"));
    let bytes = fs::read(path).expect("fixture");
    serde_json::from_slice(&bytes).expect("decode fixture")
}

fn bench_interpret(c: &mut Criterion) {
    let engine = InterpretationEngine::builtin().expect("builtin table");
    let t_test = StatisticalResult::from_json_value(&fixture("independent_t_test")).expect("t-test");
    let lda = StatisticalResult::from_json_value(&fixture("discriminant_analysis")).expect("lda");

    c.bench_function("interpret_independent_t_test", |b| {
        b.iter(|| {
            let result = engine
                .interpret("independent-t-test", black_box(&t_test))
                .expect("interpret");
            black_box(result);
        });
    });
    c.bench_function("interpret_discriminant_analysis", |b| {
        b.iter(|| {
            let result = engine
                .interpret("discriminant-analysis", black_box(&lda))
                .expect("interpret");
            black_box(result);
        });
    });
    c.bench_function("interpret_and_digest", |b| {
        b.iter(|| {
            let result = engine
                .interpret("independent-t-test", black_box(&t_test))
                .expect("interpret");
            black_box(result.digest().expect("digest"));
        });
    });
}

criterion_group!(benches, bench_interpret);
criterion_main!(benches);
