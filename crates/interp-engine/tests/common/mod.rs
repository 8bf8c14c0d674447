#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;

use interp_engine::{InterpretationEngine, MetricValue, SectionKind};
use interp_engine::InterpretationResult;
use serde_json::Value;

pub fn engine() -> InterpretationEngine<'static> {
    InterpretationEngine::builtin().unwrap()
}

pub fn fixture(name: &str) -> Value {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(format!("{name}.json"));
    let bytes = fs::read(&path).unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn nested(value: Value) -> MetricValue {
    MetricValue::from(&value)
}

pub fn texts(result: &InterpretationResult, kind: SectionKind) -> Vec<String> {
    result
        .texts(kind)
        .into_iter()
        .map(str::to_string)
        .collect()
}

pub fn contains_text(result: &InterpretationResult, kind: SectionKind, needle: &str) -> bool {
    result.texts(kind).iter().any(|text| text.contains(needle))
}
