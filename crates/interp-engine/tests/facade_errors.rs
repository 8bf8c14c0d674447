mod common;

use common::engine;
use interp_engine::{
    interpret, Interpretation, InterpError, InterpretationEngine, RuleTable, SectionKind,
    StatisticalResult, FALLBACK_MESSAGE,
};
use serde_json::json;

const CUSTOM_TABLE: &str = r#"
methods:
  - id: sign-test
    name: Sign test
    metrics:
      - key: p_value
        label: p-value
        role: {type: p_value}
        section: statistical
        required: true
      - key: positive_share
        label: Share of positive differences
        role: {type: percentage}
        section: practical
    thresholds:
      alpha: 0.01
"#;

#[test]
fn unknown_method_fails_without_partial_output() {
    let err = interpret("not-a-real-method", &StatisticalResult::new()).unwrap_err();
    assert!(matches!(err, InterpError::UnknownMethod(_)));
    assert!(err.is_fatal());
}

#[test]
fn method_is_resolved_before_the_result_is_checked() {
    let err = engine()
        .interpret_value("not-a-real-method", &json!(42))
        .unwrap_err();
    assert!(matches!(err, InterpError::UnknownMethod(_)));
}

#[test]
fn non_mappings_are_invalid_results() {
    let engine = engine();
    for value in [json!(null), json!([0.01, 0.5]), json!("p = .01"), json!(3.5)] {
        let err = engine.interpret_value("paired-t-test", &value).unwrap_err();
        assert!(matches!(err, InterpError::InvalidResult(_)), "{value}");
    }
    let err = engine
        .interpret_json("paired-t-test", b"{\"p_value\": 0.01")
        .unwrap_err();
    assert!(matches!(err, InterpError::InvalidResult(_)));
    assert!(err.is_fatal());
}

#[test]
fn json_bytes_and_values_agree() -> Result<(), InterpError> {
    let engine = engine();
    let bytes = br#"{"t_statistic": 3.1, "p_value": 0.004, "n": 25, "cohens_d": 0.62}"#;
    let from_bytes = engine.interpret_json("paired-t-test", bytes)?;
    let from_value = engine.interpret_value(
        "paired-t-test",
        &json!({"t_statistic": 3.1, "p_value": 0.004, "n": 25, "cohens_d": 0.62}),
    )?;
    assert_eq!(from_bytes.digest()?, from_value.digest()?);
    Ok(())
}

#[test]
fn fatal_errors_become_fallbacks() {
    let engine = engine();
    let unknown = engine.interpret_or_fallback("not-a-real-method", &json!({}));
    let Interpretation::Fallback(fallback) = &unknown else {
        panic!("expected fallback, got {unknown:?}");
    };
    assert_eq!(fallback.method_id, "not-a-real-method");
    assert_eq!(fallback.code, "unknown_method");
    assert_eq!(fallback.message, FALLBACK_MESSAGE);

    let invalid = engine.interpret_or_fallback("paired-t-test", &json!([1, 2]));
    assert!(invalid.is_fallback());
    assert!(invalid.interpreted().is_none());

    let encoded = serde_json::to_value(&unknown).unwrap();
    assert_eq!(encoded["status"], "fallback");
    assert_eq!(encoded["message"], FALLBACK_MESSAGE);
}

#[test]
fn data_anomalies_never_fall_back() {
    let outcome = engine().interpret_or_fallback(
        "paired-t-test",
        &json!({"t_statistic": "large", "p_value": 7, "cohens_d": null}),
    );
    let result = outcome.interpreted().unwrap();
    assert!(!result.empty);
    assert!(!result.texts(SectionKind::Caveats).is_empty());
}

#[test]
fn injected_tables_drive_routing_and_thresholds() -> Result<(), InterpError> {
    let table = RuleTable::from_yaml_slice(CUSTOM_TABLE.as_bytes())?;
    let engine = InterpretationEngine::new(&table);
    let result = engine.interpret_value(
        "sign-test",
        &json!({"p_value": 0.03, "positive_share": 0.625}),
    )?;
    assert_eq!(result.method_name, "Sign test");
    assert_eq!(
        result.texts(SectionKind::Statistical),
        vec!["p-value: p = .030, not statistically significant at α = .01."]
    );
    assert_eq!(
        result.texts(SectionKind::Practical),
        vec!["Share of positive differences: 62.5%."]
    );

    let err = engine
        .interpret_value("paired-t-test", &json!({}))
        .unwrap_err();
    assert!(matches!(err, InterpError::UnknownMethod(_)));
    Ok(())
}
