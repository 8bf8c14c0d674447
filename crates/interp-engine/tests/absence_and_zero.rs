mod common;

use common::{engine, fixture, texts};
use interp_engine::{
    FragmentSource, GuardId, InterpError, MetricValue, SectionKind, StatisticalResult,
};
use serde_json::json;

const ACCURACY_METHODS: [&str; 2] = ["logistic-regression", "discriminant-analysis"];

fn base() -> StatisticalResult {
    StatisticalResult::new()
        .with("wilks_lambda", 0.62)
        .with("chi_square", 18.4)
        .with("p_value", 0.01)
        .with("n", 120.0)
}

#[test]
fn absent_and_zero_accuracy_never_share_a_message() -> Result<(), InterpError> {
    let engine = engine();
    for method in ACCURACY_METHODS {
        let absent = engine.interpret(method, &base())?;
        let zero = engine.interpret(method, &base().with("accuracy", 0.0))?;

        let absent_practical = texts(&absent, SectionKind::Practical);
        let zero_practical = texts(&zero, SectionKind::Practical);
        assert_ne!(absent_practical, zero_practical, "{method}");

        let zero_line = zero_practical
            .iter()
            .find(|text| text.starts_with("Classification accuracy"))
            .unwrap();
        assert!(zero_line.contains("0.0%"), "{zero_line}");
        assert!(zero_line.contains("exactly zero"));

        let absent_line = absent_practical
            .iter()
            .find(|text| text.starts_with("Classification accuracy"))
            .unwrap();
        assert!(!absent_line.contains('%'), "{absent_line}");
        assert!(absent_line.contains("was not reported"));
        assert!(absent_line.contains("does not indicate poor performance"));
    }
    Ok(())
}

#[test]
fn zero_and_absent_fragments_name_their_guards() -> Result<(), InterpError> {
    let engine = engine();
    let absent = engine.interpret("discriminant-analysis", &base())?;
    let zero = engine.interpret("discriminant-analysis", &base().with("accuracy", 0.0))?;
    let source_of = |result: &interp_engine::InterpretationResult| {
        result
            .section(SectionKind::Practical)
            .unwrap()
            .fragments
            .iter()
            .find(|fragment| fragment.text.starts_with("Classification accuracy"))
            .map(|fragment| fragment.source.clone())
            .unwrap()
    };
    assert_eq!(
        source_of(&absent),
        FragmentSource::Guard {
            guard: GuardId::UndefinedCriticalMetric,
            metric: Some("accuracy".to_string()),
        }
    );
    assert_eq!(
        source_of(&zero),
        FragmentSource::Guard {
            guard: GuardId::ZeroValue,
            metric: Some("accuracy".to_string()),
        }
    );
    Ok(())
}

#[test]
fn nan_null_and_missing_are_the_same_absence() -> Result<(), InterpError> {
    let engine = engine();
    let missing = engine.interpret("logistic-regression", &base())?;
    let nan = engine.interpret(
        "logistic-regression",
        &base().with("accuracy", MetricValue::Number(f64::NAN)),
    )?;
    let null = engine.interpret_value(
        "logistic-regression",
        &json!({"wilks_lambda": 0.62, "chi_square": 18.4, "p_value": 0.01, "n": 120, "accuracy": null}),
    )?;
    assert_eq!(missing.to_bytes()?, nan.to_bytes()?);
    assert_eq!(
        texts(&missing, SectionKind::Practical),
        texts(&null, SectionKind::Practical)
    );
    Ok(())
}

#[test]
fn present_accuracy_renders_as_percentage() -> Result<(), InterpError> {
    let result = engine().interpret("logistic-regression", &base().with("accuracy", 0.84))?;
    assert!(texts(&result, SectionKind::Practical)
        .contains(&"Classification accuracy: 84.0%.".to_string()));
    Ok(())
}

#[test]
fn fixture_without_accuracy_still_reports_cross_validation() -> Result<(), InterpError> {
    let result = engine().interpret_value("discriminant-analysis", &fixture("discriminant_analysis"))?;
    let practical = texts(&result, SectionKind::Practical);
    assert_eq!(
        practical,
        vec![
            "Classification accuracy was not reported for this analysis. This does not indicate poor performance; the value could not be computed.".to_string(),
            "Cross-validated accuracy: 71.0%.".to_string(),
        ]
    );
    assert_eq!(result.diagnostics.excluded, vec!["eigenvalues".to_string()]);
    Ok(())
}

#[test]
fn flagged_effect_sizes_get_the_accuracy_treatment() -> Result<(), InterpError> {
    let engine = engine();
    let model = || {
        StatisticalResult::new()
            .with("f_statistic", 12.5)
            .with("p_value", 0.0001)
            .with("n", 80.0)
    };
    let absent = engine.interpret("linear-regression", &model())?;
    assert!(texts(&absent, SectionKind::Practical).contains(
        &"R squared was not reported for this analysis. This does not indicate poor performance; the value could not be computed."
            .to_string()
    ));
    assert!(!absent.diagnostics.unreported.contains(&"r_squared".to_string()));

    let zero = engine.interpret("linear-regression", &model().with("r_squared", 0.0))?;
    assert!(texts(&zero, SectionKind::Practical).contains(
        &"R squared is 0.00: the value was computed and is exactly zero, which is different from a missing value."
            .to_string()
    ));
    Ok(())
}
