use interp_core::errors::InterpError;
use interp_format::{
    format_count, format_degrees_of_freedom, format_effect_size, format_p_clause,
    format_p_clause_at, format_p_value, format_percentage, format_statistic, format_threshold, EffectSizeKind, NOT_AVAILABLE,
};

#[test]
fn p_values_follow_apa_style() -> Result<(), InterpError> {
    assert_eq!(format_p_value(Some(0.0004))?, "< .001");
    assert_eq!(format_p_value(Some(0.0))?, "< .001");
    assert_eq!(format_p_value(Some(0.452))?, ".452");
    assert_eq!(format_p_value(Some(0.001))?, ".001");
    assert_eq!(format_p_value(Some(1.0))?, "1.000");
    Ok(())
}

#[test]
fn absent_p_values_render_the_fixed_token() -> Result<(), InterpError> {
    assert_eq!(format_p_value(None)?, NOT_AVAILABLE);
    assert_eq!(format_p_value(Some(f64::NAN))?, NOT_AVAILABLE);
    assert!(!NOT_AVAILABLE.chars().any(|c| c.is_ascii_digit()));
    Ok(())
}

#[test]
fn out_of_range_p_values_are_invalid_metrics() {
    for p in [-0.01, 1.2, f64::INFINITY] {
        let err = format_p_value(Some(p)).unwrap_err();
        assert!(matches!(err, InterpError::InvalidMetric(_)), "p = {p}");
    }
}

#[test]
fn p_clauses_choose_the_right_operator() -> Result<(), InterpError> {
    assert_eq!(format_p_clause(Some(0.012))?, "p = .012");
    assert_eq!(format_p_clause(Some(0.0001))?, "p < .001");
    assert_eq!(format_p_clause(None)?, "p not available");
    Ok(())
}

#[test]
fn p_clauses_never_round_across_alpha() -> Result<(), InterpError> {
    assert_eq!(format_p_clause_at(Some(0.0496), 0.05)?, "p = .0496");
    assert_eq!(format_p_clause_at(Some(0.04999), 0.05)?, "p = .04999");
    assert_eq!(format_p_clause_at(Some(0.0499999999), 0.05)?, "p < .05");
    assert_eq!(format_p_clause_at(Some(0.05), 0.05)?, "p = .050");
    assert_eq!(format_p_clause_at(Some(0.012), 0.05)?, "p = .012");
    assert_eq!(format_p_clause_at(Some(0.0004), 0.05)?, "p < .001");
    assert_eq!(format_p_clause_at(None, 0.05)?, "p not available");
    assert!(format_p_clause_at(Some(1.3), 0.05).is_err());
    Ok(())
}

#[test]
fn zero_effect_sizes_render_literally() -> Result<(), InterpError> {
    assert_eq!(format_effect_size(Some(0.0), EffectSizeKind::CohensD)?, "0.00");
    assert_eq!(format_effect_size(Some(-0.0), EffectSizeKind::CohensD)?, "0.00");
    assert_eq!(format_effect_size(Some(-0.001), EffectSizeKind::CohensD)?, "0.00");
    assert_eq!(format_effect_size(None, EffectSizeKind::CohensD)?, NOT_AVAILABLE);
    assert_eq!(format_effect_size(Some(0.5), EffectSizeKind::EtaSquared)?, "0.50");
    assert_eq!(format_effect_size(Some(-0.8), EffectSizeKind::CorrelationR)?, "-0.80");
    Ok(())
}

#[test]
fn effect_sizes_respect_their_kind_domain() {
    assert!(format_effect_size(Some(1.2), EffectSizeKind::EtaSquared).is_err());
    assert!(format_effect_size(Some(-1.5), EffectSizeKind::CorrelationR).is_err());
    assert!(format_effect_size(Some(-0.5), EffectSizeKind::OddsRatio).is_err());
    assert!(format_effect_size(Some(3.5), EffectSizeKind::CohensD).is_ok());
}

#[test]
fn percentages_distinguish_zero_from_absent() -> Result<(), InterpError> {
    assert_eq!(format_percentage(Some(0.0))?, "0.0%");
    assert_eq!(format_percentage(None)?, NOT_AVAILABLE);
    assert_eq!(format_percentage(Some(f64::NAN))?, NOT_AVAILABLE);
    assert_eq!(format_percentage(Some(0.85))?, "85.0%");
    assert_eq!(format_percentage(Some(1.0))?, "100.0%");
    assert!(format_percentage(Some(1.5)).is_err());
    Ok(())
}

#[test]
fn statistics_counts_and_thresholds() -> Result<(), InterpError> {
    assert_eq!(format_statistic(Some(2.3141))?, "2.31");
    assert!(format_statistic(Some(f64::NEG_INFINITY)).is_err());
    assert_eq!(format_count(Some(30.0))?, "30");
    assert!(format_count(Some(-1.0)).is_err());
    assert_eq!(format_degrees_of_freedom(Some(14.0))?, "14");
    assert_eq!(format_degrees_of_freedom(Some(13.47))?, "13.47");
    assert_eq!(format_threshold(0.05), ".05");
    assert_eq!(format_threshold(0.005), ".005");
    assert_eq!(format_threshold(0.1), ".1");
    Ok(())
}
