use interp_format::{
    format_effect_size, format_p_value, is_borderline, significance_label, EffectSizeKind,
    Significance, NOT_AVAILABLE,
};
use proptest::prelude::*;

#[test]
fn labels_cover_all_three_verdicts() {
    assert_eq!(significance_label(Some(0.01), 0.05), Significance::Significant);
    assert_eq!(significance_label(Some(0.05), 0.05), Significance::NotSignificant);
    assert_eq!(significance_label(Some(0.3), 0.05), Significance::NotSignificant);
    assert_eq!(significance_label(None, 0.05), Significance::Undetermined);
    assert_eq!(significance_label(Some(f64::NAN), 0.05), Significance::Undetermined);
}

#[test]
fn labels_serialize_in_kebab_case() {
    let json = serde_json::to_string(&Significance::NotSignificant).unwrap();
    assert_eq!(json, "\"not-significant\"");
    assert_eq!(Significance::Undetermined.to_string(), "undetermined");
}

#[test]
fn borderline_window_is_inclusive() {
    assert!(is_borderline(Some(0.048), 0.05, 0.005));
    assert!(is_borderline(Some(0.045), 0.05, 0.005));
    assert!(is_borderline(Some(0.055), 0.05, 0.005));
    assert!(!is_borderline(Some(0.044), 0.05, 0.005));
    assert!(!is_borderline(Some(0.2), 0.05, 0.005));
    assert!(!is_borderline(None, 0.05, 0.005));
}

proptest! {
    #[test]
    fn valid_p_values_never_render_as_absent(p in 0.0f64..=1.0) {
        let rendered = format_p_value(Some(p)).unwrap();
        prop_assert_ne!(rendered.as_str(), NOT_AVAILABLE);
        prop_assert!(rendered.starts_with('<') || rendered.starts_with('.') || rendered == "1.000");
    }

    #[test]
    fn effect_sizes_never_render_negative_zero(value in -0.01f64..0.01) {
        let rendered = format_effect_size(Some(value), EffectSizeKind::CohensD).unwrap();
        prop_assert_ne!(rendered.as_str(), "-0.00");
    }

    #[test]
    fn present_p_values_are_never_undetermined(p in 0.0f64..=1.0, alpha in 0.001f64..0.2) {
        prop_assert_ne!(significance_label(Some(p), alpha), Significance::Undetermined);
    }
}
