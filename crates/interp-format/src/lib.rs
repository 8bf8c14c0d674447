#![deny(missing_docs)]
#![doc = "Pure formatting rules for p-values, effect sizes, test statistics and percentages."]

/// Numeric domains and effect size kinds.
pub mod domain;
/// Number formatting helpers.
pub mod numbers;
/// Significance classification.
pub mod significance;

pub use domain::{check_domain, Domain, EffectSizeKind};
pub use numbers::{
    format_count, format_degrees_of_freedom, format_effect_size, format_p_clause,
    format_p_clause_at, format_p_value, format_percentage, format_statistic, format_threshold,
    NOT_AVAILABLE, P_FLOOR, P_MAX_DECIMALS,
};
pub use significance::{is_borderline, significance_label, Significance, BOUNDARY_TOLERANCE};
