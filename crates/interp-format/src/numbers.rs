use interp_core::errors::InterpError;

use crate::domain::{check_domain, Domain, EffectSizeKind};

/// Token rendered in place of any value that was not reported.
pub const NOT_AVAILABLE: &str = "not available";

/// Smallest p-value rendered exactly; anything below renders as `"< .001"`.
pub const P_FLOOR: f64 = 0.001;

fn present(value: Option<f64>) -> Option<f64> {
    value.filter(|value| !value.is_nan())
}

/// Fixed-point rendering that never produces a negative zero.
fn fixed(value: f64, decimals: usize) -> String {
    let rendered = format!("{:.*}", decimals, value);
    match rendered.strip_prefix('-') {
        Some(rest) if rest.chars().all(|c| c == '0' || c == '.') => rest.to_string(),
        _ => rendered,
    }
}

fn strip_leading_zero(rendered: String) -> String {
    match rendered.strip_prefix("0.") {
        Some(rest) => format!(".{rest}"),
        None => rendered,
    }
}

/// Formats a p-value in APA style.
///
/// Absent and `NaN` inputs render as [`NOT_AVAILABLE`]; values below [`P_FLOOR`]
/// render as `"< .001"`; everything else is rounded to three decimals without a
/// leading zero. Values outside `[0, 1]` are [`InterpError::InvalidMetric`].
pub fn format_p_value(p: Option<f64>) -> Result<String, InterpError> {
    let Some(p) = present(p) else {
        return Ok(NOT_AVAILABLE.to_string());
    };
    check_domain(Domain::Probability, p)?;
    if p < P_FLOOR {
        return Ok("< .001".to_string());
    }
    Ok(strip_leading_zero(fixed(p, 3)))
}

/// Renders `"p = .012"`, `"p < .001"` or `"p not available"`.
pub fn format_p_clause(p: Option<f64>) -> Result<String, InterpError> {
    let rendered = format_p_value(p)?;
    Ok(if rendered == NOT_AVAILABLE {
        format!("p {NOT_AVAILABLE}")
    } else if rendered.starts_with('<') {
        format!("p {rendered}")
    } else {
        format!("p = {rendered}")
    })
}

/// Most decimals a p-value is widened to when three would put it on the wrong side of α.
pub const P_MAX_DECIMALS: usize = 6;

/// Like [`format_p_clause`], but the shown value always sits on the same side of `alpha`
/// as the raw one: `0.0496` against `.05` renders as `"p = .0496"`, not `"p = .050"`.
pub fn format_p_clause_at(p: Option<f64>, alpha: f64) -> Result<String, InterpError> {
    let clause = format_p_clause(p)?;
    let Some(p) = present(p).filter(|p| *p >= P_FLOOR) else {
        return Ok(clause);
    };
    let below = p < alpha;
    for decimals in 3..=P_MAX_DECIMALS {
        let rendered = fixed(p, decimals);
        let shown = rendered.parse::<f64>().unwrap_or(p);
        if (shown < alpha) == below {
            return Ok(format!("p = {}", strip_leading_zero(rendered)));
        }
    }
    Ok(if below {
        format!("p < {}", format_threshold(alpha))
    } else {
        clause
    })
}

/// Formats an effect size with two decimals. Zero renders as `"0.00"`.
pub fn format_effect_size(value: Option<f64>, kind: EffectSizeKind) -> Result<String, InterpError> {
    let Some(value) = present(value) else {
        return Ok(NOT_AVAILABLE.to_string());
    };
    check_domain(kind.domain(), value)?;
    Ok(fixed(value, 2))
}

/// Formats a proportion in `[0, 1]` as a percentage with one decimal. Zero renders as `"0.0%"`.
pub fn format_percentage(value: Option<f64>) -> Result<String, InterpError> {
    let Some(value) = present(value) else {
        return Ok(NOT_AVAILABLE.to_string());
    };
    check_domain(Domain::Proportion, value)?;
    Ok(format!("{}%", fixed(value * 100.0, 1)))
}

/// Formats a test statistic or estimate with two decimals.
pub fn format_statistic(value: Option<f64>) -> Result<String, InterpError> {
    let Some(value) = present(value) else {
        return Ok(NOT_AVAILABLE.to_string());
    };
    check_domain(Domain::Finite, value)?;
    Ok(fixed(value, 2))
}

/// Formats a non-negative count as an integer.
pub fn format_count(value: Option<f64>) -> Result<String, InterpError> {
    let Some(value) = present(value) else {
        return Ok(NOT_AVAILABLE.to_string());
    };
    check_domain(Domain::NonNegative, value)?;
    Ok(fixed(value.round(), 0))
}

/// Formats degrees of freedom: whole values as integers, fractional (Welch) values
/// with two decimals.
pub fn format_degrees_of_freedom(value: Option<f64>) -> Result<String, InterpError> {
    let Some(value) = present(value) else {
        return Ok(NOT_AVAILABLE.to_string());
    };
    check_domain(Domain::NonNegative, value)?;
    if (value - value.round()).abs() < 1e-9 {
        Ok(fixed(value.round(), 0))
    } else {
        Ok(fixed(value, 2))
    }
}

/// Formats a threshold such as α without trailing zeros: `0.05` → `".05"`.
pub fn format_threshold(value: f64) -> String {
    let rendered = fixed(value, 4);
    let trimmed = if rendered.contains('.') {
        rendered.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        rendered
    };
    strip_leading_zero(trimmed)
}
