use interp_core::errors::InterpError;
use serde::{Deserialize, Serialize};

/// Numeric domain a formatter accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    /// Probability in `[0, 1]`.
    Probability,
    /// Proportion in `[0, 1]`, rendered as a percentage.
    Proportion,
    /// Correlation coefficient in `[-1, 1]`.
    Correlation,
    /// Any finite value `>= 0`.
    NonNegative,
    /// Any finite value.
    Finite,
}

impl Domain {
    /// Stable name used in error context.
    pub fn name(self) -> &'static str {
        match self {
            Domain::Probability => "probability",
            Domain::Proportion => "proportion",
            Domain::Correlation => "correlation",
            Domain::NonNegative => "non_negative",
            Domain::Finite => "finite",
        }
    }

    /// Returns whether `value` lies inside the domain.
    pub fn contains(self, value: f64) -> bool {
        if !value.is_finite() {
            return false;
        }
        match self {
            Domain::Probability | Domain::Proportion => (0.0..=1.0).contains(&value),
            Domain::Correlation => (-1.0..=1.0).contains(&value),
            Domain::NonNegative => value >= 0.0,
            Domain::Finite => true,
        }
    }
}

/// Validates a present value against `domain` without formatting it.
///
/// `NaN` is not a domain violation: callers treat it as absent before reaching here.
pub fn check_domain(domain: Domain, value: f64) -> Result<f64, InterpError> {
    if value.is_nan() || domain.contains(value) {
        Ok(value)
    } else {
        Err(InterpError::invalid_metric(domain.name(), value))
    }
}

/// Effect size families with their reporting symbol and valid domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectSizeKind {
    /// Standardized mean difference.
    CohensD,
    /// Bias-corrected standardized mean difference.
    HedgesG,
    /// Proportion of variance explained.
    EtaSquared,
    /// Proportion of variance explained, partialled over other factors.
    PartialEtaSquared,
    /// Coefficient of determination.
    RSquared,
    /// Association strength for contingency tables.
    CramersV,
    /// Correlation-type effect size.
    CorrelationR,
    /// Odds ratio.
    OddsRatio,
}

impl EffectSizeKind {
    /// Domain of valid values for the kind.
    pub fn domain(self) -> Domain {
        match self {
            EffectSizeKind::CohensD | EffectSizeKind::HedgesG => Domain::Finite,
            EffectSizeKind::EtaSquared
            | EffectSizeKind::PartialEtaSquared
            | EffectSizeKind::RSquared
            | EffectSizeKind::CramersV => Domain::Proportion,
            EffectSizeKind::CorrelationR => Domain::Correlation,
            EffectSizeKind::OddsRatio => Domain::NonNegative,
        }
    }

    /// Conventional reporting symbol.
    pub fn symbol(self) -> &'static str {
        match self {
            EffectSizeKind::CohensD => "d",
            EffectSizeKind::HedgesG => "g",
            EffectSizeKind::EtaSquared => "η²",
            EffectSizeKind::PartialEtaSquared => "ηp²",
            EffectSizeKind::RSquared => "R²",
            EffectSizeKind::CramersV => "V",
            EffectSizeKind::CorrelationR => "r",
            EffectSizeKind::OddsRatio => "OR",
        }
    }
}
