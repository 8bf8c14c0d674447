use std::fmt;

use serde::{Deserialize, Serialize};

/// Absorbs binary rounding when comparing `|p - alpha|` against an epsilon.
pub const BOUNDARY_TOLERANCE: f64 = 1e-12;

/// Three-way significance verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Significance {
    /// `p < alpha`.
    Significant,
    /// `p >= alpha`.
    NotSignificant,
    /// The p-value is absent or `NaN`.
    Undetermined,
}

impl Significance {
    /// Stable label used in serialized output.
    pub fn as_str(self) -> &'static str {
        match self {
            Significance::Significant => "significant",
            Significance::NotSignificant => "not-significant",
            Significance::Undetermined => "undetermined",
        }
    }
}

impl fmt::Display for Significance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifies `p` against `alpha`. Never defaults an absent p-value to not-significant.
pub fn significance_label(p: Option<f64>, alpha: f64) -> Significance {
    match p.filter(|p| !p.is_nan()) {
        None => Significance::Undetermined,
        Some(p) if p < alpha => Significance::Significant,
        Some(_) => Significance::NotSignificant,
    }
}

/// Returns whether `p` lies within `alpha ± epsilon`.
pub fn is_borderline(p: Option<f64>, alpha: f64, epsilon: f64) -> bool {
    match p.filter(|p| p.is_finite()) {
        Some(p) => (p - alpha).abs() <= epsilon + BOUNDARY_TOLERANCE,
        None => false,
    }
}
