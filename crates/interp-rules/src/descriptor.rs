use std::collections::BTreeSet;

use interp_core::errors::{ErrorInfo, InterpError};
use interp_format::{Domain, EffectSizeKind};
use serde::{Deserialize, Serialize};

fn descriptor_error(descriptor: &str, code: &str, message: impl Into<String>) -> InterpError {
    InterpError::Config(ErrorInfo::new(code, message).with_context("method_id", descriptor))
}

/// Output bucket grouping fragments by audience concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    /// Primary inferential statistics and anything that changes how they read.
    Statistical,
    /// Practical magnitude: effect sizes, accuracy, estimates.
    Practical,
    /// Secondary notes and data anomalies.
    Caveats,
}

impl SectionKind {
    /// Declared order used when a descriptor does not override it.
    pub const DEFAULT_ORDER: [SectionKind; 3] = [
        SectionKind::Statistical,
        SectionKind::Practical,
        SectionKind::Caveats,
    ];

    /// Stable lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            SectionKind::Statistical => "statistical",
            SectionKind::Practical => "practical",
            SectionKind::Caveats => "caveats",
        }
    }

    /// Heading used by plain-text rendering.
    pub fn title(self) -> &'static str {
        match self {
            SectionKind::Statistical => "Statistical",
            SectionKind::Practical => "Practical",
            SectionKind::Caveats => "Caveats",
        }
    }
}

/// How a metric is shaped and rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MetricRole {
    /// Test statistic (t, F, χ², U, ...).
    Statistic,
    /// Degrees of freedom, possibly fractional.
    DegreesOfFreedom,
    /// Non-negative count such as a sample size.
    Count,
    /// Point estimate such as a mean difference.
    Estimate,
    /// Probability compared against α.
    PValue,
    /// Standardized effect size of the given kind.
    EffectSize {
        /// Effect size family.
        kind: EffectSizeKind,
    },
    /// Bounded `[0, 1]` summary metric central to the method's conclusion.
    Accuracy,
    /// Bounded `[0, 1]` proportion rendered as a percentage.
    Percentage,
    /// Nested `{statistic, p_value, violated, warning}` assumption test.
    AssumptionCheck,
    /// List of `{comparison, p_value, estimate}` post-hoc entries.
    Comparisons,
    /// Mapping of group name to `{mean, sd, n}`.
    GroupStatistics,
}

impl MetricRole {
    /// Numeric domain for scalar roles, `None` for nested roles.
    pub fn domain(self) -> Option<Domain> {
        match self {
            MetricRole::Statistic | MetricRole::Estimate => Some(Domain::Finite),
            MetricRole::DegreesOfFreedom | MetricRole::Count => Some(Domain::NonNegative),
            MetricRole::PValue => Some(Domain::Probability),
            MetricRole::EffectSize { kind } => Some(kind.domain()),
            MetricRole::Accuracy | MetricRole::Percentage => Some(Domain::Proportion),
            MetricRole::AssumptionCheck | MetricRole::Comparisons | MetricRole::GroupStatistics => {
                None
            }
        }
    }

    /// Whether the role is accuracy-like by default, i.e. considered by the
    /// undefined and zero value guards without an explicit rule flag.
    pub fn is_accuracy_like(self) -> bool {
        matches!(self, MetricRole::Accuracy)
    }
}

/// Qualitative effect magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Magnitude {
    /// Below the small band.
    Negligible,
    /// Between the small and medium bands.
    Small,
    /// Between the medium and large bands.
    Medium,
    /// At or above the large band.
    Large,
}

impl Magnitude {
    /// Lowercase adjective used in sentences.
    pub fn as_str(self) -> &'static str {
        match self {
            Magnitude::Negligible => "negligible",
            Magnitude::Small => "small",
            Magnitude::Medium => "medium",
            Magnitude::Large => "large",
        }
    }
}

/// Cut-offs classifying an effect size's absolute value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MagnitudeBands {
    /// Lower bound of a small effect.
    pub small: f64,
    /// Lower bound of a medium effect.
    pub medium: f64,
    /// Lower bound of a large effect.
    pub large: f64,
}

impl MagnitudeBands {
    /// Conventional benchmarks for the kind, if any are customary.
    pub fn conventional(kind: EffectSizeKind) -> Option<Self> {
        let (small, medium, large) = match kind {
            EffectSizeKind::CohensD | EffectSizeKind::HedgesG => (0.2, 0.5, 0.8),
            EffectSizeKind::EtaSquared | EffectSizeKind::PartialEtaSquared => (0.01, 0.06, 0.14),
            EffectSizeKind::RSquared => (0.02, 0.13, 0.26),
            EffectSizeKind::CramersV | EffectSizeKind::CorrelationR => (0.1, 0.3, 0.5),
            EffectSizeKind::OddsRatio => return None,
        };
        Some(Self {
            small,
            medium,
            large,
        })
    }

    /// Classifies the absolute value of `value`.
    pub fn classify(&self, value: f64) -> Magnitude {
        let value = value.abs();
        if value >= self.large {
            Magnitude::Large
        } else if value >= self.medium {
            Magnitude::Medium
        } else if value >= self.small {
            Magnitude::Small
        } else {
            Magnitude::Negligible
        }
    }
}

/// Declaration of one metric a method may report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRule {
    /// Key in the statistical result mapping.
    pub key: String,
    /// Sentence-case label used in output text.
    pub label: String,
    /// Shape and rendering class.
    pub role: MetricRole,
    /// Section the metric is routed to by default.
    pub section: SectionKind,
    /// Whether absence deserves a caveat.
    #[serde(default)]
    pub required: bool,
    /// Declared but intentionally not rendered.
    #[serde(default)]
    pub excluded: bool,
    /// Treats a non-accuracy scalar as accuracy-like: absence gets the neutral
    /// message and an exact zero the literal one.
    #[serde(default)]
    pub accuracy_like: bool,
    /// Magnitude cut-offs overriding the conventional ones.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bands: Option<MagnitudeBands>,
}

impl MetricRule {
    /// Declares an optional, rendered metric.
    pub fn new(
        key: impl Into<String>,
        label: impl Into<String>,
        role: MetricRole,
        section: SectionKind,
    ) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            role,
            section,
            required: false,
            excluded: false,
            accuracy_like: false,
            bands: None,
        }
    }

    /// Marks the metric as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Marks the metric as explicitly excluded from rendering.
    pub fn excluded(mut self) -> Self {
        self.excluded = true;
        self
    }

    /// Marks the metric as accuracy-like regardless of its role.
    pub fn accuracy_like(mut self) -> Self {
        self.accuracy_like = true;
        self
    }

    /// Whether the undefined and zero value guards apply to this metric.
    pub fn is_accuracy_like(&self) -> bool {
        self.accuracy_like || self.role.is_accuracy_like()
    }

    /// Overrides the magnitude cut-offs.
    pub fn with_bands(mut self, bands: MagnitudeBands) -> Self {
        self.bands = Some(bands);
        self
    }

    /// Cut-offs in force for effect-size metrics.
    pub fn magnitude_bands(&self) -> Option<MagnitudeBands> {
        match self.role {
            MetricRole::EffectSize { kind } => {
                self.bands.or_else(|| MagnitudeBands::conventional(kind))
            }
            _ => None,
        }
    }
}

/// Identifiers of the guards a descriptor may schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardId {
    /// Caveat for required metrics that were not reported.
    RequiredMetrics,
    /// Neutralizes values outside their role's domain.
    RangeCheck,
    /// Neutral message for an absent accuracy-like metric.
    UndefinedCriticalMetric,
    /// Literal zero message for an accuracy-like metric equal to zero.
    ZeroValue,
    /// Moves violated assumption warnings into the statistical section.
    AssumptionRelocation,
    /// Borderline qualifier for p-values near α.
    BoundarySignificance,
    /// Caveat when the sample is below the declared minimum.
    SmallSample,
}

impl GuardId {
    /// Canonical order used when a descriptor does not declare its own.
    pub const STANDARD_ORDER: [GuardId; 7] = [
        GuardId::RequiredMetrics,
        GuardId::RangeCheck,
        GuardId::UndefinedCriticalMetric,
        GuardId::ZeroValue,
        GuardId::AssumptionRelocation,
        GuardId::BoundarySignificance,
        GuardId::SmallSample,
    ];

    /// Stable snake_case name.
    pub fn as_str(self) -> &'static str {
        match self {
            GuardId::RequiredMetrics => "required_metrics",
            GuardId::RangeCheck => "range_check",
            GuardId::UndefinedCriticalMetric => "undefined_critical_metric",
            GuardId::ZeroValue => "zero_value",
            GuardId::AssumptionRelocation => "assumption_relocation",
            GuardId::BoundarySignificance => "boundary_significance",
            GuardId::SmallSample => "small_sample",
        }
    }

    fn standard_order() -> Vec<GuardId> {
        Self::STANDARD_ORDER.to_vec()
    }
}

/// Significance and practical thresholds for one method.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Significance level.
    #[serde(default = "Thresholds::default_alpha")]
    pub alpha: f64,
    /// Half-width of the borderline window around `alpha`.
    #[serde(default = "Thresholds::default_borderline_epsilon")]
    pub borderline_epsilon: f64,
    /// Sample size below which estimates are flagged as unstable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_sample_size: Option<f64>,
}

impl Thresholds {
    const fn default_alpha() -> f64 {
        0.05
    }

    const fn default_borderline_epsilon() -> f64 {
        0.005
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            alpha: Self::default_alpha(),
            borderline_epsilon: Self::default_borderline_epsilon(),
            min_sample_size: None,
        }
    }
}

/// Static per-method configuration governing routing, thresholds and guard order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDescriptor {
    /// Stable method identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Sections in output order.
    #[serde(default = "MethodDescriptor::default_sections")]
    pub sections: Vec<SectionKind>,
    /// Metrics in rendering order.
    pub metrics: Vec<MetricRule>,
    /// Significance and practical thresholds.
    #[serde(default)]
    pub thresholds: Thresholds,
    /// Key of the metric holding the sample size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_size_metric: Option<String>,
    /// Guards in execution order.
    #[serde(default = "GuardId::standard_order")]
    pub guards: Vec<GuardId>,
}

impl MethodDescriptor {
    fn default_sections() -> Vec<SectionKind> {
        SectionKind::DEFAULT_ORDER.to_vec()
    }

    /// Creates a descriptor with default sections, thresholds and guard order.
    pub fn new(id: impl Into<String>, name: impl Into<String>, metrics: Vec<MetricRule>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            sections: Self::default_sections(),
            metrics,
            thresholds: Thresholds::default(),
            sample_size_metric: None,
            guards: GuardId::standard_order(),
        }
    }

    /// Replaces the guard order.
    pub fn with_guards(mut self, guards: Vec<GuardId>) -> Self {
        self.guards = guards;
        self
    }

    /// Declares the sample size metric and the minimum considered stable.
    pub fn with_sample_size(mut self, key: impl Into<String>, min: Option<f64>) -> Self {
        self.sample_size_metric = Some(key.into());
        self.thresholds.min_sample_size = min;
        self
    }

    /// Looks up a declared metric by key.
    pub fn metric(&self, key: &str) -> Option<&MetricRule> {
        self.metrics.iter().find(|rule| rule.key == key)
    }

    /// Declared metrics that are rendered, in declaration order.
    pub fn rendered_metrics(&self) -> impl Iterator<Item = &MetricRule> {
        self.metrics.iter().filter(|rule| !rule.excluded)
    }

    /// Whether the section is part of the output.
    pub fn has_section(&self, section: SectionKind) -> bool {
        self.sections.contains(&section)
    }

    /// Checks the descriptor's internal consistency.
    pub fn validate(&self) -> Result<(), InterpError> {
        let id = self.id.as_str();
        if id.trim().is_empty() {
            return Err(InterpError::config("empty_method_id", "method id must not be empty"));
        }
        if self.sections.is_empty() {
            return Err(descriptor_error(id, "no_sections", "at least one section is required"));
        }
        let mut seen_sections = BTreeSet::new();
        for section in &self.sections {
            if !seen_sections.insert(*section) {
                return Err(descriptor_error(
                    id,
                    "duplicate_section",
                    format!("section `{}` declared twice", section.as_str()),
                ));
            }
        }
        let alpha = self.thresholds.alpha;
        if !(alpha > 0.0 && alpha < 1.0) {
            return Err(descriptor_error(
                id,
                "invalid_alpha",
                format!("alpha must lie in (0, 1), got {alpha}"),
            ));
        }
        let epsilon = self.thresholds.borderline_epsilon;
        if !(epsilon.is_finite() && epsilon >= 0.0) {
            return Err(descriptor_error(
                id,
                "invalid_epsilon",
                format!("borderline epsilon must be finite and non-negative, got {epsilon}"),
            ));
        }
        if let Some(min) = self.thresholds.min_sample_size {
            if !(min.is_finite() && min >= 0.0) {
                return Err(descriptor_error(
                    id,
                    "invalid_min_sample_size",
                    format!("minimum sample size must be finite and non-negative, got {min}"),
                ));
            }
        }
        let mut seen_keys = BTreeSet::new();
        for rule in &self.metrics {
            if !seen_keys.insert(rule.key.as_str()) {
                return Err(descriptor_error(
                    id,
                    "duplicate_metric",
                    format!("metric `{}` declared twice", rule.key),
                ));
            }
            if rule.accuracy_like && rule.role.domain().is_none() {
                return Err(descriptor_error(
                    id,
                    "nested_accuracy_like",
                    format!("metric `{}` is nested and cannot be accuracy-like", rule.key),
                ));
            }
            if !self.has_section(rule.section) {
                return Err(descriptor_error(
                    id,
                    "undeclared_section",
                    format!(
                        "metric `{}` routes to undeclared section `{}`",
                        rule.key,
                        rule.section.as_str()
                    ),
                ));
            }
        }
        if let Some(key) = &self.sample_size_metric {
            if self.metric(key).is_none() {
                return Err(descriptor_error(
                    id,
                    "unknown_sample_size_metric",
                    format!("sample size metric `{key}` is not declared"),
                ));
            }
        }
        let mut seen_guards = BTreeSet::new();
        for guard in &self.guards {
            if !seen_guards.insert(*guard) {
                return Err(descriptor_error(
                    id,
                    "duplicate_guard",
                    format!("guard `{}` scheduled twice", guard.as_str()),
                ));
            }
        }
        if !self.guards.is_empty() && !self.has_section(SectionKind::Caveats) {
            return Err(descriptor_error(
                id,
                "missing_caveats_section",
                "guards emit caveats, so the caveats section must be declared",
            ));
        }
        if self.guards.contains(&GuardId::AssumptionRelocation)
            && !self.has_section(SectionKind::Statistical)
        {
            return Err(descriptor_error(
                id,
                "missing_statistical_section",
                "assumption relocation targets the statistical section",
            ));
        }
        Ok(())
    }
}
