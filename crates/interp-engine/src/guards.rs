//! Ordered edge-case guards applied between normalization and composition.
//!
//! Guards never fail the pipeline. A value of the wrong shape is recorded as a
//! [`GuardSkip`] and left untouched for the composer to report.

use std::collections::BTreeMap;

use interp_core::errors::InterpError;
use interp_format::{
    check_domain, format_count, format_effect_size, format_percentage, format_statistic,
    is_borderline, Domain,
};
use interp_rules::{GuardId, MethodDescriptor, MetricRole, MetricRule, SectionKind};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::normalize::{
    assumption_view, comparisons_view, groups_view, scalar, NormalizedResult,
};
use crate::report::{Fragment, FragmentSource};

/// Substitute rendering a guard forces on one metric.
#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    /// The value is unusable; `text` replaces it and later guards leave it alone.
    Neutral {
        /// Guard that issued the directive.
        guard: GuardId,
        /// Replacement sentence.
        text: String,
    },
    /// The value is usable but must render as exactly `text`.
    Literal {
        /// Guard that issued the directive.
        guard: GuardId,
        /// Replacement sentence.
        text: String,
    },
    /// The p-value sits inside the borderline window and needs a qualifier.
    Borderline {
        /// Guard that issued the directive.
        guard: GuardId,
    },
}

impl Directive {
    /// Guard responsible for the directive.
    pub fn guard(&self) -> GuardId {
        match self {
            Directive::Neutral { guard, .. }
            | Directive::Literal { guard, .. }
            | Directive::Borderline { guard } => *guard,
        }
    }
}

/// A guard that could not apply to a malformed metric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardSkip {
    /// Guard that skipped.
    pub guard: GuardId,
    /// Metric it skipped.
    pub metric: String,
    /// Why the metric could not be read.
    pub reason: String,
}

/// Accumulated output of the guards run so far.
#[derive(Debug, Clone)]
pub struct GuardState {
    result: NormalizedResult,
    directives: BTreeMap<String, Directive>,
    relocations: BTreeMap<String, SectionKind>,
    caveats: Vec<Fragment>,
    skips: Vec<GuardSkip>,
    ran: Vec<GuardId>,
}

impl GuardState {
    /// Starts an empty fold over `result`.
    pub fn new(result: NormalizedResult) -> Self {
        Self {
            result,
            directives: BTreeMap::new(),
            relocations: BTreeMap::new(),
            caveats: Vec::new(),
            skips: Vec::new(),
            ran: Vec::new(),
        }
    }

    /// Normalized result the guards operate on.
    pub fn result(&self) -> &NormalizedResult {
        &self.result
    }

    /// Directive recorded for `metric`, if any.
    pub fn directive(&self, metric: &str) -> Option<&Directive> {
        self.directives.get(metric)
    }

    /// Section `metric` was moved to, if any.
    pub fn relocation(&self, metric: &str) -> Option<SectionKind> {
        self.relocations.get(metric).copied()
    }

    /// Caveats in the order guards emitted them.
    pub fn caveats(&self) -> &[Fragment] {
        &self.caveats
    }

    /// Skipped (guard, metric) pairs in the order they occurred.
    pub fn skips(&self) -> &[GuardSkip] {
        &self.skips
    }

    /// Guards that ran, in order.
    pub fn guards_run(&self) -> &[GuardId] {
        &self.ran
    }

    /// Whether an earlier guard declared `metric` unusable.
    pub fn is_neutralized(&self, metric: &str) -> bool {
        matches!(self.directives.get(metric), Some(Directive::Neutral { .. }))
    }

    fn set_directive(&mut self, metric: &str, directive: Directive) {
        self.directives.insert(metric.to_string(), directive);
    }

    fn relocate(&mut self, metric: &str, section: SectionKind) {
        self.relocations.insert(metric.to_string(), section);
    }

    fn push_caveat(&mut self, caveat: Fragment) {
        if !self.caveats.contains(&caveat) {
            self.caveats.push(caveat);
        }
    }

    fn record_skip(&mut self, guard: GuardId, metric: &str, err: &InterpError) {
        warn!(
            guard = guard.as_str(),
            metric,
            reason = %err.info().message,
            "guard skipped malformed metric"
        );
        let skip = GuardSkip {
            guard,
            metric: metric.to_string(),
            reason: err.info().message.clone(),
        };
        if !self.skips.contains(&skip) {
            self.skips.push(skip);
        }
    }
}

fn guard_fragment(
    guard: GuardId,
    metric: &str,
    text: String,
    values: BTreeMap<String, Option<f64>>,
) -> Fragment {
    Fragment {
        text,
        source: FragmentSource::Guard {
            guard,
            metric: Some(metric.to_string()),
        },
        values,
    }
}

fn single_value(key: &str, value: Option<f64>) -> BTreeMap<String, Option<f64>> {
    BTreeMap::from([(key.to_string(), value)])
}

/// One named edge-case rule.
pub trait Guard {
    /// Identifier used in descriptors and diagnostics.
    fn id(&self) -> GuardId;

    /// Folds the guard's effect into `state`.
    fn apply(&self, state: &mut GuardState, descriptor: &MethodDescriptor);
}

/// Caveat for required metrics that were not reported.
pub struct RequiredMetrics;

impl Guard for RequiredMetrics {
    fn id(&self) -> GuardId {
        GuardId::RequiredMetrics
    }

    fn apply(&self, state: &mut GuardState, descriptor: &MethodDescriptor) {
        for rule in descriptor.rendered_metrics().filter(|rule| rule.required) {
            if state.result.get(&rule.key).is_absent() {
                let text = format!("{} was not reported by the analysis.", rule.label);
                state.push_caveat(guard_fragment(self.id(), &rule.key, text, BTreeMap::new()));
            }
        }
    }
}

/// Neutralizes values outside the domain of their role.
pub struct RangeCheck;

impl RangeCheck {
    /// First out-of-domain field of the metric, as `(field, value)`.
    fn violation(
        rule: &MetricRule,
        state: &GuardState,
    ) -> Result<Option<(String, f64)>, InterpError> {
        let value = state.result.get(&rule.key);
        let outside = |domain: Domain, field: &str, number: Option<f64>| {
            number
                .filter(|number| check_domain(domain, *number).is_err())
                .map(|number| (field.to_string(), number))
        };
        if let Some(domain) = rule.role.domain() {
            return Ok(outside(domain, &rule.key, scalar(value)?));
        }
        let found = match rule.role {
            MetricRole::AssumptionCheck => assumption_view(value)?.and_then(|view| {
                outside(Domain::Finite, "statistic", view.statistic)
                    .or_else(|| outside(Domain::Probability, "p_value", view.p_value))
            }),
            MetricRole::Comparisons => comparisons_view(value)?.and_then(|views| {
                views.iter().find_map(|view| {
                    outside(Domain::Probability, "p_value", view.p_value)
                        .or_else(|| outside(Domain::Finite, "estimate", view.estimate))
                        .map(|(field, number)| (format!("{}.{field}", view.comparison), number))
                })
            }),
            MetricRole::GroupStatistics => groups_view(value)?.and_then(|views| {
                views.iter().find_map(|view| {
                    outside(Domain::Finite, "mean", view.mean)
                        .or_else(|| outside(Domain::NonNegative, "sd", view.sd))
                        .or_else(|| outside(Domain::NonNegative, "n", view.n))
                        .map(|(field, number)| (format!("{}.{field}", view.name), number))
                })
            }),
            _ => None,
        };
        Ok(found)
    }

    fn keeps_engine_warning(rule: &MetricRule, state: &GuardState) -> bool {
        rule.role == MetricRole::AssumptionCheck
            && matches!(
                assumption_view(state.result.get(&rule.key)),
                Ok(Some(view)) if view.has_engine_warning()
            )
    }
}

impl Guard for RangeCheck {
    fn id(&self) -> GuardId {
        GuardId::RangeCheck
    }

    fn apply(&self, state: &mut GuardState, descriptor: &MethodDescriptor) {
        for rule in descriptor.rendered_metrics() {
            if state.is_neutralized(&rule.key) {
                continue;
            }
            match Self::violation(rule, state) {
                Ok(Some((field, number))) => {
                    warn!(
                        metric = %rule.key,
                        field = %field,
                        value = number,
                        "value out of expected range"
                    );
                    // Engine-flagged violations keep their warning; only the field is caveated.
                    if !Self::keeps_engine_warning(rule, state) {
                        let text = format!(
                            "{} could not be interpreted because the reported value ({number}) is outside the expected range.",
                            rule.label
                        );
                        let directive = Directive::Neutral {
                            guard: self.id(),
                            text,
                        };
                        state.set_directive(&rule.key, directive);
                    }
                    let caveat = format!("{}: value out of expected range ({number}).", rule.label);
                    state.push_caveat(guard_fragment(
                        self.id(),
                        &rule.key,
                        caveat,
                        single_value(&field, Some(number)),
                    ));
                }
                Ok(None) => {}
                Err(err) => state.record_skip(self.id(), &rule.key, &err),
            }
        }
    }
}

/// Neutral practical message for an absent accuracy-like metric.
pub struct UndefinedCriticalMetric;

impl Guard for UndefinedCriticalMetric {
    fn id(&self) -> GuardId {
        GuardId::UndefinedCriticalMetric
    }

    fn apply(&self, state: &mut GuardState, descriptor: &MethodDescriptor) {
        for rule in descriptor
            .rendered_metrics()
            .filter(|rule| rule.is_accuracy_like())
        {
            if state.is_neutralized(&rule.key) {
                continue;
            }
            match scalar(state.result.get(&rule.key)) {
                Ok(None) => {
                    let text = format!(
                        "{} was not reported for this analysis. This does not indicate poor performance; the value could not be computed.",
                        rule.label
                    );
                    state.set_directive(&rule.key, Directive::Neutral { guard: self.id(), text });
                }
                Ok(Some(_)) => {}
                Err(err) => state.record_skip(self.id(), &rule.key, &err),
            }
        }
    }
}

fn zero_rendering(role: MetricRole) -> Result<String, InterpError> {
    match role {
        MetricRole::EffectSize { kind } => format_effect_size(Some(0.0), kind),
        MetricRole::Accuracy | MetricRole::Percentage => format_percentage(Some(0.0)),
        _ => format_statistic(Some(0.0)),
    }
}

/// Literal zero message for an accuracy-like metric that is exactly zero.
pub struct ZeroValue;

impl Guard for ZeroValue {
    fn id(&self) -> GuardId {
        GuardId::ZeroValue
    }

    fn apply(&self, state: &mut GuardState, descriptor: &MethodDescriptor) {
        for rule in descriptor
            .rendered_metrics()
            .filter(|rule| rule.is_accuracy_like())
        {
            if state.is_neutralized(&rule.key) {
                continue;
            }
            match scalar(state.result.get(&rule.key)) {
                Ok(Some(value)) if value == 0.0 => {
                    let Ok(zero) = zero_rendering(rule.role) else {
                        continue;
                    };
                    let text = format!(
                        "{} is {zero}: the value was computed and is exactly zero, which is different from a missing value.",
                        rule.label
                    );
                    state.set_directive(&rule.key, Directive::Literal { guard: self.id(), text });
                }
                Ok(_) => {}
                Err(err) => state.record_skip(self.id(), &rule.key, &err),
            }
        }
    }
}

/// Moves violated assumption checks into the statistical section.
pub struct AssumptionRelocation;

impl Guard for AssumptionRelocation {
    fn id(&self) -> GuardId {
        GuardId::AssumptionRelocation
    }

    fn apply(&self, state: &mut GuardState, descriptor: &MethodDescriptor) {
        let alpha = descriptor.thresholds.alpha;
        for rule in descriptor
            .rendered_metrics()
            .filter(|rule| rule.role == MetricRole::AssumptionCheck)
        {
            if state.is_neutralized(&rule.key) {
                continue;
            }
            match assumption_view(state.result.get(&rule.key)) {
                Ok(Some(view)) if view.is_flagged(alpha) => {
                    if rule.section != SectionKind::Statistical {
                        state.relocate(&rule.key, SectionKind::Statistical);
                    }
                }
                Ok(_) => {}
                Err(err) => state.record_skip(self.id(), &rule.key, &err),
            }
        }
    }
}

/// Borderline qualifier for p-values within `alpha ± epsilon`.
pub struct BoundarySignificance;

impl Guard for BoundarySignificance {
    fn id(&self) -> GuardId {
        GuardId::BoundarySignificance
    }

    fn apply(&self, state: &mut GuardState, descriptor: &MethodDescriptor) {
        let thresholds = descriptor.thresholds;
        for rule in descriptor
            .rendered_metrics()
            .filter(|rule| rule.role == MetricRole::PValue)
        {
            if state.directive(&rule.key).is_some() {
                continue;
            }
            match scalar(state.result.get(&rule.key)) {
                Ok(p) => {
                    if is_borderline(p, thresholds.alpha, thresholds.borderline_epsilon) {
                        state.set_directive(&rule.key, Directive::Borderline { guard: self.id() });
                    }
                }
                Err(err) => state.record_skip(self.id(), &rule.key, &err),
            }
        }
    }
}

/// Caveat when the sample size is below the descriptor's minimum.
pub struct SmallSample;

impl Guard for SmallSample {
    fn id(&self) -> GuardId {
        GuardId::SmallSample
    }

    fn apply(&self, state: &mut GuardState, descriptor: &MethodDescriptor) {
        let (Some(key), Some(min)) = (
            descriptor.sample_size_metric.as_deref(),
            descriptor.thresholds.min_sample_size,
        ) else {
            return;
        };
        if state.directive(key).is_some() {
            return;
        }
        match scalar(state.result.get(key)) {
            Ok(Some(n)) if n < min => {
                let (Ok(rendered_n), Ok(rendered_min)) =
                    (format_count(Some(n)), format_count(Some(min)))
                else {
                    return;
                };
                let text = format!(
                    "The sample size (n = {rendered_n}) is below the recommended minimum of {rendered_min}; estimates may be unstable and tests have limited power."
                );
                state.push_caveat(guard_fragment(self.id(), key, text, single_value(key, Some(n))));
            }
            Ok(_) => {}
            Err(err) => state.record_skip(self.id(), key, &err),
        }
    }
}

/// Guard implementing `id`.
pub fn guard_for(id: GuardId) -> &'static dyn Guard {
    match id {
        GuardId::RequiredMetrics => &RequiredMetrics,
        GuardId::RangeCheck => &RangeCheck,
        GuardId::UndefinedCriticalMetric => &UndefinedCriticalMetric,
        GuardId::ZeroValue => &ZeroValue,
        GuardId::AssumptionRelocation => &AssumptionRelocation,
        GuardId::BoundarySignificance => &BoundarySignificance,
        GuardId::SmallSample => &SmallSample,
    }
}

/// Runs the descriptor's guards left to right; each sees the output of the ones before it.
pub fn run_guards(result: NormalizedResult, descriptor: &MethodDescriptor) -> GuardState {
    let mut state = GuardState::new(result);
    for id in &descriptor.guards {
        let guard = guard_for(*id);
        guard.apply(&mut state, descriptor);
        state.ran.push(guard.id());
    }
    state
}
