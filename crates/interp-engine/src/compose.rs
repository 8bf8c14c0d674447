//! Assembles guard-processed metrics into ordered sections.

use std::collections::{BTreeMap, BTreeSet};

use interp_core::errors::InterpError;
use interp_core::provenance::INTERPRETATION_SCHEMA;
use interp_core::MetricValue;
use interp_format::{
    check_domain, format_count, format_degrees_of_freedom, format_effect_size, format_p_clause_at,
    format_percentage, format_statistic, format_threshold, significance_label, Domain,
    Significance, NOT_AVAILABLE,
};
use interp_rules::{GuardId, MethodDescriptor, MetricRole, MetricRule, SectionKind, Thresholds};
use tracing::warn;

use crate::guards::{Directive, GuardState};
use crate::normalize::{assumption_view, comparisons_view, groups_view, scalar};
use crate::report::{Diagnostics, Fragment, FragmentSource, InterpretationResult, Section};

type Values = BTreeMap<String, Option<f64>>;

struct Rendered {
    text: String,
    values: Values,
    /// Out-of-range field that did not prevent rendering.
    anomaly: Option<InterpError>,
}

impl Rendered {
    fn new(text: String, values: Values) -> Self {
        Self {
            text,
            values,
            anomaly: None,
        }
    }

    fn with_anomaly(mut self, anomaly: Option<InterpError>) -> Self {
        self.anomaly = anomaly;
        self
    }
}

fn p_sentence(
    label: &str,
    p: Option<f64>,
    thresholds: &Thresholds,
    borderline: bool,
) -> Result<String, InterpError> {
    let alpha = format_threshold(thresholds.alpha);
    let undetermined = || {
        format!("{label}: the p-value is not available, so statistical significance could not be determined.")
    };
    let Some(p) = p else {
        return Ok(undetermined());
    };
    let clause = format_p_clause_at(Some(p), thresholds.alpha)?;
    if borderline {
        let side = if p < thresholds.alpha {
            "borderline significant"
        } else {
            "borderline non-significant"
        };
        let epsilon = format_threshold(thresholds.borderline_epsilon);
        return Ok(format!(
            "{label}: {clause}, {side}. The p-value lies within {epsilon} of α = {alpha}, so the evidence should be treated as tentative."
        ));
    }
    Ok(match significance_label(Some(p), thresholds.alpha) {
        Significance::Significant => {
            format!("{label}: {clause}, statistically significant at α = {alpha}.")
        }
        Significance::NotSignificant => {
            format!("{label}: {clause}, not statistically significant at α = {alpha}.")
        }
        Significance::Undetermined => undetermined(),
    })
}

fn render_scalar(
    rule: &MetricRule,
    number: Option<f64>,
    thresholds: &Thresholds,
    borderline: bool,
) -> Result<Option<Rendered>, InterpError> {
    let values = Values::from([(rule.key.clone(), number)]);
    let label = rule.label.as_str();
    if rule.role == MetricRole::PValue {
        let text = p_sentence(label, number, thresholds, borderline)?;
        return Ok(Some(Rendered::new(text, values)));
    }
    let Some(number) = number else {
        return Ok(rule
            .required
            .then(|| Rendered::new(format!("{label}: {NOT_AVAILABLE}."), values)));
    };
    let text = match rule.role {
        MetricRole::EffectSize { kind } => {
            let rendered = format_effect_size(Some(number), kind)?;
            match rule.magnitude_bands() {
                Some(bands) => format!(
                    "{label}: {rendered} ({} effect).",
                    bands.classify(number).as_str()
                ),
                None => format!("{label}: {rendered}."),
            }
        }
        MetricRole::DegreesOfFreedom => {
            format!("{label}: {}.", format_degrees_of_freedom(Some(number))?)
        }
        MetricRole::Count => format!("{label}: {}.", format_count(Some(number))?),
        MetricRole::Accuracy | MetricRole::Percentage => {
            format!("{label}: {}.", format_percentage(Some(number))?)
        }
        _ => format!("{label}: {}.", format_statistic(Some(number))?),
    };
    Ok(Some(Rendered::new(text, values)))
}

fn render_assumption(
    rule: &MetricRule,
    value: &MetricValue,
    alpha: f64,
) -> Result<Option<Rendered>, InterpError> {
    let label = rule.label.as_str();
    let Some(view) = assumption_view(value)? else {
        return Ok(rule.required.then(|| {
            Rendered::new(format!("{label}: {NOT_AVAILABLE}."), Values::new())
        }));
    };
    let values = Values::from([
        ("p_value".to_string(), view.p_value),
        ("statistic".to_string(), view.statistic),
    ]);
    if view.has_engine_warning() {
        let stray = [
            (Domain::Finite, view.statistic),
            (Domain::Probability, view.p_value),
        ]
        .into_iter()
        .find_map(|(domain, number)| number.and_then(|n| check_domain(domain, n).err()));
        let text = view.warning.clone().unwrap_or_default();
        return Ok(Some(Rendered::new(text, values).with_anomaly(stray)));
    }
    if let Some(statistic) = view.statistic {
        check_domain(Domain::Finite, statistic)?;
    }
    let suffix = match view.p_value {
        Some(p) => format!(" ({})", format_p_clause_at(Some(p), alpha)?),
        None => String::new(),
    };
    let text = if view.is_flagged(alpha) {
        match &view.warning {
            Some(warning) => warning.clone(),
            None => format!("{label}: the assumption appears to be violated{suffix}."),
        }
    } else {
        format!("{label}: no violation detected{suffix}.")
    };
    Ok(Some(Rendered::new(text, values)))
}

fn render_comparisons(
    rule: &MetricRule,
    value: &MetricValue,
    alpha: f64,
) -> Result<Option<Rendered>, InterpError> {
    let label = rule.label.as_str();
    let Some(views) = comparisons_view(value)? else {
        return Ok(rule.required.then(|| {
            Rendered::new(format!("{label}: {NOT_AVAILABLE}."), Values::new())
        }));
    };
    if views.is_empty() {
        return Ok(Some(Rendered::new(
            format!("{label}: no comparisons were reported."),
            Values::from([("total".to_string(), Some(0.0))]),
        )));
    }
    let mut significant = Vec::new();
    let mut undetermined = 0usize;
    for view in &views {
        if let Some(p) = view.p_value {
            check_domain(Domain::Probability, p)?;
        }
        if let Some(estimate) = view.estimate {
            check_domain(Domain::Finite, estimate)?;
        }
        match significance_label(view.p_value, alpha) {
            Significance::Significant => significant.push(view.comparison.as_str()),
            Significance::NotSignificant => {}
            Significance::Undetermined => undetermined += 1,
        }
    }
    let mut text = format!(
        "{label}: {} of {} comparisons reached statistical significance at α = {}",
        significant.len(),
        views.len(),
        format_threshold(alpha)
    );
    if !significant.is_empty() {
        text.push_str(&format!(" ({})", significant.join(", ")));
    }
    text.push('.');
    if undetermined > 0 {
        text.push_str(&format!(
            " {undetermined} could not be evaluated because the p-value is not available."
        ));
    }
    let values = Values::from([
        ("significant".to_string(), Some(significant.len() as f64)),
        ("total".to_string(), Some(views.len() as f64)),
        ("undetermined".to_string(), Some(undetermined as f64)),
    ]);
    Ok(Some(Rendered::new(text, values)))
}

fn render_groups(rule: &MetricRule, value: &MetricValue) -> Result<Option<Rendered>, InterpError> {
    let label = rule.label.as_str();
    let Some(views) = groups_view(value)? else {
        return Ok(rule.required.then(|| {
            Rendered::new(format!("{label}: {NOT_AVAILABLE}."), Values::new())
        }));
    };
    if views.is_empty() {
        return Ok(Some(Rendered::new(
            format!("{label}: no groups were reported."),
            Values::new(),
        )));
    }
    let mut parts = Vec::with_capacity(views.len());
    let mut values = Values::new();
    for view in &views {
        if let Some(sd) = view.sd {
            check_domain(Domain::NonNegative, sd)?;
        }
        parts.push(format!(
            "{} (M = {}, SD = {}, n = {})",
            view.name,
            format_statistic(view.mean)?,
            format_statistic(view.sd)?,
            format_count(view.n)?
        ));
        values.insert(format!("{}.mean", view.name), view.mean);
        values.insert(format!("{}.sd", view.name), view.sd);
        values.insert(format!("{}.n", view.name), view.n);
    }
    Ok(Some(Rendered::new(format!("{label}: {}.", parts.join("; ")), values)))
}

/// Default rendering of one metric. `Ok(None)` means an optional metric was not reported.
fn render_metric(
    rule: &MetricRule,
    value: &MetricValue,
    thresholds: &Thresholds,
    borderline: bool,
) -> Result<Option<Rendered>, InterpError> {
    match rule.role {
        MetricRole::AssumptionCheck => render_assumption(rule, value, thresholds.alpha),
        MetricRole::Comparisons => render_comparisons(rule, value, thresholds.alpha),
        MetricRole::GroupStatistics => render_groups(rule, value),
        _ => render_scalar(rule, scalar(value)?, thresholds, borderline),
    }
}

fn composer_fragment(metric: &str, text: String, values: Values) -> Fragment {
    Fragment {
        text,
        source: FragmentSource::Composer {
            metric: metric.to_string(),
        },
        values,
    }
}

fn shape_caveat(label: &str, metric: &str, reason: &str) -> Fragment {
    composer_fragment(
        metric,
        format!("{label} was left uninterpreted because its value has an unexpected type ({reason})."),
        Values::new(),
    )
}

/// Recovers a rendering failure into a neutral fragment and a caveat.
fn recover(rule: &MetricRule, err: &InterpError) -> (Fragment, Fragment) {
    let label = rule.label.as_str();
    let info = err.info();
    match err {
        InterpError::InvalidMetric(_) => {
            let shown = info.context.get("value").cloned().unwrap_or_default();
            let number = shown.parse::<f64>().ok();
            warn!(metric = %rule.key, value = %shown, "value out of expected range");
            (
                composer_fragment(
                    &rule.key,
                    format!(
                        "{label} could not be interpreted because the reported value ({shown}) is outside the expected range."
                    ),
                    Values::from([(rule.key.clone(), number)]),
                ),
                composer_fragment(
                    &rule.key,
                    format!("{label}: value out of expected range ({shown})."),
                    Values::from([(rule.key.clone(), number)]),
                ),
            )
        }
        _ => {
            warn!(metric = %rule.key, reason = %info.message, "metric has an unexpected shape");
            (
                composer_fragment(
                    &rule.key,
                    format!(
                        "{label} could not be interpreted because the reported value has an unexpected type."
                    ),
                    Values::new(),
                ),
                shape_caveat(label, &rule.key, &info.message),
            )
        }
    }
}

fn push_to(sections: &mut [Section], kind: SectionKind, fragment: Fragment) -> bool {
    match sections.iter_mut().find(|section| section.kind == kind) {
        Some(section) => {
            section.fragments.push(fragment);
            true
        }
        None => false,
    }
}

/// Builds the interpretation from the guard state.
///
/// Sections follow `descriptor.sections` exactly. Each rendered metric lands in its
/// routed section, or the section a guard relocated it to, with any guard directive
/// replacing the default text. Guard caveats follow in run order, then anomalies the
/// composer recovered from.
pub fn compose(state: &GuardState, descriptor: &MethodDescriptor) -> InterpretationResult {
    let mut sections: Vec<Section> =
        descriptor.sections.iter().copied().map(Section::new).collect();
    let mut anomalies = Vec::new();
    let mut anomalous = BTreeSet::new();
    let mut unreported = Vec::new();
    let thresholds = &descriptor.thresholds;

    for rule in descriptor.rendered_metrics() {
        let value = state.result().get(&rule.key);
        let section = state.relocation(&rule.key).unwrap_or(rule.section);
        let directive = state.directive(&rule.key);
        let fragment = match directive {
            Some(Directive::Neutral { guard, text }) | Some(Directive::Literal { guard, text }) => {
                Some(Fragment {
                    text: text.clone(),
                    source: FragmentSource::Guard {
                        guard: *guard,
                        metric: Some(rule.key.clone()),
                    },
                    values: Values::from([(rule.key.clone(), value.as_number())]),
                })
            }
            _ => {
                let borderline = matches!(directive, Some(Directive::Borderline { .. }));
                match render_metric(rule, value, thresholds, borderline) {
                    Ok(Some(rendered)) => {
                        if let Some(err) = &rendered.anomaly {
                            if !state.guards_run().contains(&GuardId::RangeCheck) {
                                let (_, caveat) = recover(rule, err);
                                anomalous.insert(rule.key.clone());
                                anomalies.push(caveat);
                            }
                        }
                        let source = match directive {
                            Some(directive) => FragmentSource::Guard {
                                guard: directive.guard(),
                                metric: Some(rule.key.clone()),
                            },
                            None => FragmentSource::Metric {
                                metric: rule.key.clone(),
                            },
                        };
                        Some(Fragment {
                            text: rendered.text,
                            source,
                            values: rendered.values,
                        })
                    }
                    Ok(None) => {
                        unreported.push(rule.key.clone());
                        None
                    }
                    Err(err) => {
                        let (neutral, caveat) = recover(rule, &err);
                        anomalous.insert(rule.key.clone());
                        anomalies.push(caveat);
                        Some(neutral)
                    }
                }
            }
        };
        if let Some(fragment) = fragment {
            if !push_to(&mut sections, section, fragment.clone()) {
                push_to(&mut sections, rule.section, fragment);
            }
        }
    }

    for skip in state.skips() {
        if anomalous.insert(skip.metric.clone()) {
            let label = descriptor
                .metric(&skip.metric)
                .map(|rule| rule.label.as_str())
                .unwrap_or(skip.metric.as_str());
            anomalies.push(shape_caveat(label, &skip.metric, &skip.reason));
        }
    }

    for caveat in state.caveats().iter().cloned().chain(anomalies) {
        push_to(&mut sections, SectionKind::Caveats, caveat);
    }

    let excluded = descriptor
        .metrics
        .iter()
        .filter(|rule| rule.excluded && !state.result().get(&rule.key).is_absent())
        .map(|rule| rule.key.clone())
        .collect();
    let empty = sections.iter().all(Section::is_empty);

    InterpretationResult {
        method_id: descriptor.id.clone(),
        method_name: descriptor.name.clone(),
        schema_version: INTERPRETATION_SCHEMA,
        sections,
        empty,
        diagnostics: Diagnostics {
            guards_run: state.guards_run().to_vec(),
            skipped: state.skips().to_vec(),
            unreported,
            excluded,
            ignored: state.result().ignored().to_vec(),
        },
    }
}
