use std::collections::BTreeMap;

use interp_core::errors::{ErrorInfo, InterpError};
use interp_core::{MetricValue, StatisticalResult};
use interp_rules::{MethodDescriptor, MetricRole};

const ASSUMPTION_FIELDS: [&str; 4] = ["statistic", "p_value", "violated", "warning"];
const COMPARISON_FIELDS: [&str; 3] = ["comparison", "p_value", "estimate"];
const GROUP_FIELDS: [&str; 3] = ["mean", "sd", "n"];

static ABSENT: MetricValue = MetricValue::Absent;

/// Result restricted to the metrics a descriptor declares, with `NaN` folded into absence.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedResult {
    values: BTreeMap<String, MetricValue>,
    ignored: Vec<String>,
}

impl NormalizedResult {
    /// Value for a declared metric; missing keys read as absent.
    pub fn get(&self, key: &str) -> &MetricValue {
        self.values.get(key).unwrap_or(&ABSENT)
    }

    /// Keys present in the input that the descriptor does not declare.
    pub fn ignored(&self) -> &[String] {
        &self.ignored
    }
}

/// Canonicalizes `result` into the shape `descriptor` expects.
pub fn normalize(result: &StatisticalResult, descriptor: &MethodDescriptor) -> NormalizedResult {
    let mut values = BTreeMap::new();
    for rule in &descriptor.metrics {
        let value = result
            .get(&rule.key)
            .map(canonicalize)
            .unwrap_or(MetricValue::Absent);
        values.insert(rule.key.clone(), trim(rule.role, value));
    }
    let ignored = result
        .iter()
        .map(|(key, _)| key)
        .filter(|key| descriptor.metric(key).is_none())
        .cloned()
        .collect();
    NormalizedResult { values, ignored }
}

fn canonicalize(value: &MetricValue) -> MetricValue {
    match value {
        MetricValue::Number(number) if number.is_nan() => MetricValue::Absent,
        MetricValue::List(items) => MetricValue::List(items.iter().map(canonicalize).collect()),
        MetricValue::Group(fields) => MetricValue::Group(
            fields
                .iter()
                .map(|(key, value)| (key.clone(), canonicalize(value)))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn keep_fields(value: MetricValue, fields: &[&str]) -> MetricValue {
    match value {
        MetricValue::Group(map) => MetricValue::Group(
            map.into_iter()
                .filter(|(key, _)| fields.contains(&key.as_str()))
                .collect(),
        ),
        other => other,
    }
}

fn trim(role: MetricRole, value: MetricValue) -> MetricValue {
    match (role, value) {
        (MetricRole::AssumptionCheck, value) => keep_fields(value, &ASSUMPTION_FIELDS),
        (MetricRole::Comparisons, MetricValue::List(items)) => MetricValue::List(
            items
                .into_iter()
                .map(|item| keep_fields(item, &COMPARISON_FIELDS))
                .collect(),
        ),
        (MetricRole::GroupStatistics, MetricValue::Group(groups)) => MetricValue::Group(
            groups
                .into_iter()
                .map(|(name, group)| (name, keep_fields(group, &GROUP_FIELDS)))
                .collect(),
        ),
        (_, value) => value,
    }
}

fn shape_error(expected: &str, found: &MetricValue) -> InterpError {
    InterpError::GuardSkipped(
        ErrorInfo::new("shape_mismatch", format!("expected {expected}, found {}", found.shape()))
            .with_context("expected", expected)
            .with_context("found", found.shape()),
    )
}

/// Reads a scalar metric. `Ok(None)` means absent.
pub fn scalar(value: &MetricValue) -> Result<Option<f64>, InterpError> {
    match value {
        MetricValue::Absent => Ok(None),
        MetricValue::Number(number) => Ok(Some(*number)),
        other => Err(shape_error("number", other)),
    }
}

fn field_number(
    fields: &BTreeMap<String, MetricValue>,
    key: &str,
) -> Result<Option<f64>, InterpError> {
    fields.get(key).map(scalar).unwrap_or(Ok(None))
}

/// Typed view of an assumption-check sub-result.
#[derive(Debug, Clone, PartialEq)]
pub struct AssumptionView {
    /// Test statistic of the check.
    pub statistic: Option<f64>,
    /// p-value of the check.
    pub p_value: Option<f64>,
    /// Explicit violation flag.
    pub violated: Option<bool>,
    /// Warning text supplied by the computation engine.
    pub warning: Option<String>,
}

impl AssumptionView {
    /// Violation verdict: the explicit flag, else `p < alpha` for a p-value in `[0, 1]`.
    pub fn is_flagged(&self, alpha: f64) -> bool {
        match self.violated {
            Some(flag) => flag,
            None => self
                .p_value
                .filter(|p| (0.0..=1.0).contains(p))
                .map(|p| p < alpha)
                .unwrap_or(false),
        }
    }

    /// Whether the computation engine flagged the violation and supplied its own warning.
    pub fn has_engine_warning(&self) -> bool {
        self.violated == Some(true) && self.warning.is_some()
    }
}

/// Reads an assumption-check group. `Ok(None)` means absent.
pub fn assumption_view(value: &MetricValue) -> Result<Option<AssumptionView>, InterpError> {
    let fields = match value {
        MetricValue::Absent => return Ok(None),
        MetricValue::Group(fields) => fields,
        other => return Err(shape_error("group", other)),
    };
    let violated = match fields.get("violated") {
        None | Some(MetricValue::Absent) => None,
        Some(MetricValue::Flag(flag)) => Some(*flag),
        Some(other) => return Err(shape_error("flag", other)),
    };
    let warning = match fields.get("warning") {
        None | Some(MetricValue::Absent) => None,
        Some(MetricValue::Text(text)) => Some(text.clone()),
        Some(other) => return Err(shape_error("text", other)),
    };
    Ok(Some(AssumptionView {
        statistic: field_number(fields, "statistic")?,
        p_value: field_number(fields, "p_value")?,
        violated,
        warning,
    }))
}

/// Typed view of one post-hoc comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonView {
    /// Human readable pair label.
    pub comparison: String,
    /// Adjusted p-value of the pair.
    pub p_value: Option<f64>,
    /// Estimated difference for the pair.
    pub estimate: Option<f64>,
}

/// Reads a post-hoc comparison list. `Ok(None)` means absent.
pub fn comparisons_view(value: &MetricValue) -> Result<Option<Vec<ComparisonView>>, InterpError> {
    let items = match value {
        MetricValue::Absent => return Ok(None),
        MetricValue::List(items) => items,
        other => return Err(shape_error("list", other)),
    };
    let mut views = Vec::with_capacity(items.len());
    for (idx, item) in items.iter().enumerate() {
        let fields = match item {
            MetricValue::Group(fields) => fields,
            other => return Err(shape_error("group", other)),
        };
        let comparison = match fields.get("comparison") {
            Some(MetricValue::Text(text)) => text.clone(),
            None | Some(MetricValue::Absent) => format!("comparison {}", idx + 1),
            Some(other) => return Err(shape_error("text", other)),
        };
        views.push(ComparisonView {
            comparison,
            p_value: field_number(fields, "p_value")?,
            estimate: field_number(fields, "estimate")?,
        });
    }
    Ok(Some(views))
}

/// Typed view of one group's descriptive statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupView {
    /// Group name.
    pub name: String,
    /// Group mean.
    pub mean: Option<f64>,
    /// Group standard deviation.
    pub sd: Option<f64>,
    /// Group size.
    pub n: Option<f64>,
}

/// Reads per-group statistics in group-name order. `Ok(None)` means absent.
pub fn groups_view(value: &MetricValue) -> Result<Option<Vec<GroupView>>, InterpError> {
    let groups = match value {
        MetricValue::Absent => return Ok(None),
        MetricValue::Group(groups) => groups,
        other => return Err(shape_error("group", other)),
    };
    let mut views = Vec::with_capacity(groups.len());
    for (name, group) in groups {
        let fields = match group {
            MetricValue::Group(fields) => fields,
            other => return Err(shape_error("group", other)),
        };
        views.push(GroupView {
            name: name.clone(),
            mean: field_number(fields, "mean")?,
            sd: field_number(fields, "sd")?,
            n: field_number(fields, "n")?,
        });
    }
    Ok(Some(views))
}
