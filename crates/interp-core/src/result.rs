//! Data model for statistical results received from the computation bridge.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::InterpError;

/// Single value inside a [`StatisticalResult`].
///
/// A missing key and [`MetricValue::Absent`] mean the same thing. `Number(NaN)` is
/// accepted as received and canonicalized to absent during normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum MetricValue {
    /// Value not reported by the computation engine.
    #[default]
    Absent,
    /// Boolean flag, e.g. an assumption check's `violated` marker.
    Flag(bool),
    /// Numeric value, possibly `NaN` or infinite.
    Number(f64),
    /// Free text, e.g. a warning emitted by the computation engine.
    Text(String),
    /// Ordered list of nested values, e.g. post-hoc comparisons.
    List(Vec<MetricValue>),
    /// Nested sub-result keyed by field name.
    Group(BTreeMap<String, MetricValue>),
}

impl MetricValue {
    /// Returns whether the value carries no information (absent or `NaN`).
    pub fn is_absent(&self) -> bool {
        match self {
            MetricValue::Absent => true,
            MetricValue::Number(value) => value.is_nan(),
            _ => false,
        }
    }

    /// Returns the numeric payload when the value is a non-`NaN` number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            MetricValue::Number(value) if !value.is_nan() => Some(*value),
            _ => None,
        }
    }

    /// Returns the nested group when the value is a sub-result mapping.
    pub fn as_group(&self) -> Option<&BTreeMap<String, MetricValue>> {
        match self {
            MetricValue::Group(fields) => Some(fields),
            _ => None,
        }
    }

    /// Short shape name used in diagnostics.
    pub fn shape(&self) -> &'static str {
        match self {
            MetricValue::Absent => "absent",
            MetricValue::Flag(_) => "flag",
            MetricValue::Number(_) => "number",
            MetricValue::Text(_) => "text",
            MetricValue::List(_) => "list",
            MetricValue::Group(_) => "group",
        }
    }
}

impl From<f64> for MetricValue {
    fn from(value: f64) -> Self {
        MetricValue::Number(value)
    }
}

impl From<bool> for MetricValue {
    fn from(value: bool) -> Self {
        MetricValue::Flag(value)
    }
}

impl From<&str> for MetricValue {
    fn from(value: &str) -> Self {
        MetricValue::Text(value.to_string())
    }
}

impl From<Option<f64>> for MetricValue {
    fn from(value: Option<f64>) -> Self {
        value.map(MetricValue::Number).unwrap_or(MetricValue::Absent)
    }
}

impl From<&Value> for MetricValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => MetricValue::Absent,
            Value::Bool(flag) => MetricValue::Flag(*flag),
            Value::Number(number) => number
                .as_f64()
                .map(MetricValue::Number)
                .unwrap_or(MetricValue::Absent),
            Value::String(text) => MetricValue::Text(text.clone()),
            Value::Array(values) => MetricValue::List(values.iter().map(Into::into).collect()),
            Value::Object(map) => MetricValue::Group(
                map.iter()
                    .map(|(key, value)| (key.clone(), value.into()))
                    .collect(),
            ),
        }
    }
}

/// Mapping from metric name to value produced by the computation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct StatisticalResult {
    metrics: BTreeMap<String, MetricValue>,
}

impl StatisticalResult {
    /// Creates an empty result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a result from an already deserialized JSON value.
    ///
    /// Anything other than a JSON object is rejected with
    /// [`InterpError::InvalidResult`].
    pub fn from_json_value(value: &Value) -> Result<Self, InterpError> {
        match value {
            Value::Object(map) => Ok(Self {
                metrics: map
                    .iter()
                    .map(|(key, value)| (key.clone(), value.into()))
                    .collect(),
            }),
            Value::Null => Err(InterpError::invalid_result(
                "statistical result must be a mapping, got null",
            )),
            other => Err(InterpError::invalid_result(format!(
                "statistical result must be a mapping, got {}",
                json_shape(other)
            ))),
        }
    }

    /// Returns a builder-style copy with the metric inserted.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<MetricValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Inserts or replaces a metric.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<MetricValue>) {
        self.metrics.insert(name.into(), value.into());
    }

    /// Returns the raw value recorded for `name`, if the key is present.
    pub fn get(&self, name: &str) -> Option<&MetricValue> {
        self.metrics.get(name)
    }

    /// Iterates over metrics in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &MetricValue)> {
        self.metrics.iter()
    }

    /// Returns the number of recorded keys.
    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    /// Returns whether no keys are recorded.
    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }
}

impl FromIterator<(String, MetricValue)> for StatisticalResult {
    fn from_iter<I: IntoIterator<Item = (String, MetricValue)>>(iter: I) -> Self {
        Self {
            metrics: iter.into_iter().collect(),
        }
    }
}

fn json_shape(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
