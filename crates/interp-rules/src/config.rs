use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use interp_core::errors::{ErrorInfo, InterpError};
use interp_core::serde::from_yaml_slice;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::descriptor::Thresholds;
use crate::table::RuleTable;

fn io_error(code: &str, path: &Path, err: impl ToString) -> InterpError {
    InterpError::Config(
        ErrorInfo::new(code, err.to_string()).with_context("path", path.display().to_string()),
    )
}

/// Threshold patch for a single method. Unset fields keep the table value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct MethodOverride {
    /// Replacement significance level.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alpha: Option<f64>,
    /// Replacement borderline half-width.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub borderline_epsilon: Option<f64>,
    /// Replacement minimum sample size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_sample_size: Option<f64>,
}

impl MethodOverride {
    pub(crate) fn apply(&self, thresholds: &mut Thresholds) {
        if let Some(alpha) = self.alpha {
            thresholds.alpha = alpha;
        }
        if let Some(epsilon) = self.borderline_epsilon {
            thresholds.borderline_epsilon = epsilon;
        }
        if let Some(min) = self.min_sample_size {
            thresholds.min_sample_size = Some(min);
        }
    }
}

/// Per-method threshold overrides, typically calibrated against golden snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ThresholdOverrides {
    /// Patches keyed by method identifier.
    #[serde(default)]
    pub methods: BTreeMap<String, MethodOverride>,
}

/// Loads threshold overrides from the provided YAML path.
pub fn load_overrides(path: &Path) -> Result<ThresholdOverrides, InterpError> {
    let bytes = fs::read(path).map_err(|err| io_error("overrides_read", path, err))?;
    let overrides: ThresholdOverrides = from_yaml_slice(&bytes)?;
    debug!(
        path = %path.display(),
        methods = overrides.methods.len(),
        "loaded threshold overrides"
    );
    Ok(overrides)
}

/// Loads a complete rule table from the provided YAML path.
pub fn load_rule_table(path: &Path) -> Result<RuleTable, InterpError> {
    let bytes = fs::read(path).map_err(|err| io_error("rule_table_read", path, err))?;
    let table = RuleTable::from_yaml_slice(&bytes)?;
    debug!(
        path = %path.display(),
        methods = table.len(),
        "loaded rule table"
    );
    Ok(table)
}
