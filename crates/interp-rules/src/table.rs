use std::collections::BTreeMap;
use std::sync::OnceLock;

use interp_core::errors::{ErrorInfo, InterpError};
use interp_core::hash::stable_hash_string;
use interp_core::provenance::SchemaVersion;
use interp_core::serde::from_yaml_slice;
use serde::{Deserialize, Serialize};

use crate::builtin::builtin_descriptors;
use crate::config::ThresholdOverrides;
use crate::descriptor::{MethodDescriptor, MetricRole, SectionKind};

/// Serialized form of a rule table, as authored in YAML or JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleTableFile {
    /// Version of the rule set.
    #[serde(default)]
    pub version: SchemaVersion,
    /// Descriptors in authoring order.
    pub methods: Vec<MethodDescriptor>,
}

/// Read-only lookup from method identifier to descriptor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleTable {
    version: SchemaVersion,
    methods: BTreeMap<String, MethodDescriptor>,
}

/// Cross-method rule that a descriptor does not satisfy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsistencyIssue {
    /// Offending method.
    pub method_id: String,
    /// Offending metric, when the issue concerns one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric: Option<String>,
    /// Description of the violated rule.
    pub issue: String,
}

static BUILTIN: OnceLock<Result<RuleTable, InterpError>> = OnceLock::new();

impl RuleTable {
    /// Builds a table, rejecting duplicate identifiers and invalid descriptors.
    pub fn new(
        version: SchemaVersion,
        descriptors: Vec<MethodDescriptor>,
    ) -> Result<Self, InterpError> {
        let mut methods = BTreeMap::new();
        for descriptor in descriptors {
            descriptor.validate()?;
            if methods.contains_key(&descriptor.id) {
                return Err(InterpError::Config(
                    ErrorInfo::new("duplicate_method", "method declared twice")
                        .with_context("method_id", descriptor.id.clone()),
                ));
            }
            methods.insert(descriptor.id.clone(), descriptor);
        }
        Ok(Self { version, methods })
    }

    /// The process-wide built-in table, built on first use.
    pub fn builtin() -> Result<&'static RuleTable, InterpError> {
        BUILTIN
            .get_or_init(|| RuleTable::new(SchemaVersion::new(1, 0, 0), builtin_descriptors()))
            .as_ref()
            .map_err(Clone::clone)
    }

    /// Parses a table from YAML.
    pub fn from_yaml_slice(data: &[u8]) -> Result<Self, InterpError> {
        let file: RuleTableFile = from_yaml_slice(data)?;
        Self::new(file.version, file.methods)
    }

    /// Resolves a descriptor. Unknown identifiers are never mapped to a default.
    pub fn resolve(&self, method_id: &str) -> Result<&MethodDescriptor, InterpError> {
        self.methods
            .get(method_id)
            .ok_or_else(|| InterpError::unknown_method(method_id))
    }

    /// Whether the identifier is known.
    pub fn contains(&self, method_id: &str) -> bool {
        self.methods.contains_key(method_id)
    }

    /// Version of the rule set.
    pub fn version(&self) -> SchemaVersion {
        self.version
    }

    /// Known identifiers in sorted order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }

    /// Descriptors in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &MethodDescriptor> {
        self.methods.values()
    }

    /// Number of descriptors.
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// Serializable form in identifier order.
    pub fn to_file(&self) -> RuleTableFile {
        RuleTableFile {
            version: self.version,
            methods: self.methods.values().cloned().collect(),
        }
    }

    /// Stable SHA256 of the canonical JSON table.
    pub fn fingerprint(&self) -> Result<String, InterpError> {
        stable_hash_string(&self.to_file())
    }

    /// Returns a new table with per-method thresholds replaced.
    pub fn with_overrides(&self, overrides: &ThresholdOverrides) -> Result<Self, InterpError> {
        let mut methods = self.methods.clone();
        for (method_id, patch) in &overrides.methods {
            let descriptor = methods
                .get_mut(method_id)
                .ok_or_else(|| InterpError::unknown_method(method_id))?;
            patch.apply(&mut descriptor.thresholds);
            descriptor.validate()?;
        }
        Ok(Self {
            version: self.version,
            methods,
        })
    }

    /// Reports descriptors that break cross-method routing conventions.
    pub fn consistency_issues(&self) -> Vec<ConsistencyIssue> {
        let mut issues = Vec::new();
        for descriptor in self.methods.values() {
            let routes_p_value = descriptor.rendered_metrics().any(|rule| {
                rule.role == MetricRole::PValue && rule.section == SectionKind::Statistical
            });
            if !routes_p_value {
                issues.push(ConsistencyIssue {
                    method_id: descriptor.id.clone(),
                    metric: None,
                    issue: "no p-value routed to the statistical section".to_string(),
                });
            }
            for rule in descriptor.rendered_metrics() {
                let expected = if rule.is_accuracy_like() {
                    Some(SectionKind::Practical)
                } else if rule.role == MetricRole::AssumptionCheck {
                    Some(SectionKind::Caveats)
                } else {
                    None
                };
                if let Some(expected) = expected {
                    if rule.section != expected {
                        issues.push(ConsistencyIssue {
                            method_id: descriptor.id.clone(),
                            metric: Some(rule.key.clone()),
                            issue: format!(
                                "expected routing to `{}`, found `{}`",
                                expected.as_str(),
                                rule.section.as_str()
                            ),
                        });
                    }
                }
            }
        }
        issues
    }
}

/// Resolves a descriptor from the built-in table.
pub fn resolve(method_id: &str) -> Result<&'static MethodDescriptor, InterpError> {
    RuleTable::builtin()?.resolve(method_id)
}
