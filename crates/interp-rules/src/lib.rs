#![deny(missing_docs)]
#![doc = "Method rule table: per-method metric routing, thresholds and guard order."]

pub mod builtin;
/// Threshold overrides and YAML loading.
pub mod config;
/// Descriptor types and validation.
pub mod descriptor;
/// Rule table lookup and cross-method consistency checks.
pub mod table;

pub use builtin::builtin_descriptors;
pub use config::{load_overrides, load_rule_table, MethodOverride, ThresholdOverrides};
pub use descriptor::{
    GuardId, Magnitude, MagnitudeBands, MethodDescriptor, MetricRole, MetricRule, SectionKind,
    Thresholds,
};
pub use table::{resolve, ConsistencyIssue, RuleTable, RuleTableFile};
