#![deny(missing_docs)]
#![doc = "Statistical interpretation engine: normalization, guard pipeline, section composer and facade."]

/// Section composition.
pub mod compose;
/// Engine facade.
pub mod engine;
pub mod guards;
/// Result normalization and typed views of nested metrics.
pub mod normalize;
pub mod report;

pub use compose::compose;
pub use engine::{interpret, interpret_with, InterpretationEngine};
pub use guards::{guard_for, run_guards, Directive, Guard, GuardSkip, GuardState};
pub use normalize::{normalize, NormalizedResult};
pub use report::{
    Diagnostics, FallbackResult, Fragment, FragmentSource, Interpretation, InterpretationResult,
    Section, FALLBACK_MESSAGE,
};

pub use interp_core::{InterpError, MetricValue, StatisticalResult};
pub use interp_rules::{GuardId, RuleTable, SectionKind};
