#![deny(missing_docs)]
#![doc = "Core error taxonomy, result data model, and canonical serialization helpers for the statistical interpretation engine."]

pub mod errors;
/// Canonical hashing helpers.
pub mod hash;
pub mod provenance;
pub mod result;
/// Canonical JSON and YAML helpers.
pub mod serde;

pub use errors::{ErrorInfo, InterpError};
pub use hash::stable_hash_string;
pub use provenance::{SchemaVersion, INTERPRETATION_SCHEMA};
pub use result::{MetricValue, StatisticalResult};
