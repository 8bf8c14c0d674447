//! Structured error types shared across the interpretation crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured payload attached to every [`InterpError`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable error code.
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Contextual key value pairs (method ids, metric names, values).
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Optional hint that may help the caller resolve the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Creates a new error payload with the provided code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Adds a context entry to the payload.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Sets a human readable hint for remediation.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Canonical error type for the interpretation engine.
///
/// Only [`InterpError::UnknownMethod`] and [`InterpError::InvalidResult`] abort an
/// interpretation. [`InterpError::InvalidMetric`] and [`InterpError::GuardSkipped`] are
/// raised locally and recovered into caveat text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum InterpError {
    /// The method identifier is absent from the rule table.
    #[error("unknown method: {0}")]
    UnknownMethod(ErrorInfo),
    /// The statistical result is not a well-formed mapping.
    #[error("invalid result: {0}")]
    InvalidResult(ErrorInfo),
    /// A formatter received a value outside its documented domain.
    #[error("invalid metric: {0}")]
    InvalidMetric(ErrorInfo),
    /// A guard could not apply to a malformed metric.
    #[error("guard skipped: {0}")]
    GuardSkipped(ErrorInfo),
    /// Rule table or override configuration errors.
    #[error("config error: {0}")]
    Config(ErrorInfo),
    /// Serialization and schema errors.
    #[error("serde error: {0}")]
    Serde(ErrorInfo),
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)?;
        if !self.context.is_empty() {
            write!(f, " | context: [")?;
            for (idx, (key, value)) in self.context.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{key}={value}")?;
            }
            write!(f, "]")?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " | hint: {hint}")?;
        }
        Ok(())
    }
}

impl InterpError {
    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            InterpError::UnknownMethod(info)
            | InterpError::InvalidResult(info)
            | InterpError::InvalidMetric(info)
            | InterpError::GuardSkipped(info)
            | InterpError::Config(info)
            | InterpError::Serde(info) => info,
        }
    }

    /// Returns whether the error must abort the interpretation call.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            InterpError::UnknownMethod(_) | InterpError::InvalidResult(_)
        )
    }

    /// Builds an [`InterpError::UnknownMethod`] for the provided identifier.
    pub fn unknown_method(method_id: &str) -> Self {
        InterpError::UnknownMethod(
            ErrorInfo::new("unknown_method", "method is not present in the rule table")
                .with_context("method_id", method_id),
        )
    }

    /// Builds an [`InterpError::InvalidResult`] with the provided message.
    pub fn invalid_result(message: impl Into<String>) -> Self {
        InterpError::InvalidResult(ErrorInfo::new("invalid_result", message))
    }

    /// Builds an [`InterpError::InvalidMetric`] describing an out-of-domain value.
    pub fn invalid_metric(domain: &str, value: f64) -> Self {
        InterpError::InvalidMetric(
            ErrorInfo::new("value_out_of_range", "value out of expected range")
                .with_context("domain", domain)
                .with_context("value", value.to_string()),
        )
    }

    /// Builds an [`InterpError::Config`] with the provided code and message.
    pub fn config(code: &str, message: impl Into<String>) -> Self {
        InterpError::Config(ErrorInfo::new(code, message))
    }
}
