//! Structured interpretation output and its serialized forms.

use std::collections::BTreeMap;

use interp_core::errors::InterpError;
use interp_core::provenance::SchemaVersion;
use interp_core::serde::to_canonical_json_bytes;
use interp_core::stable_hash_string;
use interp_rules::{GuardId, SectionKind};
use serde::{Deserialize, Serialize};

use crate::guards::GuardSkip;

/// Fixed message carried by every [`FallbackResult`].
pub const FALLBACK_MESSAGE: &str = "No interpretation is available for this result.";

/// What produced a fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FragmentSource {
    /// Default rendering of a declared metric.
    Metric {
        /// Metric key.
        metric: String,
    },
    /// Substitute text or caveat emitted by a guard.
    Guard {
        /// Emitting guard.
        guard: GuardId,
        /// Metric concerned, if any.
        #[serde(skip_serializing_if = "Option::is_none")]
        metric: Option<String>,
    },
    /// Anomaly detected while rendering.
    Composer {
        /// Metric concerned.
        metric: String,
    },
}

/// One sentence of the interpretation plus the raw values it was derived from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    /// Rendered sentence.
    pub text: String,
    /// Origin of the sentence.
    pub source: FragmentSource,
    /// Raw inputs, `None` where the value was absent.
    #[serde(default)]
    pub values: BTreeMap<String, Option<f64>>,
}

/// Named, ordered bucket of fragments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Section name.
    pub kind: SectionKind,
    /// Fragments in rendering order.
    pub fragments: Vec<Fragment>,
}

impl Section {
    /// Empty section of the given kind.
    pub fn new(kind: SectionKind) -> Self {
        Self {
            kind,
            fragments: Vec::new(),
        }
    }

    /// Fragment texts in order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.fragments.iter().map(|fragment| fragment.text.as_str())
    }

    /// Whether the section holds no fragments.
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }
}

/// Audit trail of the run that produced an interpretation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    /// Guards in execution order.
    pub guards_run: Vec<GuardId>,
    /// Guards that could not apply to malformed metrics.
    pub skipped: Vec<GuardSkip>,
    /// Declared optional metrics that were absent.
    pub unreported: Vec<String>,
    /// Declared, excluded metrics present in the input.
    pub excluded: Vec<String>,
    /// Input keys the descriptor does not declare.
    pub ignored: Vec<String>,
}

/// Multi-section narrative interpretation of one statistical result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterpretationResult {
    /// Method identifier the result was interpreted under.
    pub method_id: String,
    /// Display name of the method.
    pub method_name: String,
    /// Output schema version.
    pub schema_version: SchemaVersion,
    /// Sections in descriptor order.
    pub sections: Vec<Section>,
    /// Set when every section is empty.
    pub empty: bool,
    /// How the interpretation was produced.
    pub diagnostics: Diagnostics,
}

impl InterpretationResult {
    /// Section of the given kind, if declared.
    pub fn section(&self, kind: SectionKind) -> Option<&Section> {
        self.sections.iter().find(|section| section.kind == kind)
    }

    /// Fragment texts of a section; empty when the section is not declared.
    pub fn texts(&self, kind: SectionKind) -> Vec<&str> {
        self.section(kind)
            .map(|section| section.texts().collect())
            .unwrap_or_default()
    }

    /// Canonical JSON with sorted keys.
    pub fn to_bytes(&self) -> Result<Vec<u8>, InterpError> {
        to_canonical_json_bytes(self)
    }

    /// SHA-256 of the canonical JSON.
    pub fn digest(&self) -> Result<String, InterpError> {
        stable_hash_string(self)
    }

    /// Plain-text rendering: method name, then each section heading and its fragments.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&self.method_name);
        out.push('\n');
        if self.empty {
            out.push_str("No usable metrics were reported for this analysis.\n");
        }
        for section in &self.sections {
            out.push('\n');
            out.push_str(section.kind.title());
            out.push('\n');
            if section.is_empty() {
                out.push_str("  (nothing to report)\n");
            }
            for text in section.texts() {
                out.push_str("- ");
                out.push_str(text);
                out.push('\n');
            }
        }
        out
    }
}

/// Explicit "no interpretation" answer for calls that cannot be interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackResult {
    /// Method identifier the caller asked for.
    pub method_id: String,
    /// Error code that prevented interpretation.
    pub code: String,
    /// Always [`FALLBACK_MESSAGE`].
    pub message: String,
    /// Error detail.
    pub detail: String,
}

impl FallbackResult {
    /// Builds a fallback from a fatal error.
    pub fn from_error(method_id: &str, err: &InterpError) -> Self {
        Self {
            method_id: method_id.to_string(),
            code: err.info().code.clone(),
            message: FALLBACK_MESSAGE.to_string(),
            detail: err.to_string(),
        }
    }
}

/// Either an interpretation or the fallback that replaced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Interpretation {
    /// The result was interpreted.
    Interpreted(InterpretationResult),
    /// The call could not be interpreted.
    Fallback(FallbackResult),
}

impl Interpretation {
    /// The interpretation, if one was produced.
    pub fn interpreted(&self) -> Option<&InterpretationResult> {
        match self {
            Interpretation::Interpreted(result) => Some(result),
            Interpretation::Fallback(_) => None,
        }
    }

    /// Whether this is a fallback.
    pub fn is_fallback(&self) -> bool {
        matches!(self, Interpretation::Fallback(_))
    }
}
