use interp_core::errors::InterpError;
use interp_core::StatisticalResult;
use interp_rules::{MethodDescriptor, RuleTable};
use serde_json::Value;
use tracing::debug;

use crate::compose::compose;
use crate::guards::run_guards;
use crate::normalize::normalize;
use crate::report::{FallbackResult, Interpretation, InterpretationResult};

/// Entry point binding a rule table to the interpretation pipeline.
///
/// The engine only borrows its table, so any number of engines (and threads) can
/// share one. It holds no other state.
#[derive(Debug, Clone, Copy)]
pub struct InterpretationEngine<'t> {
    table: &'t RuleTable,
}

impl InterpretationEngine<'static> {
    /// Engine over the built-in rule table.
    pub fn builtin() -> Result<Self, InterpError> {
        Ok(Self::new(RuleTable::builtin()?))
    }
}

impl<'t> InterpretationEngine<'t> {
    /// Engine over an injected rule table.
    pub fn new(table: &'t RuleTable) -> Self {
        Self { table }
    }

    /// Rule table in use.
    pub fn table(&self) -> &'t RuleTable {
        self.table
    }

    /// Interprets a typed result.
    pub fn interpret(
        &self,
        method_id: &str,
        result: &StatisticalResult,
    ) -> Result<InterpretationResult, InterpError> {
        let descriptor = self.table.resolve(method_id)?;
        Ok(interpret_with(descriptor, result))
    }

    /// Interprets a JSON value. Anything other than an object is [`InterpError::InvalidResult`].
    pub fn interpret_value(
        &self,
        method_id: &str,
        value: &Value,
    ) -> Result<InterpretationResult, InterpError> {
        let descriptor = self.table.resolve(method_id)?;
        let result = StatisticalResult::from_json_value(value)?;
        Ok(interpret_with(descriptor, &result))
    }

    /// Interprets raw JSON bytes.
    pub fn interpret_json(
        &self,
        method_id: &str,
        bytes: &[u8],
    ) -> Result<InterpretationResult, InterpError> {
        let descriptor = self.table.resolve(method_id)?;
        let value: Value = serde_json::from_slice(bytes).map_err(|err| {
            InterpError::invalid_result(format!("result is not valid JSON: {err}"))
        })?;
        let result = StatisticalResult::from_json_value(&value)?;
        Ok(interpret_with(descriptor, &result))
    }

    /// Like [`InterpretationEngine::interpret_value`], but turns fatal errors into a
    /// [`FallbackResult`] instead of returning them.
    pub fn interpret_or_fallback(&self, method_id: &str, value: &Value) -> Interpretation {
        match self.interpret_value(method_id, value) {
            Ok(result) => Interpretation::Interpreted(result),
            Err(err) => {
                debug!(method_id, code = %err.info().code, "no interpretation available");
                Interpretation::Fallback(FallbackResult::from_error(method_id, &err))
            }
        }
    }
}

/// Runs normalization, the descriptor's guards and the composer.
///
/// Total for any descriptor and result: data anomalies surface as caveats.
pub fn interpret_with(
    descriptor: &MethodDescriptor,
    result: &StatisticalResult,
) -> InterpretationResult {
    debug!(
        method_id = %descriptor.id,
        metrics = result.len(),
        guards = descriptor.guards.len(),
        "interpreting result"
    );
    let state = run_guards(normalize(result, descriptor), descriptor);
    let interpretation = compose(&state, descriptor);
    debug!(
        method_id = %descriptor.id,
        fragments = interpretation
            .sections
            .iter()
            .map(|section| section.fragments.len())
            .sum::<usize>(),
        skipped = interpretation.diagnostics.skipped.len(),
        empty = interpretation.empty,
        "interpretation composed"
    );
    interpretation
}

/// Interprets `result` under the built-in rule table.
pub fn interpret(
    method_id: &str,
    result: &StatisticalResult,
) -> Result<InterpretationResult, InterpError> {
    InterpretationEngine::builtin()?.interpret(method_id, result)
}
