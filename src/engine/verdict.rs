use crate::error::{CompileError, EvalError, ProgramError};
use crate::expr::CelValue;

/// What happened when one expanded rule was run against the document
#[derive(Debug, Clone)]
pub enum RuleVerdict {
    /// The expression evaluated to `true`.
    Passed,
    /// The expression did not parse or check.
    CompileFailed(CompileError),
    /// The expression checked but could not be prepared for evaluation.
    ProgramFailed(ProgramError),
    /// Evaluation stopped with a runtime error.
    EvalFailed(EvalError),
    /// Evaluation produced something other than `true`.
    Failed(CelValue),
}

impl RuleVerdict {
    /// Returns true if the rule holds.
    pub fn is_pass(&self) -> bool {
        matches!(self, RuleVerdict::Passed)
    }

    /// Short label used in debug logs.
    pub fn label(&self) -> &'static str {
        match self {
            RuleVerdict::Passed => "passed",
            RuleVerdict::CompileFailed(_) => "compile-failed",
            RuleVerdict::ProgramFailed(_) => "program-failed",
            RuleVerdict::EvalFailed(_) => "eval-failed",
            RuleVerdict::Failed(_) => "failed",
        }
    }
}
