//! Rule evaluation, failure attribution and outcome aggregation

pub mod diagnostics;
pub mod evaluator;
pub mod outcome;
pub mod validator;
mod verdict;

pub use evaluator::{ROOT_VARIABLE, RuleEvaluator};
pub use outcome::{Finding, ValidationOutcome};
pub use validator::Validator;
pub use verdict::RuleVerdict;
