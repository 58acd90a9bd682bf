#![forbid(unsafe_code)]

//! Rule definitions, named expression expansion and rule generation

pub mod expander;
pub mod generator;
mod rule;

// Re-export core types
pub use expander::MacroExpander;
pub use generator::RuleGenerator;
pub use rule::{Rule, RuleSet};
