//! CLI argument parsing and command dispatch

pub mod args;
pub mod common;
pub mod generate;
pub mod validate;

// Re-export types for convenient access
pub use args::{Cli, ColorChoice, Command};
pub use generate::{GenerateOptions, run_generate};
pub use validate::{ValidateOptions, run_validate};
