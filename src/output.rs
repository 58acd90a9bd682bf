//! Output formatters (text, JSON and YAML)

pub mod human;
pub mod structured;

pub use human::HumanFormatter;
pub use structured::{StructuredFormatter, ValidationReport};

use serde::{Deserialize, Serialize};

/// Report format for `helm-cel validate`
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable report
    #[default]
    Text,
    /// Pretty-printed JSON document
    Json,
    /// YAML document
    Yaml,
}
