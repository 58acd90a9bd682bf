//! Validate command implementation
//!
//! This module implements `helm-cel validate`, which:
//! - Resolves the chart directory and reads its optional helm-cel.toml
//! - Loads and merges values and rules files
//! - Expands and evaluates every rule
//! - Renders the outcome as text, JSON or YAML
//! - Returns the exit code

use crate::cli::args::ColorChoice;
use crate::cli::common::{
    EXIT_ERROR, EXIT_FAILED, EXIT_PARSE_ERROR, EXIT_SUCCESS, SEPARATOR, Status,
    absolute_chart_path, print_status,
};
use crate::config::Settings;
use crate::engine::{ValidationOutcome, Validator};
use crate::error::{ConfigError, ValidateError};
use crate::output::{HumanFormatter, OutputFormat, StructuredFormatter};
use std::path::PathBuf;
use tracing::debug;

/// Error type specific to the validate command
#[derive(Debug, thiserror::Error)]
pub(crate) enum ValidateCommandError {
    #[error("failed to get absolute path: {0}")]
    ChartPath(#[source] std::io::Error),

    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Validate(#[from] ValidateError),

    #[error("failed to marshal output to JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to marshal output to YAML: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ValidateCommandError {
    fn exit_code(&self) -> i32 {
        match self {
            ValidateCommandError::Config(ConfigError::Parse(_)) => EXIT_PARSE_ERROR,
            ValidateCommandError::Validate(ValidateError::Values(e))
            | ValidateCommandError::Validate(ValidateError::Rules(e))
                if e.is_parse() =>
            {
                EXIT_PARSE_ERROR
            }
            _ => EXIT_ERROR,
        }
    }
}

/// Arguments of `helm-cel validate`; empty lists and `None` fall back to
/// the chart's settings
#[derive(Debug, Clone)]
pub struct ValidateOptions {
    pub chart: PathBuf,
    pub values_files: Vec<PathBuf>,
    pub rules_files: Vec<PathBuf>,
    pub output: Option<OutputFormat>,
    pub color: ColorChoice,
}

/// Run the validate command
///
/// Exit code:
/// - 0: no error findings (warnings allowed)
/// - 1: at least one error finding
/// - 2: fatal error (I/O, expansion, settings)
/// - 3: malformed values, rules or settings file
pub fn run_validate(options: &ValidateOptions) -> i32 {
    match run_validate_inner(options) {
        Ok(true) => EXIT_SUCCESS,
        Ok(false) => EXIT_FAILED,
        Err(e) => {
            eprintln!("Error: {}", e);
            e.exit_code()
        }
    }
}

/// Returns whether validation passed
fn run_validate_inner(options: &ValidateOptions) -> Result<bool, ValidateCommandError> {
    let chart = absolute_chart_path(&options.chart).map_err(ValidateCommandError::ChartPath)?;
    let settings = Settings::discover(&chart)?.validate;

    let values_files = if options.values_files.is_empty() {
        settings.values_files
    } else {
        options.values_files.clone()
    };
    let rules_files = if options.rules_files.is_empty() {
        settings.rules_files
    } else {
        options.rules_files.clone()
    };
    let format = options.output.unwrap_or(settings.output);
    debug!(chart = %chart.display(), ?values_files, ?rules_files, ?format, "validating chart");

    let outcome = Validator::new().validate_chart(&chart, &values_files, &rules_files)?;
    render(&outcome, format, options.color)?;

    Ok(!outcome.has_errors())
}

fn render(
    outcome: &ValidationOutcome,
    format: OutputFormat,
    color: ColorChoice,
) -> Result<(), ValidateCommandError> {
    match format {
        OutputFormat::Json => println!("{}", StructuredFormatter::new().json(outcome)?),
        OutputFormat::Yaml => print!("{}", StructuredFormatter::new().yaml(outcome)?),
        OutputFormat::Text => {
            let report = HumanFormatter::new().format(outcome);
            if outcome.has_errors() {
                eprintln!("{}", report);
            } else if outcome.has_warnings() {
                println!("{}", report);
                println!("{}", SEPARATOR);
                print_status(
                    color,
                    Status::Warning,
                    "⚠️✅ Values validation successful with warnings!",
                )?;
            } else {
                print_status(color, Status::Success, "✅ Values validation successful!")?;
            }
        }
    }
    Ok(())
}
