//! Generate command implementation
//!
//! `helm-cel generate` derives a baseline rules file from the shape of a
//! chart's values file.

use crate::cli::args::ColorChoice;
use crate::cli::common::{
    EXIT_ERROR, EXIT_PARSE_ERROR, EXIT_SUCCESS, Status, absolute_chart_path, print_status,
};
use crate::config::Settings;
use crate::error::{ConfigError, GenerateError};
use crate::rules::RuleGenerator;
use std::path::PathBuf;

/// Error type specific to the generate command
#[derive(Debug, thiserror::Error)]
pub(crate) enum GenerateCommandError {
    #[error("failed to get absolute path: {0}")]
    ChartPath(#[source] std::io::Error),

    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Generate(#[from] GenerateError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl GenerateCommandError {
    fn exit_code(&self) -> i32 {
        match self {
            GenerateCommandError::Config(ConfigError::Parse(_)) => EXIT_PARSE_ERROR,
            GenerateCommandError::Generate(GenerateError::Load(e)) if e.is_parse() => {
                EXIT_PARSE_ERROR
            }
            _ => EXIT_ERROR,
        }
    }
}

/// Arguments of `helm-cel generate`; `None` falls back to the chart's
/// settings
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub chart: PathBuf,
    pub values_file: Option<PathBuf>,
    pub output_file: Option<PathBuf>,
    pub force: bool,
    pub color: ColorChoice,
}

/// Run the generate command
///
/// Exit code:
/// - 0: rules written
/// - 2: missing values file, existing output file or I/O error
/// - 3: malformed values or settings file
pub fn run_generate(options: &GenerateOptions) -> i32 {
    match run_generate_inner(options) {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            e.exit_code()
        }
    }
}

fn run_generate_inner(options: &GenerateOptions) -> Result<(), GenerateCommandError> {
    let chart = absolute_chart_path(&options.chart).map_err(GenerateCommandError::ChartPath)?;
    let settings = Settings::discover(&chart)?.generate;

    let values_path = chart.join(options.values_file.as_ref().unwrap_or(&settings.values_file));
    let output_path = chart.join(options.output_file.as_ref().unwrap_or(&settings.output_file));

    let generator = RuleGenerator::new();
    if !values_path.exists() {
        return Err(GenerateError::ValuesNotFound(values_path).into());
    }
    if !options.force && output_path.exists() {
        return Err(GenerateError::OutputExists(output_path).into());
    }

    let rules = generator.generate_from_file(&values_path)?;
    generator.write(&output_path, &rules, options.force)?;

    print_status(
        options.color,
        Status::Success,
        &format!("✅ Successfully generated {}", output_path.display()),
    )?;
    Ok(())
}
