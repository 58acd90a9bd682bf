//! Parsing and validation for helm-cel.toml project settings

use crate::error::ConfigError;
use crate::output::OutputFormat;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name of the optional settings file looked up in the chart directory
pub const SETTINGS_FILE: &str = "helm-cel.toml";

/// Default values file, relative to the chart directory
pub const DEFAULT_VALUES_FILE: &str = "values.yaml";

/// Default rules file, relative to the chart directory
pub const DEFAULT_RULES_FILE: &str = "values.cel.yaml";

/// Project settings for a chart
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Defaults for `helm-cel validate`
    #[serde(default)]
    pub validate: ValidateSettings,

    /// Defaults for `helm-cel generate`
    #[serde(default)]
    pub generate: GenerateSettings,
}

impl Settings {
    /// Load settings from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse settings from a TOML string
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let settings: Settings = toml::from_str(s)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load `helm-cel.toml` from the chart directory, or defaults if absent
    pub fn discover(chart_dir: &Path) -> Result<Self, ConfigError> {
        let path = chart_dir.join(SETTINGS_FILE);
        if !path.is_file() {
            return Ok(Self::default());
        }
        debug!(path = %path.display(), "loading settings");
        Self::load(path)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        check_file_list("validate.values-files", &self.validate.values_files)?;
        check_file_list("validate.rules-files", &self.validate.rules_files)?;
        check_file("generate.values-file", &self.generate.values_file)?;
        check_file("generate.output-file", &self.generate.output_file)?;
        Ok(())
    }
}

fn check_file_list(field: &str, files: &[PathBuf]) -> Result<(), ConfigError> {
    if files.is_empty() {
        return Err(ConfigError::Validation(format!(
            "'{}' must list at least one file",
            field
        )));
    }
    for file in files {
        check_file(field, file)?;
    }
    Ok(())
}

fn check_file(field: &str, file: &Path) -> Result<(), ConfigError> {
    if file.as_os_str().to_string_lossy().trim().is_empty() {
        return Err(ConfigError::Validation(format!(
            "'{}' contains an empty file name",
            field
        )));
    }
    Ok(())
}

/// `[validate]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ValidateSettings {
    /// Values files, merged in order
    #[serde(default = "default_values_files")]
    pub values_files: Vec<PathBuf>,

    /// Rules files, concatenated in order
    #[serde(default = "default_rules_files")]
    pub rules_files: Vec<PathBuf>,

    /// Report format
    #[serde(default)]
    pub output: OutputFormat,
}

impl Default for ValidateSettings {
    fn default() -> Self {
        Self {
            values_files: default_values_files(),
            rules_files: default_rules_files(),
            output: OutputFormat::default(),
        }
    }
}

/// `[generate]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct GenerateSettings {
    /// Values file to derive rules from
    #[serde(default = "default_values_file")]
    pub values_file: PathBuf,

    /// Where generated rules are written
    #[serde(default = "default_rules_file")]
    pub output_file: PathBuf,
}

impl Default for GenerateSettings {
    fn default() -> Self {
        Self {
            values_file: default_values_file(),
            output_file: default_rules_file(),
        }
    }
}

fn default_values_file() -> PathBuf {
    PathBuf::from(DEFAULT_VALUES_FILE)
}

fn default_rules_file() -> PathBuf {
    PathBuf::from(DEFAULT_RULES_FILE)
}

fn default_values_files() -> Vec<PathBuf> {
    vec![default_values_file()]
}

fn default_rules_files() -> Vec<PathBuf> {
    vec![default_rules_file()]
}
