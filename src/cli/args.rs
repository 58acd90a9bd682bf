//! CLI argument parsing using clap

use crate::output::OutputFormat;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Color output choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Automatically detect if terminal supports color
    Auto,
    /// Always use color
    Always,
    /// Never use color
    Never,
}

/// helm-cel CLI main entry point
#[derive(Parser, Debug)]
#[command(name = "helm-cel")]
#[command(about = "Validate Helm chart values with CEL expressions")]
#[command(version)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,

    /// Output coloring
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Log rule evaluation details to stderr
    #[arg(long, global = true)]
    pub verbose: bool,
}

/// Available helm-cel subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate Helm values using CEL expressions
    #[command(after_help = "Examples:
  helm-cel validate ./mychart
  helm-cel validate ./mychart -v values1.yaml -v values2.yaml
  helm-cel validate ./mychart -v prod.yaml,staging.yaml -r rules1.cel.yaml,rules2.cel.yaml
  helm-cel validate ./mychart -o json")]
    Validate {
        /// Chart directory
        chart: PathBuf,

        /// Values files to validate (comma-separated or multiple -v flags)
        #[arg(short = 'v', long = "values-file", value_delimiter = ',')]
        values_files: Vec<PathBuf>,

        /// Rules files to validate against (comma-separated or multiple -r flags)
        #[arg(short = 'r', long = "rules-file", value_delimiter = ',')]
        rules_files: Vec<PathBuf>,

        /// Output format
        #[arg(short, long)]
        output: Option<OutputFormat>,
    },

    /// Generate CEL validation rules from values.yaml
    #[command(after_help = "Examples:
  helm-cel generate ./mychart
  helm-cel generate ./mychart --values-file prod.values.yaml
  helm-cel generate ./mychart --force")]
    Generate {
        /// Chart directory
        chart: PathBuf,

        /// Values file to generate rules from
        #[arg(short = 'v', long = "values-file")]
        values_file: Option<PathBuf>,

        /// Output file for generated rules
        #[arg(short = 'o', long = "output-file")]
        output_file: Option<PathBuf>,

        /// Force overwrite existing rules file
        #[arg(short, long)]
        force: bool,
    },
}
