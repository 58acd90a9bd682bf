//! helm-cel CLI entry point

use clap::Parser;
use helm_cel::cli::{Cli, Command, GenerateOptions, ValidateOptions, run_generate, run_validate};
use std::process;
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let exit_code = match cli.command {
        Command::Validate {
            chart,
            values_files,
            rules_files,
            output,
        } => run_validate(&ValidateOptions {
            chart,
            values_files,
            rules_files,
            output,
            color: cli.color,
        }),
        Command::Generate {
            chart,
            values_file,
            output_file,
            force,
        } => run_generate(&GenerateOptions {
            chart,
            values_file,
            output_file,
            force,
            color: cli.color,
        }),
    };

    process::exit(exit_code);
}
