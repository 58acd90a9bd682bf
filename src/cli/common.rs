//! Helpers shared across CLI commands: exit codes, path handling and
//! colored status lines.

use crate::cli::args::ColorChoice;
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use termcolor::{Color, ColorSpec, StandardStream, WriteColor};

/// Exit codes
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;
pub const EXIT_PARSE_ERROR: i32 = 3;

/// Separator printed between a warnings report and the status line
pub const SEPARATOR: &str = "-------------------------------------------------";

/// Kind of status line, which decides its color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Warning,
}

impl Status {
    fn color(self) -> Color {
        match self {
            Status::Success => Color::Green,
            Status::Warning => Color::Yellow,
        }
    }
}

/// Resolve the chart argument to an absolute path
pub(crate) fn absolute_chart_path(chart: &Path) -> io::Result<PathBuf> {
    std::path::absolute(chart)
}

/// Map the `--color` flag onto a termcolor choice for stdout
///
/// `auto` turns color off when stdout is not a terminal.
pub(crate) fn stdout_color(choice: ColorChoice) -> termcolor::ColorChoice {
    match choice {
        ColorChoice::Always => termcolor::ColorChoice::Always,
        ColorChoice::Never => termcolor::ColorChoice::Never,
        ColorChoice::Auto if io::stdout().is_terminal() => termcolor::ColorChoice::Auto,
        ColorChoice::Auto => termcolor::ColorChoice::Never,
    }
}

/// Print a bold, colored status line to stdout
pub(crate) fn print_status(choice: ColorChoice, status: Status, message: &str) -> io::Result<()> {
    let mut stdout = StandardStream::stdout(stdout_color(choice));
    stdout.set_color(ColorSpec::new().set_fg(Some(status.color())).set_bold(true))?;
    write!(stdout, "{}", message)?;
    stdout.reset()?;
    writeln!(stdout)
}
