//! CLI entrypoint for the Sempai rule linter.
//!
//! The binary delegates to [`sempai_cli::run`], which parses arguments,
//! resolves configuration, installs telemetry, and runs the selected
//! subcommand.

use std::io::{self, StderrLock, StdoutLock};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdout: StdoutLock<'_> = io::stdout().lock();
    let mut stderr: StderrLock<'_> = io::stderr().lock();
    sempai_cli::run(std::env::args_os(), &mut stdout, &mut stderr)
}
