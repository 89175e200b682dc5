//! Command-line runtime for the Sempai rule linter.
//!
//! The module owns argument parsing, configuration resolution, telemetry
//! setup, and dispatch to the subcommands. [`run`] takes the argument list
//! and output streams explicitly so tests can drive it in-process.
//!
//! Exit codes: `0` when nothing was reported, `1` for findings, skipped
//! rules, per-file failures, and usage errors, and `2` when an internal
//! consistency check stopped the run.

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use clap::error::ErrorKind;
use sempai::AstRequest;
use tracing::debug;

mod cli;
mod commands;
pub mod config;
mod errors;
mod telemetry;

use cli::{Cli, CliCommand};
use commands::{RunStatus, Session};
pub use config::{Config, LogFormat};
use errors::AppError;

const RUN_TARGET: &str = "sempai_cli";

/// Bundles the output streams provided to the CLI runtime.
pub(crate) struct IoStreams<'a, W: Write, E: Write> {
    pub(crate) stdout: &'a mut W,
    pub(crate) stderr: &'a mut E,
}

/// Runs the CLI using the provided arguments and output streams, reading
/// configuration overrides from the process environment.
#[must_use]
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    run_with_env(args, stdout, stderr, |key| std::env::var(key).ok())
}

/// Runs the CLI with an explicit environment lookup.
pub(crate) fn run_with_env<I, W, E, F>(args: I, stdout: &mut W, stderr: &mut E, env: F) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
    F: Fn(&str) -> Option<String>,
{
    let mut io = IoStreams { stdout, stderr };
    match execute(args, &mut io, env) {
        Ok(status) => status.into(),
        Err(AppError::CliUsage(usage)) if is_informational(&usage) => {
            let _ = write!(io.stdout, "{usage}");
            ExitCode::SUCCESS
        }
        Err(error) => {
            let _ = writeln!(io.stderr, "{error}");
            ExitCode::FAILURE
        }
    }
}

fn execute<I, W, E, F>(
    args: I,
    io: &mut IoStreams<'_, W, E>,
    env: F,
) -> Result<RunStatus, AppError>
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
    F: Fn(&str) -> Option<String>,
{
    let cli = Cli::try_parse_from(args).map_err(AppError::CliUsage)?;
    let config = Config::resolve(&cli, env)?;
    telemetry::initialise(&config)?;
    debug!(
        target: RUN_TARGET,
        semgrep_core = %config.semgrep_core().display(),
        "configuration resolved"
    );

    let session = Session::new(&config);
    match cli.command {
        CliCommand::Autofix { paths } => session.autofix(&paths, io),
        CliCommand::Lint { format, paths } => session.lint(&paths, format, io),
        CliCommand::DumpAst {
            lang,
            pattern,
            targets,
            json,
        } => {
            let request = match pattern {
                Some(pattern) => AstRequest::pattern(lang, pattern),
                None => AstRequest::files(lang, targets),
            };
            session.dump_ast(&request.with_json(json), io.stdout)
        }
    }
}

fn is_informational(usage: &clap::Error) -> bool {
    matches!(
        usage.kind(),
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion
    )
}

#[cfg(test)]
mod tests;
