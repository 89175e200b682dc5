//! CLI argument definitions for the Sempai rule linter.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::config::LogFormat;

/// Rendering of lint findings.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
pub(crate) enum ReportFormat {
    /// Source snippets with line numbers.
    #[default]
    Text,
    /// One JSON diagnostic per line.
    Json,
}

/// Command-line interface for the Sempai rule linter.
#[derive(Parser, Debug)]
#[command(
    name = "sempai-lint",
    version,
    about = "Finds and removes redundant pattern alternatives in Semgrep rules",
    disable_help_subcommand = true
)]
pub(crate) struct Cli {
    /// Tracing filter directives, for example `sempai=debug`.
    #[arg(long, global = true, value_name = "FILTER")]
    pub(crate) log_filter: Option<String>,
    /// Log output format: `compact` or `json`.
    #[arg(long, global = true, value_name = "FORMAT")]
    pub(crate) log_format: Option<LogFormat>,
    /// The `semgrep-core` executable used to parse patterns.
    #[arg(long, global = true, value_name = "PATH")]
    pub(crate) semgrep_core: Option<PathBuf>,
    /// Source lines shown before each reported span.
    #[arg(long, global = true, value_name = "LINES")]
    pub(crate) context_before: Option<u32>,
    /// Source lines shown after each reported span.
    #[arg(long, global = true, value_name = "LINES")]
    pub(crate) context_after: Option<u32>,
    /// The operation to run.
    #[command(subcommand)]
    pub(crate) command: CliCommand,
}

/// Subcommands of the rule linter.
#[derive(Subcommand, Debug, Clone)]
pub(crate) enum CliCommand {
    /// Removes redundant `pattern-either` alternatives in place.
    Autofix {
        /// Rule files, or directories searched for `*.yaml` and `*.yml`.
        #[arg(required = true, value_name = "PATH")]
        paths: Vec<PathBuf>,
    },
    /// Reports redundant `pattern-either` alternatives without editing.
    Lint {
        /// How findings are rendered.
        #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
        format: ReportFormat,
        /// Rule files, or directories searched for `*.yaml` and `*.yml`.
        #[arg(required = true, value_name = "PATH")]
        paths: Vec<PathBuf>,
    },
    /// Prints the AST `semgrep-core` produces for a pattern or file.
    DumpAst {
        /// Language to parse as.
        #[arg(long, value_name = "LANG")]
        lang: String,
        /// Inline pattern text.
        #[arg(long, conflicts_with = "targets", required_unless_present = "targets")]
        pattern: Option<String>,
        /// Source file to parse; exactly one is accepted.
        #[arg(long = "target", value_name = "FILE")]
        targets: Vec<PathBuf>,
        /// Requests JSON instead of the engine's text form.
        #[arg(long)]
        json: bool,
    },
}
