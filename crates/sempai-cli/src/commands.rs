//! Subcommand implementations.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use sempai::{AstRequest, Autofixer, SemgrepCore};
use sempai_core::{SourceRegistry, SpanDiagnostic};
use tracing::{debug, error};
use walkdir::WalkDir;

use crate::IoStreams;
use crate::cli::ReportFormat;
use crate::config::Config;
use crate::errors::AppError;

const COMMAND_TARGET: &str = "sempai_cli::commands";

/// Extensions recognised as rule files when searching directories.
const RULE_EXTENSIONS: &[&str] = &["yaml", "yml"];

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RunStatus {
    /// Nothing to report.
    Clean,
    /// Findings, skipped rules, or per-file failures were reported.
    Reported,
    /// An internal consistency check stopped the run.
    Aborted,
}

impl RunStatus {
    const fn merge(self, other: Self) -> Self {
        match (self, other) {
            (Self::Aborted, _) | (_, Self::Aborted) => Self::Aborted,
            (Self::Reported, _) | (_, Self::Reported) => Self::Reported,
            (Self::Clean, Self::Clean) => Self::Clean,
        }
    }
}

impl From<RunStatus> for ExitCode {
    fn from(status: RunStatus) -> Self {
        match status {
            RunStatus::Clean => Self::SUCCESS,
            RunStatus::Reported => Self::from(1_u8),
            RunStatus::Aborted => Self::from(2_u8),
        }
    }
}

/// Shared state for the file-based subcommands.
pub(crate) struct Session<'c> {
    config: &'c Config,
    core: SemgrepCore,
    registry: SourceRegistry,
}

impl<'c> Session<'c> {
    pub(crate) fn new(config: &'c Config) -> Self {
        Self {
            config,
            core: SemgrepCore::new(config.semgrep_core()),
            registry: SourceRegistry::new(),
        }
    }

    /// Fixes every rule file under `paths`.
    pub(crate) fn autofix<W: Write, E: Write>(
        &self,
        paths: &[PathBuf],
        io: &mut IoStreams<'_, W, E>,
    ) -> Result<RunStatus, AppError> {
        let fixer = Autofixer::new(&self.core);
        let mut status = RunStatus::Clean;
        for file in rule_files(paths, io)? {
            let file_status = match fixer.fix_file(&self.registry, &file) {
                Ok(outcome) => {
                    self.report(&outcome.skipped, io.stderr)?;
                    if outcome.changed() {
                        writeln!(
                            io.stdout,
                            "{}: removed {} alternative(s), rewrote {}",
                            file.display(),
                            outcome.removed,
                            outcome.rewritten
                        )?;
                    }
                    if outcome.skipped.is_empty() {
                        RunStatus::Clean
                    } else {
                        RunStatus::Reported
                    }
                }
                Err(err) => {
                    error!(target: COMMAND_TARGET, file = %file.display(), error = %err, "autofix failed");
                    self.report(&[err.to_diagnostic()], io.stderr)?;
                    if err.is_fatal_to_run() {
                        return Ok(RunStatus::Aborted);
                    }
                    RunStatus::Reported
                }
            };
            status = status.merge(file_status);
        }
        Ok(status)
    }

    /// Reports redundant alternatives in every rule file under `paths`.
    pub(crate) fn lint<W: Write, E: Write>(
        &self,
        paths: &[PathBuf],
        format: ReportFormat,
        io: &mut IoStreams<'_, W, E>,
    ) -> Result<RunStatus, AppError> {
        let fixer = Autofixer::new(&self.core);
        let mut status = RunStatus::Clean;
        for file in rule_files(paths, io)? {
            match fixer.lint_file(&self.registry, &file) {
                Ok(findings) if findings.is_empty() => {}
                Ok(findings) => {
                    status = status.merge(RunStatus::Reported);
                    match format {
                        ReportFormat::Text => self.report(&findings, io.stdout)?,
                        ReportFormat::Json => write_json(&findings, io.stdout)?,
                    }
                }
                Err(err) => {
                    error!(target: COMMAND_TARGET, file = %file.display(), error = %err, "lint failed");
                    self.report(&[err.to_diagnostic()], io.stderr)?;
                    status = status.merge(if err.is_fatal_to_run() {
                        RunStatus::Aborted
                    } else {
                        RunStatus::Reported
                    });
                }
            }
        }
        Ok(status)
    }

    /// Prints the raw dump for `request`.
    pub(crate) fn dump_ast<W: Write>(
        &self,
        request: &AstRequest,
        out: &mut W,
    ) -> Result<RunStatus, AppError> {
        let dump = self.core.dump(request)?;
        out.write_all(dump.as_bytes())?;
        if !dump.ends_with('\n') {
            writeln!(out)?;
        }
        Ok(RunStatus::Clean)
    }

    fn report(&self, diagnostics: &[SpanDiagnostic], out: &mut impl Write) -> Result<(), AppError> {
        for diagnostic in diagnostics {
            write!(out, "{}", diagnostic.emit(&self.registry, self.config.context()))?;
        }
        Ok(())
    }
}

fn write_json(diagnostics: &[SpanDiagnostic], out: &mut impl Write) -> Result<(), AppError> {
    for diagnostic in diagnostics {
        let line = serde_json::to_string(diagnostic).map_err(AppError::SerialiseDiagnostic)?;
        writeln!(out, "{line}")?;
    }
    Ok(())
}

/// Expands directories into the rule files they contain, sorted by path.
/// Explicit file arguments are kept whatever their extension.
fn rule_files<W: Write, E: Write>(
    paths: &[PathBuf],
    io: &mut IoStreams<'_, W, E>,
) -> Result<Vec<PathBuf>, AppError> {
    let mut files = Vec::new();
    for path in paths {
        if !path.is_dir() {
            files.push(path.clone());
            continue;
        }
        for entry in WalkDir::new(path).sort_by_file_name() {
            let entry = entry.map_err(|source| AppError::Walk {
                path: path.clone(),
                source,
            })?;
            if entry.file_type().is_file() && is_rule_file(entry.path()) {
                files.push(entry.into_path());
            }
        }
    }
    debug!(target: COMMAND_TARGET, count = files.len(), "collected rule files");
    if files.is_empty() {
        writeln!(io.stderr, "no rule files found")?;
    }
    Ok(files)
}

fn is_rule_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| RULE_EXTENSIONS.contains(&ext))
}
