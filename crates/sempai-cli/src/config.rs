//! Runtime configuration for the rule linter.
//!
//! Each setting comes from its command-line flag, then from its environment
//! variable, then from the built-in default.

use std::path::{Path, PathBuf};

use sempai_core::ContextWindow;
use strum::{Display, EnumString};

use crate::cli::Cli;
use crate::errors::AppError;

/// Environment variable holding the tracing filter.
pub const LOG_FILTER_ENV: &str = "SEMPAI_LOG_FILTER";
/// Environment variable holding the log format.
pub const LOG_FORMAT_ENV: &str = "SEMPAI_LOG_FORMAT";
/// Environment variable naming the `semgrep-core` executable.
pub const SEMGREP_CORE_ENV: &str = "SEMPAI_SEMGREP_CORE";

const DEFAULT_LOG_FILTER: &str = "info";
const DEFAULT_SEMGREP_CORE: &str = "semgrep-core";

/// Supported logging output formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// Structured JSON suitable for ingestion by logging stacks.
    Json,
    /// Human-readable single line output.
    #[default]
    Compact,
}

/// Resolved settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    log_filter: String,
    log_format: LogFormat,
    semgrep_core: PathBuf,
    context: ContextWindow,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: DEFAULT_LOG_FILTER.to_owned(),
            log_format: LogFormat::default(),
            semgrep_core: PathBuf::from(DEFAULT_SEMGREP_CORE),
            context: ContextWindow::default(),
        }
    }
}

impl Config {
    /// Resolves settings from parsed arguments and an environment lookup.
    pub(crate) fn resolve<F>(cli: &Cli, env: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let log_filter = cli
            .log_filter
            .clone()
            .or_else(|| env(LOG_FILTER_ENV))
            .unwrap_or(defaults.log_filter);
        let log_format = match (cli.log_format, env(LOG_FORMAT_ENV)) {
            (Some(format), _) => format,
            (None, Some(text)) => {
                text.parse()
                    .map_err(|err: strum::ParseError| AppError::InvalidEnvironment {
                        variable: LOG_FORMAT_ENV,
                        message: format!("{err}: `{text}`"),
                    })?
            }
            (None, None) => defaults.log_format,
        };
        let semgrep_core = cli
            .semgrep_core
            .clone()
            .or_else(|| env(SEMGREP_CORE_ENV).map(PathBuf::from))
            .unwrap_or(defaults.semgrep_core);
        let context = ContextWindow::new(
            cli.context_before.unwrap_or(0),
            cli.context_after.unwrap_or(0),
        );
        Ok(Self {
            log_filter,
            log_format,
            semgrep_core,
            context,
        })
    }

    /// Returns the tracing filter directives.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Returns the log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Returns the `semgrep-core` executable.
    #[must_use]
    pub fn semgrep_core(&self) -> &Path {
        &self.semgrep_core
    }

    /// Returns the context window used when rendering diagnostics.
    #[must_use]
    pub const fn context(&self) -> ContextWindow {
        self.context
    }
}
