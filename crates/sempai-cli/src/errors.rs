//! Error types for the CLI runtime.

use std::io;
use std::path::PathBuf;

use sempai::AstClientError;
use thiserror::Error;

use crate::telemetry::TelemetryError;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("{0}")]
    CliUsage(clap::Error),
    #[error("invalid {variable}: {message}")]
    InvalidEnvironment {
        variable: &'static str,
        message: String,
    },
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error("failed to search {}: {source}", path.display())]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },
    #[error(transparent)]
    Collaborator(#[from] AstClientError),
    #[error("failed to serialise diagnostic: {0}")]
    SerialiseDiagnostic(serde_json::Error),
    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
}
