//! Pattern AST lookups through the `semgrep-core` executable.
//!
//! [`SemgrepCore`] shells out once per distinct [`AstRequest`] and memoises
//! the output for its own lifetime. The cache lock is released while the
//! subprocess runs, so concurrent callers may race to compute the same key;
//! the first result written wins and later ones are discarded.

use std::collections::HashMap;
use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use crate::ast::PatternAst;
use crate::error::AstClientError;

/// Tracing target for collaborator invocations.
const CLIENT_TARGET: &str = "sempai::client";

/// Source of pattern ASTs.
///
/// Implementations must be deterministic: the same language and pattern
/// always yield the same AST.
pub trait PatternAstSource {
    /// Returns the AST of `pattern` parsed as `language`.
    ///
    /// # Errors
    ///
    /// Returns an [`AstClientError`] when the pattern cannot be parsed or
    /// the parser cannot be run.
    fn pattern_ast(&self, language: &str, pattern: &str) -> Result<Arc<PatternAst>, AstClientError>;
}

/// What to dump.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AstTarget {
    /// Inline pattern text.
    Pattern(String),
    /// Source files; exactly one is accepted.
    Files(Vec<PathBuf>),
}

/// One dump invocation, also used as the memo key.
///
/// # Example
///
/// ```
/// use sempai::{AstRequest, AstTarget};
///
/// let request = AstRequest::pattern("python", "return foo()");
/// assert!(request.json());
/// assert_eq!(request.target(), &AstTarget::Pattern(String::from("return foo()")));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AstRequest {
    language: String,
    target: AstTarget,
    json: bool,
}

impl AstRequest {
    /// Requests the JSON dump of a pattern.
    #[must_use]
    pub fn pattern(language: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            target: AstTarget::Pattern(pattern.into()),
            json: true,
        }
    }

    /// Requests the JSON dump of source files.
    #[must_use]
    pub fn files(language: impl Into<String>, files: Vec<PathBuf>) -> Self {
        Self {
            language: language.into(),
            target: AstTarget::Files(files),
            json: true,
        }
    }

    /// Selects JSON or the engine's native text output.
    #[must_use]
    pub const fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    /// Returns the language.
    #[must_use]
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Returns the dump target.
    #[must_use]
    pub const fn target(&self) -> &AstTarget {
        &self.target
    }

    /// Returns `true` when JSON output is requested.
    #[must_use]
    pub const fn json(&self) -> bool {
        self.json
    }
}

/// Memoising client for the `semgrep-core` executable.
#[derive(Debug)]
pub struct SemgrepCore {
    executable: PathBuf,
    dumps: Mutex<HashMap<AstRequest, Arc<str>>>,
    asts: Mutex<HashMap<AstRequest, Arc<PatternAst>>>,
}

impl SemgrepCore {
    /// Creates a client for `executable`, resolved through `PATH` when it
    /// is a bare name.
    #[must_use]
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            dumps: Mutex::new(HashMap::new()),
            asts: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the configured executable.
    #[must_use]
    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Returns the raw dump for `request`, running the executable on the
    /// first call for each distinct request.
    ///
    /// # Errors
    ///
    /// Returns [`AstClientError::TargetCount`] unless a file request names
    /// exactly one file, and the spawn, exit-status, or decoding error of
    /// the invocation otherwise.
    pub fn dump(&self, request: &AstRequest) -> Result<Arc<str>, AstClientError> {
        if let Some(hit) = lock(&self.dumps).get(request) {
            debug!(target: CLIENT_TARGET, language = request.language(), "dump cache hit");
            return Ok(Arc::clone(hit));
        }
        let output: Arc<str> = Arc::from(self.invoke(request)?);
        let stored = lock(&self.dumps)
            .entry(request.clone())
            .or_insert(output)
            .clone();
        Ok(stored)
    }

    fn invoke(&self, request: &AstRequest) -> Result<String, AstClientError> {
        let mut args: Vec<OsString> = Vec::new();
        if request.json {
            args.push("-json".into());
        }
        args.push("-lang".into());
        args.push(request.language.clone().into());

        // The staged pattern must outlive the child process.
        let _staged = match &request.target {
            AstTarget::Pattern(pattern) => {
                let staged = stage_pattern(pattern)?;
                args.push("-dump_pattern".into());
                args.push(staged.path().into());
                Some(staged)
            }
            AstTarget::Files(files) => {
                let [file] = files.as_slice() else {
                    return Err(AstClientError::TargetCount { count: files.len() });
                };
                args.push("-dump_ast".into());
                args.push(file.into());
                None
            }
        };

        debug!(
            target: CLIENT_TARGET,
            executable = %self.executable.display(),
            language = request.language(),
            json = request.json,
            "invoking pattern parser"
        );

        let output = Command::new(&self.executable)
            .args(&args)
            .output()
            .map_err(|err| AstClientError::Spawn {
                executable: self.executable.clone(),
                source: Arc::new(err),
            })?;

        if !output.status.success() {
            return Err(AstClientError::NonZeroExit {
                executable: self.executable.clone(),
                language: request.language.clone(),
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }

        String::from_utf8(output.stdout).map_err(|err| AstClientError::Decode {
            message: err.to_string(),
        })
    }
}

impl PatternAstSource for SemgrepCore {
    fn pattern_ast(&self, language: &str, pattern: &str) -> Result<Arc<PatternAst>, AstClientError> {
        let request = AstRequest::pattern(language, pattern);
        if let Some(hit) = lock(&self.asts).get(&request) {
            return Ok(Arc::clone(hit));
        }
        let dump = self.dump(&request)?;
        let ast = PatternAst::parse(&dump).map_err(|err| AstClientError::Decode {
            message: err.to_string(),
        })?;
        let stored = lock(&self.asts)
            .entry(request)
            .or_insert_with(|| Arc::new(ast))
            .clone();
        Ok(stored)
    }
}

fn stage_pattern(pattern: &str) -> Result<tempfile::NamedTempFile, AstClientError> {
    let temp_error = |err| AstClientError::TempFile {
        source: Arc::new(err),
    };
    let mut staged = tempfile::NamedTempFile::new().map_err(temp_error)?;
    staged.write_all(pattern.as_bytes()).map_err(temp_error)?;
    staged.flush().map_err(temp_error)?;
    Ok(staged)
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
