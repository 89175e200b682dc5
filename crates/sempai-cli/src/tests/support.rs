//! Test support for driving the CLI in-process.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use tempfile::TempDir;

use crate::run_with_env;

/// Captured result of one in-process run.
pub(super) struct RunOutput {
    pub(super) code: ExitCode,
    pub(super) stdout: String,
    pub(super) stderr: String,
}

/// Runs the CLI with `args` and the given environment variables only.
pub(super) fn run_cli(args: &[&str], env: &[(&str, &str)]) -> RunOutput {
    let argv: Vec<OsString> = std::iter::once("sempai-lint")
        .chain(args.iter().copied())
        .map(OsString::from)
        .collect();
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let code = run_with_env(argv, &mut stdout, &mut stderr, |key| {
        env.iter()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| (*value).to_owned())
    });
    RunOutput {
        code,
        stdout: String::from_utf8(stdout).expect("stdout is UTF-8"),
        stderr: String::from_utf8(stderr).expect("stderr is UTF-8"),
    }
}

/// A scratch directory holding rule files and a fake `semgrep-core`.
pub(super) struct Workspace {
    pub(super) dir: TempDir,
}

impl Workspace {
    pub(super) fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("temp dir"),
        }
    }

    pub(super) fn write(&self, name: &str, text: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent");
        }
        fs::write(&path, text).expect("write file");
        path
    }

    pub(super) fn read(&self, name: &str) -> String {
        fs::read_to_string(self.dir.path().join(name)).expect("read file")
    }

    pub(super) fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Installs a `semgrep-core` stand-in that prints `dump` for every
    /// invocation.
    #[cfg(unix)]
    pub(super) fn fake_core(&self, dump: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = self.write("bin/semgrep-core", &format!("#!/bin/sh\nprintf '%s' '{dump}'\n"));
        let mut permissions = fs::metadata(&path).expect("metadata").permissions();
        permissions.set_mode(0o755);
        fs::set_permissions(&path, permissions).expect("make executable");
        path
    }
}
