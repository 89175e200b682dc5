//! In-process runs of the CLI.

use std::process::ExitCode;

use rstest::rstest;

use super::support::{Workspace, run_cli};

const DUPLICATES: &str = "\
rules:
  - id: dup
    languages: [python]
    message: duplicate
    pattern-either:
      - pattern: foo(1)
      - pattern: foo(1)
    severity: WARNING
";

const FIXED: &str = "\
rules:
  - id: dup
    languages: [python]
    message: duplicate
    pattern-either:
      - pattern: foo(1)
    severity: WARNING
";

/// A dump that makes every pattern look identical.
const SAME_DUMP: &str = r#"{"Ss": [{"ExprStmt": [{"Id": "same"}, ";"]}]}"#;

#[rstest]
fn help_is_written_to_stdout() {
    let output = run_cli(&["--help"], &[]);
    assert_eq!(output.code, ExitCode::SUCCESS);
    assert!(output.stdout.contains("autofix"));
    assert!(output.stdout.contains("dump-ast"));
}

#[rstest]
fn missing_paths_are_usage_errors() {
    let output = run_cli(&["lint"], &[]);
    assert_eq!(output.code, ExitCode::FAILURE);
    assert!(output.stderr.contains("PATH"));
}

#[rstest]
fn pattern_and_target_conflict() {
    let output = run_cli(
        &["dump-ast", "--lang", "python", "--pattern", "f()", "--target", "a.py"],
        &[],
    );
    assert_eq!(output.code, ExitCode::FAILURE);
}

#[rstest]
fn missing_rule_files_fail_per_file() {
    let workspace = Workspace::new();
    let missing = workspace.path().join("missing.yaml");
    let output = run_cli(&["lint", missing.to_str().expect("UTF-8 path")], &[]);
    assert_eq!(output.code, ExitCode::from(1_u8));
    assert!(output.stderr.contains("missing.yaml"));
}

#[rstest]
fn invalid_log_filter_is_reported() {
    let output = run_cli(&["--log-filter", "sempai=[", "lint", "rules.yaml"], &[]);
    assert_eq!(output.code, ExitCode::FAILURE);
    assert!(output.stderr.contains("invalid log filter"));
}

#[cfg(unix)]
mod with_fake_core {
    use std::process::ExitCode;

    use rstest::rstest;

    use super::{DUPLICATES, FIXED, SAME_DUMP};
    use crate::config::SEMGREP_CORE_ENV;
    use crate::tests::support::{Workspace, run_cli};

    fn core_env(workspace: &Workspace) -> String {
        workspace.fake_core(SAME_DUMP).display().to_string()
    }

    #[rstest]
    fn autofix_rewrites_rule_directories() {
        let workspace = Workspace::new();
        let core = core_env(&workspace);
        workspace.write("rules/dup.yaml", DUPLICATES);
        workspace.write("rules/notes.txt", DUPLICATES);
        let rules = workspace.path().join("rules");

        let output = run_cli(
            &["autofix", rules.to_str().expect("UTF-8 path")],
            &[(SEMGREP_CORE_ENV, core.as_str())],
        );

        assert_eq!(output.code, ExitCode::SUCCESS, "stderr: {}", output.stderr);
        assert_eq!(workspace.read("rules/dup.yaml"), FIXED);
        assert_eq!(workspace.read("rules/notes.txt"), DUPLICATES);
        assert!(output.stdout.contains("removed 1 alternative(s)"));
    }

    #[rstest]
    fn lint_reports_without_editing() {
        let workspace = Workspace::new();
        let core = core_env(&workspace);
        let rules = workspace.write("dup.yml", DUPLICATES);

        let output = run_cli(
            &["--semgrep-core", core.as_str(), "lint", rules.to_str().expect("UTF-8 path")],
            &[],
        );

        assert_eq!(output.code, ExitCode::from(1_u8));
        assert!(output.stdout.starts_with("warning: alternatives of"));
        assert!(output.stdout.contains("--> "));
        assert_eq!(workspace.read("dup.yml"), DUPLICATES);
    }

    #[rstest]
    fn lint_emits_json_lines() {
        let workspace = Workspace::new();
        let core = core_env(&workspace);
        let rules = workspace.write("dup.yaml", DUPLICATES);

        let output = run_cli(
            &["lint", "--format", "json", rules.to_str().expect("UTF-8 path")],
            &[(SEMGREP_CORE_ENV, core.as_str())],
        );

        assert_eq!(output.code, ExitCode::from(1_u8));
        let lines: Vec<_> = output.stdout.lines().collect();
        assert_eq!(lines.len(), 1);
        let value: serde_json::Value =
            serde_json::from_str(lines.first().expect("one line")).expect("valid JSON");
        assert_eq!(value["level"], "warning");
    }

    #[rstest]
    fn clean_files_lint_clean() {
        let workspace = Workspace::new();
        let core = core_env(&workspace);
        let rules = workspace.write("clean.yaml", FIXED);

        let output = run_cli(
            &["lint", rules.to_str().expect("UTF-8 path")],
            &[(SEMGREP_CORE_ENV, core.as_str())],
        );

        assert_eq!(output.code, ExitCode::SUCCESS);
        assert!(output.stdout.is_empty());
    }

    #[rstest]
    fn consistency_failures_abort_the_run() {
        let workspace = Workspace::new();
        let core = core_env(&workspace);
        let text = DUPLICATES.replacen("foo(1)\n    severity", "bar(2)\n    severity", 1);
        let first = workspace.write("a.yaml", &text);
        let second = workspace.write("b.yaml", DUPLICATES);

        let output = run_cli(
            &[
                "autofix",
                first.to_str().expect("UTF-8 path"),
                second.to_str().expect("UTF-8 path"),
            ],
            &[(SEMGREP_CORE_ENV, core.as_str())],
        );

        assert_eq!(output.code, ExitCode::from(2_u8));
        assert!(output.stderr.contains("internal consistency check failed"));
        assert_eq!(workspace.read("a.yaml"), text);
        assert_eq!(workspace.read("b.yaml"), DUPLICATES);
    }

    #[rstest]
    fn dump_ast_prints_the_collaborator_output() {
        let workspace = Workspace::new();
        let core = core_env(&workspace);

        let output = run_cli(
            &["dump-ast", "--lang", "python", "--pattern", "foo()", "--json"],
            &[(SEMGREP_CORE_ENV, core.as_str())],
        );

        assert_eq!(output.code, ExitCode::SUCCESS);
        assert_eq!(output.stdout, format!("{SAME_DUMP}\n"));
    }

    #[rstest]
    fn dump_ast_needs_one_target() {
        let workspace = Workspace::new();
        let core = core_env(&workspace);

        let output = run_cli(
            &[
                "dump-ast", "--lang", "python", "--target", "a.py", "--target", "b.py",
            ],
            &[(SEMGREP_CORE_ENV, core.as_str())],
        );

        assert_eq!(output.code, ExitCode::FAILURE);
        assert!(output.stderr.contains("exactly one target file"));
    }
}
