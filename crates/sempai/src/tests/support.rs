//! Deterministic pattern AST source used in place of `semgrep-core`.

use std::cell::RefCell;
use std::sync::Arc;

use serde_json::{Value, json};

use crate::{AstClientError, PatternAst, PatternAstSource};

/// Pattern text that makes [`FakeAsts`] fail.
pub(crate) const FAILING_PATTERN: &str = "BOOM";

/// Builds ASTs line by line: `return e`, `x = e`, and any other line as an
/// expression statement. Whitespace inside a line is ignored.
#[derive(Debug, Default)]
pub(crate) struct FakeAsts {
    calls: RefCell<Vec<String>>,
}

impl FakeAsts {
    pub(crate) fn calls(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl PatternAstSource for FakeAsts {
    fn pattern_ast(&self, _language: &str, pattern: &str) -> Result<Arc<PatternAst>, AstClientError> {
        self.calls.borrow_mut().push(pattern.to_owned());
        if pattern.contains(FAILING_PATTERN) {
            return Err(AstClientError::Decode {
                message: String::from("fake parser failure"),
            });
        }
        Ok(Arc::new(PatternAst::from_json(dump(pattern))))
    }
}

/// Returns the fake dump for `pattern`.
pub(crate) fn dump(pattern: &str) -> Value {
    let statements: Vec<Value> = pattern
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .map(|line| statement(&line))
        .collect();
    json!({ "Ss": statements })
}

fn statement(line: &str) -> Value {
    if let Some(returned) = line.strip_prefix("return ") {
        json!({ "Return": ["return", { "some": expr(returned) }] })
    } else if let Some((target, value)) = line.split_once(" = ") {
        json!({ "ExprStmt": [{ "Assign": [expr(target), "=", expr(value)] }, ";"] })
    } else {
        json!({ "ExprStmt": [expr(line), ";"] })
    }
}

fn expr(text: &str) -> Value {
    json!({ "Id": text.replace(' ', "") })
}
