//! Typed view of the pattern ASTs dumped by `semgrep-core`.
//!
//! The dump is kept verbatim for equality checks. Alongside it, the
//! top-level statements are decoded into [`Stmt`] so the classifier can
//! match on the shapes it cares about (`return e`, `e;`, `x = e;`) and treat
//! everything else as opaque.

use serde_json::Value;

/// A pattern expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// `target = value`.
    Assign {
        /// The assigned-to expression, left opaque.
        target: Value,
        /// The assigned value.
        value: Box<Expr>,
    },
    /// Any other expression.
    Other(Value),
}

impl Expr {
    /// Decodes an expression node.
    #[must_use]
    pub fn from_json(value: &Value) -> Self {
        match single_entry(value) {
            Some(("Assign", Value::Array(parts))) => match parts.as_slice() {
                [target, _, assigned] => Self::Assign {
                    target: target.clone(),
                    value: Box::new(Self::from_json(assigned)),
                },
                _ => Self::Other(value.clone()),
            },
            _ => Self::Other(value.clone()),
        }
    }
}

/// A top-level pattern statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    /// `return` with an optional value.
    Return(Option<Expr>),
    /// An expression evaluated for its effect.
    ExprStmt(Expr),
    /// Any other statement.
    Other(Value),
}

impl Stmt {
    /// Decodes a statement node.
    #[must_use]
    pub fn from_json(value: &Value) -> Self {
        match single_entry(value) {
            Some(("Return", Value::Array(parts))) => {
                let returned = parts
                    .get(1)
                    .and_then(|slot| slot.get("some"))
                    .map(Expr::from_json);
                Self::Return(returned)
            }
            Some(("ExprStmt", Value::Array(parts))) => parts
                .first()
                .map_or_else(|| Self::Other(value.clone()), |e| Self::ExprStmt(Expr::from_json(e))),
            Some(("ExprStmt", expr)) => Self::ExprStmt(Expr::from_json(expr)),
            _ => Self::Other(value.clone()),
        }
    }
}

/// A decoded pattern dump.
///
/// Equality compares the raw dump, so two patterns that differ only in
/// layout are equal when the engine normalises them to the same tree.
///
/// # Example
///
/// ```
/// use sempai::{PatternAst, Stmt};
///
/// let ast = PatternAst::parse(r#"{"Ss": [{"Return": ["return", {"some": {"Id": "x"}}]}]}"#)?;
/// assert!(matches!(ast.last_statement(), Some(Stmt::Return(Some(_)))));
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct PatternAst {
    raw: Value,
    body: Vec<Stmt>,
}

impl PatternAst {
    /// Decodes a dump that has already been parsed as JSON.
    ///
    /// `Ss` holds a statement list, `S` a single statement, and `E` a bare
    /// expression, which is treated as an expression statement. Other roots
    /// yield an empty statement list.
    #[must_use]
    pub fn from_json(raw: Value) -> Self {
        let body = match single_entry(&raw) {
            Some(("Ss" | "Pr", Value::Array(stmts))) => stmts.iter().map(Stmt::from_json).collect(),
            Some(("S", stmt)) => vec![Stmt::from_json(stmt)],
            Some(("E", expr)) => vec![Stmt::ExprStmt(Expr::from_json(expr))],
            _ => Vec::new(),
        };
        Self { raw, body }
    }

    /// Parses JSON dump text.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error for malformed JSON.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text).map(Self::from_json)
    }

    /// Returns the raw dump.
    #[must_use]
    pub const fn raw(&self) -> &Value {
        &self.raw
    }

    /// Returns the decoded top-level statements.
    #[must_use]
    pub fn statements(&self) -> &[Stmt] {
        &self.body
    }

    /// Returns the final top-level statement.
    #[must_use]
    pub fn last_statement(&self) -> Option<&Stmt> {
        self.body.last()
    }

    /// Returns every top-level statement except the last.
    #[must_use]
    pub fn leading_statements(&self) -> &[Stmt] {
        self.body.split_last().map_or(&[], |(_, rest)| rest)
    }
}

impl PartialEq for PatternAst {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for PatternAst {}

/// Returns the key and value of a single-entry JSON object.
fn single_entry(value: &Value) -> Option<(&str, &Value)> {
    let object = value.as_object()?;
    if object.len() != 1 {
        return None;
    }
    object.iter().next().map(|(k, v)| (k.as_str(), v))
}
