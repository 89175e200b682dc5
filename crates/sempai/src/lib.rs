//! Sempai: redundancy checks and autofixes for Semgrep rule files.
//!
//! Rule files are parsed with [`sempai_yaml`], so every node keeps the span
//! it came from and edited files keep their formatting. Patterns are
//! compared by AST, obtained from `semgrep-core` through [`SemgrepCore`] or
//! any other [`PatternAstSource`].
//!
//! # Core types
//!
//! - [`PatternAst`], [`Stmt`] and [`Expr`]: typed views of pattern dumps
//! - [`SemgrepCore`]: the memoising subprocess client
//! - [`Classifier`]: decides how two patterns relate
//! - [`RuleView`]: read-only access to one rule
//! - [`Autofixer`]: removes redundant `pattern-either` alternatives
//!
//! # Example
//!
//! ```
//! use sempai::{EquivalentPatterns, strip_return};
//!
//! assert_eq!(strip_return("return foo()").as_deref(), Some("foo()"));
//! assert_ne!(EquivalentPatterns::ExactMatch, EquivalentPatterns::Different);
//! ```

mod ast;
mod autofix;
mod classify;
mod client;
mod error;
mod rule;

pub use ast::{Expr, PatternAst, Stmt};
pub use autofix::{AutofixOptions, Autofixer, DEFAULT_MAX_PASSES, FixOutcome};
pub use classify::{Classifier, EquivalentPatterns, PairSide, has_return_keyword, strip_return};
pub use client::{AstRequest, AstTarget, PatternAstSource, SemgrepCore};
pub use error::{AstClientError, AutofixError};
pub use rule::{RULES_KEY, RuleView, rules};

#[cfg(test)]
mod tests;
