//! Equivalence classification of pattern pairs.
//!
//! Two alternatives of a `pattern-either` are redundant when their ASTs are
//! identical. A second, narrower relation pairs a pattern ending in
//! `return e` with one ending in the statement `e` or the assignment
//! `x = e`: the return form can be rewritten to end in plain `e`, which
//! subsumes both.

use tracing::warn;

use crate::ast::{Expr, PatternAst, Stmt};
use crate::client::PatternAstSource;
use crate::error::AstClientError;

/// Tracing target for classification.
const CLASSIFY_TARGET: &str = "sempai::classify";

/// Which pattern of a classified pair is meant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PairSide {
    /// The first pattern given to [`Classifier::classify`].
    First,
    /// The second pattern given to [`Classifier::classify`].
    Second,
}

impl PairSide {
    /// Returns the other side.
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::First => Self::Second,
            Self::Second => Self::First,
        }
    }
}

/// Relationship between two patterns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EquivalentPatterns {
    /// Both patterns have the same AST.
    ExactMatch,
    /// One pattern ends in `return e` and the other in `e` or `x = e`.
    ReturnPairedWithAssignment {
        /// The pattern carrying the `return`.
        with_return: PairSide,
        /// That pattern's text with the final `return` keyword removed.
        rewritten: String,
    },
    /// No relationship was found.
    Different,
}

/// Classifies pattern pairs using ASTs from a [`PatternAstSource`].
///
/// # Example
///
/// ```no_run
/// use sempai::{Classifier, EquivalentPatterns, SemgrepCore};
///
/// let core = SemgrepCore::new("semgrep-core");
/// let classifier = Classifier::new(&core);
/// let relation = classifier.classify("python", "foo(1)", "foo( 1 )")?;
/// assert_eq!(relation, EquivalentPatterns::ExactMatch);
/// # Ok::<(), sempai::AstClientError>(())
/// ```
#[derive(Clone, Copy)]
pub struct Classifier<'a> {
    asts: &'a dyn PatternAstSource,
}

impl<'a> Classifier<'a> {
    /// Creates a classifier over `asts`.
    #[must_use]
    pub const fn new(asts: &'a dyn PatternAstSource) -> Self {
        Self { asts }
    }

    /// Classifies `first` against `second`, both written in `language`.
    ///
    /// A return pairing is only reported once the rewritten pattern has
    /// been parsed and found to end in the returned expression. When that
    /// check fails the pair is reported as [`EquivalentPatterns::Different`]
    /// and a warning is logged.
    ///
    /// # Errors
    ///
    /// Propagates failures to obtain any of the ASTs involved.
    pub fn classify(
        &self,
        language: &str,
        first: &str,
        second: &str,
    ) -> Result<EquivalentPatterns, AstClientError> {
        let first_ast = self.asts.pattern_ast(language, first)?;
        let second_ast = self.asts.pattern_ast(language, second)?;
        if first_ast == second_ast {
            return Ok(EquivalentPatterns::ExactMatch);
        }

        let Some((with_return, returned)) = return_pairing(&first_ast, &second_ast) else {
            return Ok(EquivalentPatterns::Different);
        };
        let (text, return_ast) = match with_return {
            PairSide::First => (first, &first_ast),
            PairSide::Second => (second, &second_ast),
        };

        let Some(rewritten) = strip_return(text) else {
            warn!(
                target: CLASSIFY_TARGET,
                language,
                pattern = text,
                "return statement has no `return` keyword in its text"
            );
            return Ok(EquivalentPatterns::Different);
        };

        let normalised = self.asts.pattern_ast(language, &rewritten)?;
        let mut expected = return_ast.leading_statements().to_vec();
        expected.push(Stmt::ExprStmt(returned.clone()));
        if normalised.statements() != expected.as_slice() {
            warn!(
                target: CLASSIFY_TARGET,
                language,
                pattern = text,
                rewritten = rewritten.as_str(),
                "removing `return` did not produce the expected pattern; leaving both"
            );
            return Ok(EquivalentPatterns::Different);
        }

        Ok(EquivalentPatterns::ReturnPairedWithAssignment {
            with_return,
            rewritten,
        })
    }
}

/// Finds the side ending in `return e` when the other ends in `e` or `x = e`
/// after identical leading statements.
fn return_pairing<'t>(first: &'t PatternAst, second: &'t PatternAst) -> Option<(PairSide, &'t Expr)> {
    if first.leading_statements() != second.leading_statements() {
        return None;
    }
    match (first.last_statement()?, second.last_statement()?) {
        (Stmt::Return(Some(returned)), Stmt::ExprStmt(expr)) if pairs_with(returned, expr) => {
            Some((PairSide::First, returned))
        }
        (Stmt::ExprStmt(expr), Stmt::Return(Some(returned))) if pairs_with(returned, expr) => {
            Some((PairSide::Second, returned))
        }
        _ => None,
    }
}

fn pairs_with(returned: &Expr, statement: &Expr) -> bool {
    match statement {
        Expr::Assign { value, .. } => value.as_ref() == returned,
        Expr::Other(_) => statement == returned,
    }
}

/// Returns `true` if `pattern` contains `return` as a whole word.
#[must_use]
pub fn has_return_keyword(pattern: &str) -> bool {
    last_return(pattern).is_some()
}

/// Removes the last `return` keyword, and the blanks after it, from a
/// pattern.
///
/// Returns `None` when the pattern has no whole-word `return`.
///
/// # Example
///
/// ```
/// use sempai::strip_return;
///
/// assert_eq!(
///     strip_return("$X == $X\n...\nreturn callfunc()\n").as_deref(),
///     Some("$X == $X\n...\ncallfunc()\n")
/// );
/// assert_eq!(strip_return("returned(x)"), None);
/// ```
#[must_use]
pub fn strip_return(pattern: &str) -> Option<String> {
    let start = last_return(pattern)?;
    let keyword_end = start.saturating_add(RETURN.len());
    let rest = pattern.get(keyword_end..)?;
    let value = rest.trim_start_matches([' ', '\t']);
    let mut stripped = String::with_capacity(pattern.len());
    stripped.push_str(pattern.get(..start)?);
    stripped.push_str(value);
    Some(stripped)
}

const RETURN: &str = "return";

/// Byte offset of the last whole-word `return` followed by a blank.
fn last_return(pattern: &str) -> Option<usize> {
    pattern.rmatch_indices(RETURN).map(|(at, _)| at).find(|&at| {
        let before = pattern.get(..at).and_then(|head| head.chars().next_back());
        let after = pattern
            .get(at.saturating_add(RETURN.len())..)
            .and_then(|tail| tail.chars().next());
        !before.is_some_and(is_ident_char) && after.is_some_and(|c| c == ' ' || c == '\t')
    })
}

const fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}
