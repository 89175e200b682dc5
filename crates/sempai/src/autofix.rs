//! Removal of redundant `pattern-either` alternatives.
//!
//! Each `pattern-either` list is processed on its own until no pair of
//! alternatives is related. A pass classifies the alternatives that carry a
//! `pattern` string in list order and acts on the first related pair
//! `(i, j)` with `i < j`:
//!
//! - [`EquivalentPatterns::ExactMatch`] removes alternative `j`.
//! - [`EquivalentPatterns::ReturnPairedWithAssignment`] rewrites the
//!   `return` alternative to its return-free text and removes the other.
//!
//! Nested lists are processed before the lists that contain them. Rules
//! that fail [`crate::RuleView::check`] and lists written in flow style are
//! skipped and reported in [`FixOutcome::skipped`].

use std::fs;
use std::path::Path;
use std::sync::Arc;

use sempai_core::{Level, Span, SourceRegistry, SpanDiagnostic};
use sempai_yaml::{ConfigTree, Document, Layout, TreePath};
use tracing::{info, warn};

use crate::ast::Stmt;
use crate::classify::{Classifier, EquivalentPatterns, PairSide, has_return_keyword};
use crate::client::PatternAstSource;
use crate::error::AutofixError;
use crate::rule::rules;

/// Tracing target for autofix operations.
const AUTOFIX_TARGET: &str = "sempai::autofix";

const PATTERN_KEY: &str = "pattern";

/// Default bound on passes over one `pattern-either` list.
pub const DEFAULT_MAX_PASSES: usize = 1000;

/// Limits applied while fixing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutofixOptions {
    /// Edits allowed per `pattern-either` list. Every edit shrinks the
    /// list, so exceeding the bound means the classifier and the tree
    /// disagree.
    pub max_passes: usize,
}

impl Default for AutofixOptions {
    fn default() -> Self {
        Self {
            max_passes: DEFAULT_MAX_PASSES,
        }
    }
}

/// Summary of the changes made to one document.
#[derive(Debug, Clone, Default)]
pub struct FixOutcome {
    /// Alternatives removed.
    pub removed: usize,
    /// Alternatives whose pattern text was rewritten.
    pub rewritten: usize,
    /// Rules and lists left untouched, with the reason.
    pub skipped: Vec<SpanDiagnostic>,
}

impl FixOutcome {
    /// Returns `true` when the document was edited.
    #[must_use]
    pub const fn changed(&self) -> bool {
        self.removed > 0 || self.rewritten > 0
    }
}

/// A `pattern-either` list and the language its patterns are parsed as.
#[derive(Debug, Clone)]
struct FixTarget {
    language: String,
    path: TreePath,
}

/// The first related pair found in a list.
#[derive(Debug, Clone)]
struct RelatedPair {
    first: usize,
    second: usize,
    relation: EquivalentPatterns,
}

/// Rewrites rule documents to drop redundant alternatives.
///
/// # Example
///
/// ```no_run
/// use sempai::{Autofixer, SemgrepCore};
/// use sempai_core::SourceRegistry;
///
/// let core = SemgrepCore::new("semgrep-core");
/// let registry = SourceRegistry::new();
/// let outcome = Autofixer::new(&core).fix_file(&registry, "rules.yaml".as_ref())?;
/// println!("removed {} alternatives", outcome.removed);
/// # Ok::<(), sempai::AutofixError>(())
/// ```
#[derive(Clone, Copy)]
pub struct Autofixer<'a> {
    asts: &'a dyn PatternAstSource,
    options: AutofixOptions,
}

impl<'a> Autofixer<'a> {
    /// Creates an autofixer with default options.
    #[must_use]
    pub const fn new(asts: &'a dyn PatternAstSource) -> Self {
        Self {
            asts,
            options: AutofixOptions {
                max_passes: DEFAULT_MAX_PASSES,
            },
        }
    }

    /// Replaces the options.
    #[must_use]
    pub const fn with_options(mut self, options: AutofixOptions) -> Self {
        self.options = options;
        self
    }

    /// Returns the active options.
    #[must_use]
    pub const fn options(&self) -> AutofixOptions {
        self.options
    }

    /// Removes redundant alternatives from every rule in `document`.
    ///
    /// The document is edited in place; nothing is written to disk.
    ///
    /// # Errors
    ///
    /// Returns [`AutofixError::Collaborator`] when a pattern cannot be
    /// parsed, [`AutofixError::Edit`] when the document rejects an edit,
    /// and [`AutofixError::InternalConsistency`] when the classifier and
    /// the tree disagree. The document must be discarded after an error.
    pub fn fix_document(&self, document: &mut Document) -> Result<FixOutcome, AutofixError> {
        let (targets, skipped) = collect_targets(document.root());
        let mut outcome = FixOutcome {
            skipped,
            ..FixOutcome::default()
        };
        for target in &targets {
            self.fix_list(document, target, &mut outcome)?;
        }
        Ok(outcome)
    }

    /// Reports the first related pair in each `pattern-either` list without
    /// editing the document.
    ///
    /// Diagnostics for skipped rules and lists are included.
    ///
    /// # Errors
    ///
    /// Returns [`AutofixError::Collaborator`] when a pattern cannot be
    /// parsed.
    pub fn findings(&self, document: &Document) -> Result<Vec<SpanDiagnostic>, AutofixError> {
        let (targets, mut diagnostics) = collect_targets(document.root());
        for target in &targets {
            if let Some(pair) = self.first_related(document.root(), target)? {
                diagnostics.push(finding(document.root(), &target.path, &pair));
            }
        }
        Ok(diagnostics)
    }

    /// Fixes the rule file at `path`, writing it back only when an
    /// alternative changed.
    ///
    /// # Errors
    ///
    /// Returns [`AutofixError::Io`] when the file cannot be read or written,
    /// [`AutofixError::Parse`] when it is not valid YAML, and the errors of
    /// [`Self::fix_document`]. The file is left untouched on error.
    pub fn fix_file(
        &self,
        registry: &SourceRegistry,
        path: &Path,
    ) -> Result<FixOutcome, AutofixError> {
        let mut document = load(registry, path)?;
        let outcome = self.fix_document(&mut document)?;
        if document.is_modified() {
            fs::write(path, document.render()).map_err(|err| io_error(path, err))?;
            info!(
                target: AUTOFIX_TARGET,
                file = %path.display(),
                removed = outcome.removed,
                rewritten = outcome.rewritten,
                "rule file rewritten"
            );
        }
        Ok(outcome)
    }

    /// Reports findings for the rule file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`AutofixError::Io`] when the file cannot be read,
    /// [`AutofixError::Parse`] when it is not valid YAML, and the errors of
    /// [`Self::findings`].
    pub fn lint_file(
        &self,
        registry: &SourceRegistry,
        path: &Path,
    ) -> Result<Vec<SpanDiagnostic>, AutofixError> {
        let document = load(registry, path)?;
        self.findings(&document)
    }

    fn fix_list(
        &self,
        document: &mut Document,
        target: &FixTarget,
        outcome: &mut FixOutcome,
    ) -> Result<(), AutofixError> {
        let mut passes = 0_usize;
        while let Some(pair) = self.first_related(document.root(), target)? {
            if passes >= self.options.max_passes {
                return Err(AutofixError::consistency(
                    format!(
                        "`{}` still has related alternatives after {passes} passes",
                        target.path
                    ),
                    document.root().at(&target.path).map(ConfigTree::span),
                ));
            }
            self.apply(document, target, pair, outcome)?;
            passes = passes.saturating_add(1);
        }
        Ok(())
    }

    fn first_related(
        &self,
        root: &ConfigTree,
        target: &FixTarget,
    ) -> Result<Option<RelatedPair>, AutofixError> {
        let Some(items) = root.at(&target.path).and_then(ConfigTree::as_sequence) else {
            return Ok(None);
        };
        let patterns: Vec<(usize, &str)> = items
            .iter()
            .enumerate()
            .filter_map(|(index, item)| pattern_text(item).map(|text| (index, text)))
            .collect();

        let classifier = Classifier::new(self.asts);
        for (position, &(first, first_text)) in patterns.iter().enumerate() {
            for &(second, second_text) in patterns.iter().skip(position.saturating_add(1)) {
                let relation = classifier.classify(&target.language, first_text, second_text)?;
                if relation != EquivalentPatterns::Different {
                    return Ok(Some(RelatedPair {
                        first,
                        second,
                        relation,
                    }));
                }
            }
        }
        Ok(None)
    }

    fn apply(
        &self,
        document: &mut Document,
        target: &FixTarget,
        pair: RelatedPair,
        outcome: &mut FixOutcome,
    ) -> Result<(), AutofixError> {
        let RelatedPair {
            first,
            second,
            relation,
        } = pair;
        let path = &target.path;
        match relation {
            EquivalentPatterns::ExactMatch => {
                let kept = item_at(document.root(), path, first)?;
                let dropped = item_at(document.root(), path, second)?;
                if kept != dropped {
                    return Err(AutofixError::consistency(
                        format!(
                            "alternatives {first} and {second} of `{path}` were classified as \
                             identical but hold different values"
                        ),
                        Some(dropped.span()),
                    ));
                }
                document.remove_sequence_item(path, second)?;
                outcome.removed = outcome.removed.saturating_add(1);
                info!(
                    target: AUTOFIX_TARGET,
                    path = %path,
                    kept = first,
                    removed = second,
                    "removed duplicate alternative"
                );
            }
            EquivalentPatterns::ReturnPairedWithAssignment {
                with_return,
                rewritten,
            } => {
                let (returning, other) = match with_return {
                    PairSide::First => (first, second),
                    PairSide::Second => (second, first),
                };
                let pattern_path = path.clone().index(returning).key(PATTERN_KEY);
                self.ensure_returns(document.root(), &target.language, &pattern_path)?;
                document.replace_scalar(&pattern_path, &rewritten)?;
                document.remove_sequence_item(path, other)?;
                outcome.rewritten = outcome.rewritten.saturating_add(1);
                outcome.removed = outcome.removed.saturating_add(1);
                info!(
                    target: AUTOFIX_TARGET,
                    path = %path,
                    rewritten = returning,
                    removed = other,
                    "merged return alternative with statement alternative"
                );
            }
            EquivalentPatterns::Different => {
                return Err(AutofixError::consistency(
                    format!("no relation to apply between alternatives {first} and {second} of `{path}`"),
                    None,
                ));
            }
        }
        Ok(())
    }

    /// Confirms the alternative chosen for rewriting ends in `return e`.
    fn ensure_returns(
        &self,
        root: &ConfigTree,
        language: &str,
        pattern_path: &TreePath,
    ) -> Result<(), AutofixError> {
        let node = root.at(pattern_path);
        let span = node.map(ConfigTree::span);
        let Some(text) = node.and_then(ConfigTree::as_str) else {
            return Err(AutofixError::consistency(
                format!("`{pattern_path}` is not a pattern string"),
                span,
            ));
        };
        if !has_return_keyword(text) {
            return Err(AutofixError::consistency(
                format!("`{pattern_path}` was paired as a return pattern but has no `return`"),
                span,
            ));
        }
        let ast = self.asts.pattern_ast(language, text)?;
        if !matches!(ast.last_statement(), Some(Stmt::Return(Some(_)))) {
            return Err(AutofixError::consistency(
                format!("`{pattern_path}` does not end in a return statement"),
                span,
            ));
        }
        Ok(())
    }
}

/// Lists the `pattern-either` sequences to process, and diagnostics for
/// everything skipped.
fn collect_targets(root: &ConfigTree) -> (Vec<FixTarget>, Vec<SpanDiagnostic>) {
    let mut targets = Vec::new();
    let mut skipped = Vec::new();
    let views = match rules(root) {
        Ok(views) => views,
        Err(diagnostic) => {
            skipped.push(diagnostic);
            return (targets, skipped);
        }
    };

    for rule in views {
        let problems = rule.check();
        if !problems.is_empty() {
            warn!(
                target: AUTOFIX_TARGET,
                rule = %rule.path(),
                problems = problems.len(),
                "skipping malformed rule"
            );
            skipped.extend(problems);
            continue;
        }
        let Some(language) = rule.language() else {
            continue;
        };
        for path in rule.pattern_eithers() {
            match flow_list(root, &path) {
                Some(span) => {
                    warn!(target: AUTOFIX_TARGET, path = %path, "skipping flow-style list");
                    skipped.push(
                        SpanDiagnostic::new(
                            Level::Warning,
                            format!("`{path}` is written in flow style and was not rewritten"),
                        )
                        .with_span(span.clone())
                        .with_help("write the alternatives as a block list to enable autofix"),
                    );
                }
                None => targets.push(FixTarget {
                    language: language.to_owned(),
                    path,
                }),
            }
        }
    }
    (targets, skipped)
}

/// Returns the span of the list at `path` when it is written in flow style.
fn flow_list<'t>(root: &'t ConfigTree, path: &TreePath) -> Option<&'t Span> {
    root.at(path)
        .filter(|node| node.layout() == Layout::Flow)
        .map(ConfigTree::span)
}

fn finding(root: &ConfigTree, path: &TreePath, pair: &RelatedPair) -> SpanDiagnostic {
    let spans = [pair.first, pair.second]
        .into_iter()
        .filter_map(|index| root.at(&path.clone().index(index).key(PATTERN_KEY)))
        .map(|node| node.span().clone());
    let diagnostic = match &pair.relation {
        EquivalentPatterns::ReturnPairedWithAssignment { rewritten, .. } => SpanDiagnostic::new(
            Level::Warning,
            format!("alternatives of `{path}` differ only by a `return`"),
        )
        .with_help(format!(
            "keep a single alternative with the pattern `{}`",
            rewritten.escape_debug()
        )),
        EquivalentPatterns::ExactMatch | EquivalentPatterns::Different => SpanDiagnostic::new(
            Level::Warning,
            format!("alternatives of `{path}` are equivalent"),
        )
        .with_help("remove the duplicate alternative"),
    };
    diagnostic.with_spans(spans)
}

fn pattern_text(item: &ConfigTree) -> Option<&str> {
    item.get(PATTERN_KEY).and_then(ConfigTree::as_str)
}

fn item_at<'t>(
    root: &'t ConfigTree,
    path: &TreePath,
    index: usize,
) -> Result<&'t ConfigTree, AutofixError> {
    root.at(&path.clone().index(index)).ok_or_else(|| {
        AutofixError::consistency(format!("`{path}` has no alternative {index}"), None)
    })
}

fn load(registry: &SourceRegistry, path: &Path) -> Result<Document, AutofixError> {
    let text = fs::read_to_string(path).map_err(|err| io_error(path, err))?;
    let name = path.to_string_lossy();
    Ok(Document::parse(registry, &text, Some(&name))?)
}

fn io_error(path: &Path, err: std::io::Error) -> AutofixError {
    AutofixError::Io {
        path: path.to_path_buf(),
        source: Arc::new(err),
    }
}
