//! Read-only views over the rules of a parsed rule file.

use sempai_core::{Level, SpanDiagnostic};
use sempai_yaml::{ConfigTree, TreePath, TreeValue};

/// Top-level key holding the rule list.
pub const RULES_KEY: &str = "rules";

const LANGUAGES_KEY: &str = "languages";
const PATTERN_KEY: &str = "pattern";
const PATTERN_EITHER_KEY: &str = "pattern-either";
const PATTERNS_KEY: &str = "patterns";

/// Pattern operators whose operand is a pattern string.
const STRING_OPERATORS: &[&str] = &[
    PATTERN_KEY,
    "pattern-not",
    "pattern-inside",
    "pattern-not-inside",
];

/// Pattern operators whose operand is a list of operators.
const LIST_OPERATORS: &[&str] = &[PATTERN_EITHER_KEY, PATTERNS_KEY];

/// Returns a view of every rule under the top-level `rules` key.
///
/// # Errors
///
/// Returns a diagnostic anchored at the root when the key is missing or is
/// not a sequence.
///
/// # Example
///
/// ```
/// use sempai_core::SourceRegistry;
/// use sempai::rules;
///
/// let registry = SourceRegistry::new();
/// let root = sempai_yaml::parse(&registry, "rules:\n  - id: a\n  - id: b\n", None)?;
/// let ids: Vec<_> = rules(&root)
///     .map_err(|d| d.short_message().to_owned())?
///     .iter()
///     .filter_map(|rule| rule.id())
///     .collect();
/// assert_eq!(ids, ["a", "b"]);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn rules(root: &ConfigTree) -> Result<Vec<RuleView<'_>>, SpanDiagnostic> {
    let Some(list) = root.get(RULES_KEY).and_then(ConfigTree::as_sequence) else {
        return Err(
            SpanDiagnostic::new(Level::Error, "missing top-level `rules` sequence")
                .with_span(root.span().clone())
                .with_help("rule files must contain `rules:` followed by a list of rules"),
        );
    };
    Ok(list
        .iter()
        .enumerate()
        .map(|(index, node)| RuleView { index, node })
        .collect())
}

/// One entry of the `rules` sequence.
#[derive(Debug, Clone, Copy)]
pub struct RuleView<'a> {
    index: usize,
    node: &'a ConfigTree,
}

impl<'a> RuleView<'a> {
    /// Returns the rule's position in the `rules` sequence.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Returns the rule node.
    #[must_use]
    pub const fn node(&self) -> &'a ConfigTree {
        self.node
    }

    /// Returns the path from the document root to the rule.
    #[must_use]
    pub fn path(&self) -> TreePath {
        TreePath::root().key(RULES_KEY).index(self.index)
    }

    /// Returns the rule `id`, if it is a string.
    #[must_use]
    pub fn id(&self) -> Option<&'a str> {
        self.node.get("id").and_then(ConfigTree::as_str)
    }

    /// Returns the declared languages that are strings.
    #[must_use]
    pub fn languages(&self) -> Vec<&'a str> {
        self.node
            .get(LANGUAGES_KEY)
            .and_then(ConfigTree::as_sequence)
            .map(|items| items.iter().filter_map(ConfigTree::as_str).collect())
            .unwrap_or_default()
    }

    /// Returns the first declared language, used to parse the rule's
    /// patterns.
    #[must_use]
    pub fn language(&self) -> Option<&'a str> {
        self.languages().first().copied()
    }

    /// Checks the parts of the rule schema the autofixer relies on.
    ///
    /// A rule must be a mapping with a non-empty `languages` list of
    /// strings. Pattern operators must hold strings and operator lists must
    /// be sequences. Each violation yields one error diagnostic.
    #[must_use]
    pub fn check(&self) -> Vec<SpanDiagnostic> {
        let mut problems = Vec::new();
        if self.node.as_mapping().is_none() {
            problems.push(self.problem(self.node, "rule is not a mapping"));
            return problems;
        }

        match self.node.get(LANGUAGES_KEY) {
            None => problems.push(
                self.problem(self.node, "rule has no `languages`")
                    .with_help("add a list such as `languages: [python]`"),
            ),
            Some(languages) => match languages.as_sequence() {
                Some(items) if !items.is_empty() => {
                    for item in items.iter().filter(|item| item.as_str().is_none()) {
                        problems.push(self.problem(item, "language must be a string"));
                    }
                }
                _ => problems.push(self.problem(languages, "`languages` must be a non-empty list")),
            },
        }

        let mut pending = vec![self.node];
        while let Some(node) = pending.pop() {
            match node.value() {
                TreeValue::Mapping(entries) => {
                    for (key, value) in entries {
                        let name = key.as_str().unwrap_or_default();
                        if STRING_OPERATORS.contains(&name) && value.as_str().is_none() {
                            problems.push(self.problem(value, &format!("`{name}` must be a string")));
                        } else if LIST_OPERATORS.contains(&name) && value.as_sequence().is_none() {
                            problems.push(self.problem(value, &format!("`{name}` must be a list")));
                        } else if LIST_OPERATORS.contains(&name) {
                            pending.push(value);
                        }
                    }
                }
                TreeValue::Sequence(items) => pending.extend(items),
                TreeValue::Scalar(_) => {}
            }
        }
        problems
    }

    /// Returns the path of every `pattern-either` list in the rule, nested
    /// lists before the lists that contain them.
    #[must_use]
    pub fn pattern_eithers(&self) -> Vec<TreePath> {
        let mut found: Vec<(usize, TreePath)> = Vec::new();
        let mut pending = vec![(self.node, self.path(), 0_usize)];
        while let Some((node, path, depth)) = pending.pop() {
            match node.value() {
                TreeValue::Mapping(entries) => {
                    for (key, value) in entries {
                        let Some(name) = key.as_str() else { continue };
                        if !LIST_OPERATORS.contains(&name) || value.as_sequence().is_none() {
                            continue;
                        }
                        let child = path.clone().key(name);
                        if name == PATTERN_EITHER_KEY {
                            found.push((depth, child.clone()));
                        }
                        pending.push((value, child, depth.saturating_add(1)));
                    }
                }
                TreeValue::Sequence(items) => {
                    for (index, item) in items.iter().enumerate() {
                        pending.push((item, path.clone().index(index), depth.saturating_add(1)));
                    }
                }
                TreeValue::Scalar(_) => {}
            }
        }
        found.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| path_order(&a.1, &b.1)));
        found.into_iter().map(|(_, path)| path).collect()
    }

    fn problem(&self, node: &ConfigTree, message: &str) -> SpanDiagnostic {
        let message = match self.id() {
            Some(id) => format!("rule `{id}`: {message}"),
            None => format!("rule #{}: {message}", self.index),
        };
        SpanDiagnostic::new(Level::Error, message).with_span(node.span().clone())
    }
}

/// Orders paths by their rendered form so traversal order does not leak
/// into the result.
fn path_order(a: &TreePath, b: &TreePath) -> std::cmp::Ordering {
    a.to_string().cmp(&b.to_string())
}
