//! Span-carrying configuration tree.
//!
//! A [`ConfigTree`] node pairs a [`TreeValue`] with the [`Span`] it was
//! parsed from and the [`Layout`] it was written in. Equality and hashing
//! look only at the value, so nodes can stand in for plain values in maps,
//! sets, and comparisons regardless of where they came from.

use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};

use sempai_core::Span;

/// A resolved scalar value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scalar {
    /// `null`, `~`, or an empty plain scalar.
    Null,
    /// `true` or `false`.
    Bool(bool),
    /// An integer or finite float.
    Number(serde_json::Number),
    /// Any other text.
    String(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Number(value) => write!(f, "{value}"),
            Self::String(value) => f.write_str(value),
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

/// The value carried by a [`ConfigTree`] node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TreeValue {
    /// A leaf value.
    Scalar(Scalar),
    /// An ordered list of nodes.
    Sequence(Vec<ConfigTree>),
    /// Ordered key/value pairs. Keys are nodes in their own right.
    Mapping(Vec<(ConfigTree, ConfigTree)>),
}

/// How a scalar was written in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarStyle {
    /// Unquoted.
    Plain,
    /// `'single quoted'`.
    SingleQuoted,
    /// `"double quoted"`.
    DoubleQuoted,
    /// `|` block scalar.
    Literal,
    /// `>` block scalar.
    Folded,
}

/// Source formatting of a node, used when rewriting it in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layout {
    /// A scalar in the given style.
    Scalar(ScalarStyle),
    /// An indentation-based collection.
    Block,
    /// A bracketed `[..]` or `{..}` collection.
    Flow,
    /// A node that was built in memory rather than parsed.
    Synthetic,
}

/// A configuration value annotated with its source span.
///
/// # Example
///
/// ```
/// use std::collections::HashSet;
///
/// use sempai_core::{Position, Span};
/// use sempai_yaml::{ConfigTree, Layout, Scalar, TreeValue};
///
/// let here = ConfigTree::new(
///     TreeValue::Scalar(Scalar::from("rules")),
///     Span::new(Position::new(0, 0), Position::new(0, 5)),
///     Layout::Synthetic,
/// );
/// let there = ConfigTree::new(
///     TreeValue::Scalar(Scalar::from("rules")),
///     Span::new(Position::new(9, 2), Position::new(9, 7)),
///     Layout::Synthetic,
/// );
///
/// assert_eq!(here, there);
/// let keys: HashSet<ConfigTree> = [here].into_iter().collect();
/// assert!(keys.contains(&TreeValue::Scalar(Scalar::from("rules"))));
/// ```
#[derive(Debug, Clone)]
pub struct ConfigTree {
    value: TreeValue,
    span: Span,
    layout: Layout,
}

impl ConfigTree {
    /// Creates a node.
    #[must_use]
    pub const fn new(value: TreeValue, span: Span, layout: Layout) -> Self {
        Self {
            value,
            span,
            layout,
        }
    }

    /// Creates a string scalar node.
    #[must_use]
    pub fn string(value: impl Into<String>, span: Span, layout: Layout) -> Self {
        Self::new(TreeValue::Scalar(Scalar::String(value.into())), span, layout)
    }

    /// Returns the node's value.
    #[must_use]
    pub const fn value(&self) -> &TreeValue {
        &self.value
    }

    /// Returns the node's value mutably.
    pub const fn value_mut(&mut self) -> &mut TreeValue {
        &mut self.value
    }

    /// Consumes the node and returns its value.
    #[must_use]
    pub fn into_value(self) -> TreeValue {
        self.value
    }

    /// Returns the source span.
    #[must_use]
    pub const fn span(&self) -> &Span {
        &self.span
    }

    /// Returns the source layout.
    #[must_use]
    pub const fn layout(&self) -> Layout {
        self.layout
    }

    /// Returns the scalar, if this node is one.
    #[must_use]
    pub const fn as_scalar(&self) -> Option<&Scalar> {
        match &self.value {
            TreeValue::Scalar(scalar) => Some(scalar),
            TreeValue::Sequence(_) | TreeValue::Mapping(_) => None,
        }
    }

    /// Returns the text of a string scalar.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match &self.value {
            TreeValue::Scalar(Scalar::String(text)) => Some(text),
            _ => None,
        }
    }

    /// Returns the items of a sequence.
    #[must_use]
    pub fn as_sequence(&self) -> Option<&[ConfigTree]> {
        match &self.value {
            TreeValue::Sequence(items) => Some(items),
            TreeValue::Scalar(_) | TreeValue::Mapping(_) => None,
        }
    }

    /// Returns the entries of a mapping.
    #[must_use]
    pub fn as_mapping(&self) -> Option<&[(ConfigTree, ConfigTree)]> {
        match &self.value {
            TreeValue::Mapping(entries) => Some(entries),
            TreeValue::Scalar(_) | TreeValue::Sequence(_) => None,
        }
    }

    /// Looks up a string key in a mapping.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Self> {
        self.as_mapping()?
            .iter()
            .find(|(k, _)| k.as_str() == Some(key))
            .map(|(_, v)| v)
    }

    /// Follows `path` from this node.
    #[must_use]
    pub fn at(&self, path: &TreePath) -> Option<&Self> {
        path.segments()
            .iter()
            .try_fold(self, |node, segment| match segment {
                PathSegment::Key(key) => node.get(key),
                PathSegment::Index(index) => node.as_sequence()?.get(*index),
            })
    }

    /// Follows `path` from this node, returning a mutable reference.
    pub fn at_mut(&mut self, path: &TreePath) -> Option<&mut Self> {
        let mut node = self;
        for segment in path.segments() {
            node = match (segment, &mut node.value) {
                (PathSegment::Key(key), TreeValue::Mapping(entries)) => entries
                    .iter_mut()
                    .find(|(k, _)| k.as_str() == Some(key.as_str()))
                    .map(|(_, v)| v)?,
                (PathSegment::Index(index), TreeValue::Sequence(items)) => items.get_mut(*index)?,
                _ => return None,
            };
        }
        Some(node)
    }
}

impl PartialEq for ConfigTree {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for ConfigTree {}

impl Hash for ConfigTree {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl PartialEq<TreeValue> for ConfigTree {
    fn eq(&self, other: &TreeValue) -> bool {
        &self.value == other
    }
}

impl PartialEq<str> for ConfigTree {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == Some(other)
    }
}

impl Borrow<TreeValue> for ConfigTree {
    fn borrow(&self) -> &TreeValue {
        &self.value
    }
}

/// One step of a [`TreePath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// A string key in a mapping.
    Key(String),
    /// A position in a sequence.
    Index(usize),
}

/// A route from the document root to a node.
///
/// # Example
///
/// ```
/// use sempai_yaml::TreePath;
///
/// let path = TreePath::root().key("rules").index(0).key("pattern-either");
/// assert_eq!(path.to_string(), "rules[0].pattern-either");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TreePath(Vec<PathSegment>);

impl TreePath {
    /// Returns the empty path.
    #[must_use]
    pub const fn root() -> Self {
        Self(Vec::new())
    }

    /// Extends the path with a mapping key.
    #[must_use]
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.0.push(PathSegment::Key(key.into()));
        self
    }

    /// Extends the path with a sequence index.
    #[must_use]
    pub fn index(mut self, index: usize) -> Self {
        self.0.push(PathSegment::Index(index));
        self
    }

    /// Returns the segments from the root down.
    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }
}

impl fmt::Display for TreePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (position, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Key(key) if position == 0 => f.write_str(key)?,
                PathSegment::Key(key) => write!(f, ".{key}")?,
                PathSegment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}
