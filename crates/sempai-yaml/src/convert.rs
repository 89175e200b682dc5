//! Conversions between [`ConfigTree`] and plain values.

use serde_json::{Map, Value};

use sempai_core::Span;

use crate::error::YamlError;
use crate::parser::MAX_DEPTH;
use crate::tree::{ConfigTree, Layout, Scalar, TreeValue};

/// Values that can be lifted into a [`ConfigTree`].
pub trait IntoConfigTree {
    /// Converts `self` into a tree whose every node carries `span`.
    ///
    /// # Errors
    ///
    /// Returns [`YamlError::NestingTooDeep`] when the value is nested more
    /// than [`MAX_DEPTH`] levels.
    fn into_config_tree(self, span: &Span) -> Result<ConfigTree, YamlError>;
}

impl IntoConfigTree for ConfigTree {
    fn into_config_tree(self, _span: &Span) -> Result<ConfigTree, YamlError> {
        Ok(self)
    }
}

impl IntoConfigTree for Value {
    fn into_config_tree(self, span: &Span) -> Result<ConfigTree, YamlError> {
        wrap_value(self, span)
    }
}

impl IntoConfigTree for String {
    fn into_config_tree(self, span: &Span) -> Result<ConfigTree, YamlError> {
        Ok(ConfigTree::string(self, span.clone(), Layout::Synthetic))
    }
}

impl IntoConfigTree for &str {
    fn into_config_tree(self, span: &Span) -> Result<ConfigTree, YamlError> {
        self.to_owned().into_config_tree(span)
    }
}

/// Lifts a plain value into a [`ConfigTree`], stamping every node with `span`.
///
/// A value that is already a [`ConfigTree`] is returned unchanged.
///
/// # Errors
///
/// Returns [`YamlError::NestingTooDeep`] when the value is nested more than
/// [`MAX_DEPTH`] levels.
///
/// # Example
///
/// ```
/// use sempai_core::Span;
/// use sempai_yaml::wrap;
///
/// let value = serde_json::json!({"languages": ["python"], "pattern": "foo()"});
/// let tree = wrap(value.clone(), &Span::synthetic())?;
///
/// assert_eq!(tree.get("pattern").and_then(|p| p.as_str()), Some("foo()"));
/// assert_eq!(tree.unroll(), value);
/// # Ok::<(), sempai_yaml::YamlError>(())
/// ```
pub fn wrap(value: impl IntoConfigTree, span: &Span) -> Result<ConfigTree, YamlError> {
    value.into_config_tree(span)
}

/// A collection being lifted by [`wrap_value`], with the children still to
/// visit.
enum WrapFrame {
    Sequence {
        items: Vec<ConfigTree>,
        rest: std::vec::IntoIter<Value>,
    },
    Mapping {
        entries: Vec<(ConfigTree, ConfigTree)>,
        rest: serde_json::map::IntoIter,
        key: Option<ConfigTree>,
    },
}

impl WrapFrame {
    fn next_child(&mut self, span: &Span) -> Option<Value> {
        match self {
            Self::Sequence { rest, .. } => rest.next(),
            Self::Mapping { rest, key, .. } => {
                let (name, value) = rest.next()?;
                *key = Some(ConfigTree::string(name, span.clone(), Layout::Synthetic));
                Some(value)
            }
        }
    }

    fn attach(&mut self, child: ConfigTree) {
        match self {
            Self::Sequence { items, .. } => items.push(child),
            Self::Mapping { entries, key, .. } => {
                if let Some(key) = key.take() {
                    entries.push((key, child));
                }
            }
        }
    }

    fn into_value(self) -> TreeValue {
        match self {
            Self::Sequence { items, .. } => TreeValue::Sequence(items),
            Self::Mapping { entries, .. } => TreeValue::Mapping(entries),
        }
    }
}

/// Lifts `value` on an explicit stack of open collections, so nesting is
/// bounded by [`MAX_DEPTH`] rather than by the call stack.
fn wrap_value(value: Value, span: &Span) -> Result<ConfigTree, YamlError> {
    let synthetic = |value: TreeValue| ConfigTree::new(value, span.clone(), Layout::Synthetic);
    let mut stack: Vec<WrapFrame> = Vec::new();
    let mut next = value;
    loop {
        // Descend until a leaf or an empty collection completes a node.
        let mut node = loop {
            let mut frame = match next {
                Value::Null => break synthetic(TreeValue::Scalar(Scalar::Null)),
                Value::Bool(flag) => break synthetic(TreeValue::Scalar(Scalar::Bool(flag))),
                Value::Number(number) => break synthetic(TreeValue::Scalar(Scalar::Number(number))),
                Value::String(text) => break synthetic(TreeValue::Scalar(Scalar::String(text))),
                Value::Array(items) => WrapFrame::Sequence {
                    items: Vec::with_capacity(items.len()),
                    rest: items.into_iter(),
                },
                Value::Object(entries) => WrapFrame::Mapping {
                    entries: Vec::with_capacity(entries.len()),
                    rest: entries.into_iter(),
                    key: None,
                },
            };
            if stack.len() >= MAX_DEPTH {
                return Err(YamlError::NestingTooDeep { limit: MAX_DEPTH });
            }
            match frame.next_child(span) {
                Some(child) => {
                    stack.push(frame);
                    next = child;
                }
                None => break synthetic(frame.into_value()),
            }
        };

        // Climb, closing finished collections, until one has a child left.
        next = loop {
            let Some(mut frame) = stack.pop() else {
                return Ok(node);
            };
            frame.attach(node);
            if let Some(child) = frame.next_child(span) {
                stack.push(frame);
                break child;
            }
            node = synthetic(frame.into_value());
        };
    }
}

/// A collection being unrolled by [`ConfigTree::unroll`].
enum UnrollFrame<'a> {
    Sequence {
        items: Vec<Value>,
        rest: std::slice::Iter<'a, ConfigTree>,
    },
    Mapping {
        map: Map<String, Value>,
        rest: std::slice::Iter<'a, (ConfigTree, ConfigTree)>,
        key: String,
    },
}

impl<'a> UnrollFrame<'a> {
    fn next_child(&mut self) -> Option<&'a ConfigTree> {
        match self {
            Self::Sequence { rest, .. } => rest.next(),
            Self::Mapping { rest, key, .. } => {
                let (name, value) = rest.next()?;
                *key = name.key_string();
                Some(value)
            }
        }
    }

    fn attach(&mut self, child: Value) {
        match self {
            Self::Sequence { items, .. } => items.push(child),
            Self::Mapping { map, key, .. } => {
                map.insert(std::mem::take(key), child);
            }
        }
    }

    fn into_value(self) -> Value {
        match self {
            Self::Sequence { items, .. } => Value::Array(items),
            Self::Mapping { map, .. } => Value::Object(map),
        }
    }
}

impl ConfigTree {
    /// Strips spans and returns the plain value.
    ///
    /// Mapping keys become strings: string keys are kept, other scalars use
    /// their display form, and collection keys are rendered as JSON text.
    /// This makes `unroll` lossy for non-string keys.
    #[must_use]
    pub fn unroll(&self) -> Value {
        let mut stack: Vec<UnrollFrame<'_>> = Vec::new();
        let mut next = self;
        loop {
            let mut value = loop {
                let mut frame = match next.value() {
                    TreeValue::Scalar(scalar) => break unroll_scalar(scalar),
                    TreeValue::Sequence(items) => UnrollFrame::Sequence {
                        items: Vec::with_capacity(items.len()),
                        rest: items.iter(),
                    },
                    TreeValue::Mapping(entries) => UnrollFrame::Mapping {
                        map: Map::new(),
                        rest: entries.iter(),
                        key: String::new(),
                    },
                };
                match frame.next_child() {
                    Some(child) => {
                        stack.push(frame);
                        next = child;
                    }
                    None => break frame.into_value(),
                }
            };

            next = loop {
                let Some(mut frame) = stack.pop() else {
                    return value;
                };
                frame.attach(value);
                if let Some(child) = frame.next_child() {
                    stack.push(frame);
                    break child;
                }
                value = frame.into_value();
            };
        }
    }

    fn key_string(&self) -> String {
        match self.value() {
            TreeValue::Scalar(scalar) => scalar.to_string(),
            TreeValue::Sequence(_) | TreeValue::Mapping(_) => self.unroll().to_string(),
        }
    }
}

fn unroll_scalar(scalar: &Scalar) -> Value {
    match scalar {
        Scalar::Null => Value::Null,
        Scalar::Bool(flag) => Value::Bool(*flag),
        Scalar::Number(number) => Value::Number(number.clone()),
        Scalar::String(text) => Value::String(text.clone()),
    }
}
