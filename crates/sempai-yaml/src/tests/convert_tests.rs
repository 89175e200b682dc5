//! Tests for `wrap` and `unroll`.

use rstest::rstest;
use sempai_core::{Position, Span};
use serde_json::{Value, json};

use crate::{ConfigTree, Layout, MAX_DEPTH, Scalar, TreeValue, YamlError, wrap};

fn stamp() -> Span {
    Span::new(Position::new(4, 2), Position::new(4, 9)).with_file("stamp.yaml")
}

#[rstest]
#[case::null(Value::Null)]
#[case::bool(json!(false))]
#[case::integer(json!(-12))]
#[case::float(json!(2.5))]
#[case::string(json!("return foo()"))]
#[case::empty_sequence(json!([]))]
#[case::empty_mapping(json!({}))]
#[case::rule(json!({
    "rules": [{
        "id": "dup",
        "languages": ["python"],
        "pattern-either": [{"pattern": "foo()"}, {"pattern": "foo()"}],
        "severity": "WARNING"
    }]
}))]
#[case::mixed_nesting(json!([[1, [2, [3]]], {"a": {"b": [null, true]}}]))]
fn unroll_inverts_wrap(#[case] value: Value) {
    let tree = wrap(value.clone(), &stamp()).expect("wrap value");
    assert_eq!(tree.unroll(), value);
}

#[test]
fn wrap_stamps_every_node_with_the_span() {
    let tree = wrap(json!({"a": [1, {"b": "c"}]}), &stamp()).expect("wrap value");
    let mut pending = vec![&tree];
    let mut visited = 0;
    while let Some(node) = pending.pop() {
        visited += 1;
        assert_eq!(node.span(), &stamp());
        assert_eq!(node.layout(), Layout::Synthetic);
        match node.value() {
            TreeValue::Sequence(items) => pending.extend(items),
            TreeValue::Mapping(entries) => pending.extend(entries.iter().flat_map(|(k, v)| [k, v])),
            TreeValue::Scalar(_) => {}
        }
    }
    assert_eq!(visited, 7);
}

#[test]
fn wrapping_a_tree_returns_it_unchanged() {
    let original = ConfigTree::string("kept", Span::synthetic(), Layout::Block);
    let wrapped = wrap(original.clone(), &stamp()).expect("wrap tree");

    assert_eq!(wrapped, original);
    assert_eq!(wrapped.span(), original.span());
    assert_eq!(wrapped.layout(), Layout::Block);
}

#[test]
fn wrapping_text_creates_a_string_scalar() {
    let tree = wrap("callfunc()", &stamp()).expect("wrap text");
    assert_eq!(tree.as_str(), Some("callfunc()"));
    assert_eq!(tree.span(), &stamp());
}

#[test]
fn unroll_stringifies_non_string_keys() {
    let key_seq = wrap(json!(["a", 1]), &stamp()).expect("wrap key");
    let tree = ConfigTree::new(
        TreeValue::Mapping(vec![
            (
                ConfigTree::new(TreeValue::Scalar(Scalar::Number(3.into())), stamp(), Layout::Synthetic),
                ConfigTree::string("three", stamp(), Layout::Synthetic),
            ),
            (
                ConfigTree::new(TreeValue::Scalar(Scalar::Null), stamp(), Layout::Synthetic),
                ConfigTree::string("nothing", stamp(), Layout::Synthetic),
            ),
            (
                ConfigTree::new(TreeValue::Scalar(Scalar::Bool(true)), stamp(), Layout::Synthetic),
                ConfigTree::string("yes", stamp(), Layout::Synthetic),
            ),
            (key_seq, ConfigTree::string("list", stamp(), Layout::Synthetic)),
        ]),
        stamp(),
        Layout::Synthetic,
    );

    assert_eq!(
        tree.unroll(),
        json!({"3": "three", "null": "nothing", "true": "yes", "[\"a\",1]": "list"})
    );
}

fn nested_arrays(depth: usize) -> Value {
    let mut value = json!({"leaf": [1, "two"]});
    for _ in 0..depth {
        value = Value::Array(vec![value]);
    }
    value
}

#[test]
fn wrap_rejects_excessive_nesting() {
    // The leaf mapping adds two levels of its own.
    let result = wrap(nested_arrays(MAX_DEPTH - 1), &stamp());
    assert_eq!(
        result.map(|tree| tree.unroll()),
        Err(YamlError::NestingTooDeep { limit: MAX_DEPTH })
    );
}

#[test]
fn nesting_at_the_limit_round_trips() {
    let value = nested_arrays(MAX_DEPTH - 2);
    let tree = wrap(value.clone(), &stamp()).expect("wrap at limit");
    assert_eq!(tree.unroll(), value);
}
