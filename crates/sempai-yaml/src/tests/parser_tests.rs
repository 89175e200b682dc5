//! Tests for YAML parsing and span assignment.

use rstest::{fixture, rstest};
use sempai_core::{Position, SourceHash, SourceRegistry};
use serde_json::{Value, json};

use crate::{ConfigTree, Layout, MAX_DEPTH, Scalar, ScalarStyle, TreePath, YamlError, parse};

const RULES: &str = "\
rules:
  - id: dup-call
    languages: [python]
    message: \"duplicate\"
    pattern-either:
      - pattern: foo()
      - pattern: 'foo()'
      - pattern: |
          bar()
";

#[fixture]
fn registry() -> SourceRegistry {
    SourceRegistry::new()
}

fn node<'a>(tree: &'a ConfigTree, path: &TreePath) -> &'a ConfigTree {
    tree.at(path).expect("node at path")
}

fn rule() -> TreePath {
    TreePath::root().key("rules").index(0)
}

#[rstest]
fn parse_registers_source_text(registry: SourceRegistry) {
    let tree = parse(&registry, RULES, Some("rules.yaml")).expect("parse rules");

    let hash = SourceHash::of(RULES);
    assert_eq!(registry.get(&hash).as_deref(), Some(RULES));
    assert_eq!(tree.span().source(), Some(&hash));
    assert_eq!(tree.span().file(), Some("rules.yaml"));
}

#[rstest]
fn scalar_spans_locate_their_text(registry: SourceRegistry) {
    let tree = parse(&registry, RULES, Some("rules.yaml")).expect("parse rules");

    let id = node(&tree, &rule().key("id"));
    assert_eq!(id.as_str(), Some("dup-call"));
    assert_eq!(id.span().start, Position::new(1, 8));

    let quoted = node(&tree, &rule().key("pattern-either").index(1).key("pattern"));
    assert_eq!(quoted.as_str(), Some("foo()"));
    assert_eq!(quoted.span().start, Position::new(6, 17));
    assert_eq!(quoted.layout(), Layout::Scalar(ScalarStyle::SingleQuoted));
}

#[rstest]
fn keys_carry_their_own_spans(registry: SourceRegistry) {
    let tree = parse(&registry, RULES, None).expect("parse rules");
    let entries = node(&tree, &rule()).as_mapping().expect("rule mapping");
    let (key, _) = entries.get(1).expect("second entry");

    assert_eq!(key.as_str(), Some("languages"));
    assert_eq!(key.span().start, Position::new(2, 4));
}

#[rstest]
#[case::plain(&["pattern-either", "0", "pattern"], ScalarStyle::Plain)]
#[case::single(&["pattern-either", "1", "pattern"], ScalarStyle::SingleQuoted)]
#[case::literal(&["pattern-either", "2", "pattern"], ScalarStyle::Literal)]
#[case::double(&["message"], ScalarStyle::DoubleQuoted)]
fn scalar_styles_are_recorded(
    registry: SourceRegistry,
    #[case] segments: &[&str],
    #[case] style: ScalarStyle,
) {
    let tree = parse(&registry, RULES, None).expect("parse rules");
    let path = segments.iter().fold(rule(), |path, segment| {
        segment
            .parse::<usize>()
            .map_or_else(|_| path.clone().key(*segment), |index| path.clone().index(index))
    });
    assert_eq!(node(&tree, &path).layout(), Layout::Scalar(style));
}

#[rstest]
fn collections_record_block_or_flow_layout(registry: SourceRegistry) {
    let tree = parse(&registry, RULES, None).expect("parse rules");

    assert_eq!(node(&tree, &rule().key("languages")).layout(), Layout::Flow);
    assert_eq!(node(&tree, &rule().key("pattern-either")).layout(), Layout::Block);
    assert_eq!(node(&tree, &TreePath::root().key("rules")).layout(), Layout::Block);
}

#[rstest]
fn literal_block_value_keeps_newline(registry: SourceRegistry) {
    let tree = parse(&registry, RULES, None).expect("parse rules");
    let literal = node(&tree, &rule().key("pattern-either").index(2).key("pattern"));
    assert_eq!(literal.as_str(), Some("bar()\n"));
}

#[rstest]
#[case::null("~", Scalar::Null)]
#[case::empty_null("", Scalar::Null)]
#[case::bool_true("true", Scalar::Bool(true))]
#[case::bool_false("False", Scalar::Bool(false))]
#[case::integer("42", Scalar::Number(42.into()))]
#[case::negative("-7", Scalar::Number((-7).into()))]
#[case::hex("0x1F", Scalar::Number(31.into()))]
#[case::octal("0o17", Scalar::Number(15.into()))]
#[case::word("python", Scalar::from("python"))]
#[case::yes_is_text("yes", Scalar::from("yes"))]
#[case::underscored("1_000", Scalar::from("1_000"))]
fn plain_scalars_resolve_with_core_schema(
    registry: SourceRegistry,
    #[case] text: &str,
    #[case] expected: Scalar,
) {
    let tree = parse(&registry, &format!("value: {text}\n"), None).expect("parse scalar");
    assert_eq!(node(&tree, &TreePath::root().key("value")).as_scalar(), Some(&expected));
}

#[rstest]
fn quoted_and_tagged_scalars_stay_strings(registry: SourceRegistry) {
    let tree = parse(&registry, "a: '42'\nb: \"true\"\nc: !!str 7\n", None).expect("parse");
    assert_eq!(tree.unroll(), json!({"a": "42", "b": "true", "c": "7"}));
}

#[rstest]
#[case::rules(RULES)]
#[case::flow("{a: [1, 2, {b: c}], d: null}\n")]
#[case::nested("outer:\n  inner:\n    - x: 1\n      y: [true, false]\n    - z\n")]
#[case::folded("text: >\n  folded\n  lines\nafter: 1\n")]
#[case::comments("# header\nkey: value # trailing\nlist:\n  # between\n  - one\n")]
fn unroll_matches_reference_loader(registry: SourceRegistry, #[case] text: &str) {
    let tree = parse(&registry, text, None).expect("parse document");
    let reference: Value = serde_saphyr::from_str(text).expect("reference load");
    assert_eq!(tree.unroll(), reference);
}

#[rstest]
fn aliases_resolve_to_anchored_subtree(registry: SourceRegistry) {
    let text = "base: &common\n  languages: [go]\nrule: *common\n";
    let tree = parse(&registry, text, None).expect("parse aliases");

    assert_eq!(
        tree.unroll(),
        json!({"base": {"languages": ["go"]}, "rule": {"languages": ["go"]}})
    );
    let base = node(&tree, &TreePath::root().key("base"));
    let alias = node(&tree, &TreePath::root().key("rule"));
    assert_eq!(alias.span(), base.span());
}

#[rstest]
fn only_the_first_document_is_read(registry: SourceRegistry) {
    let tree = parse(&registry, "a: 1\n---\nb: 2\n", None).expect("parse stream");
    assert_eq!(tree.unroll(), json!({"a": 1}));
}

#[rstest]
fn empty_text_parses_to_null(registry: SourceRegistry) {
    let tree = parse(&registry, "", Some("empty.yaml")).expect("parse empty");
    assert_eq!(tree.unroll(), Value::Null);
    assert_eq!(tree.span().file(), Some("empty.yaml"));
}

#[rstest]
fn malformed_text_reports_position(registry: SourceRegistry) {
    let err = parse(&registry, "rules:\n  - id: [unclosed\n", Some("bad.yaml"))
        .expect_err("malformed YAML should fail");

    let YamlError::Syntax { position, file, .. } = &err else {
        panic!("expected a syntax error, got {err:?}");
    };
    assert!(position.is_some());
    assert_eq!(file.as_deref(), Some("bad.yaml"));

    let diagnostic = err.to_diagnostic();
    assert_eq!(diagnostic.spans().len(), 1);
    assert!(diagnostic.short_message().starts_with("invalid YAML"));
}

fn flow_nesting(depth: usize) -> String {
    format!("{}{}\n", "[".repeat(depth), "]".repeat(depth))
}

fn block_nesting(depth: usize) -> String {
    format!("{}leaf\n", "- ".repeat(depth))
}

#[rstest]
#[case::flow(flow_nesting(MAX_DEPTH + 1))]
#[case::block(block_nesting(MAX_DEPTH + 1))]
fn deep_nesting_is_rejected(registry: SourceRegistry, #[case] text: String) {
    let err = parse(&registry, &text, None).expect_err("nesting should be limited");
    assert_eq!(err, YamlError::NestingTooDeep { limit: MAX_DEPTH });
}

#[rstest]
#[case::flow(flow_nesting(MAX_DEPTH))]
#[case::block(block_nesting(MAX_DEPTH))]
fn nesting_at_the_limit_is_accepted(registry: SourceRegistry, #[case] text: String) {
    let mut node = &parse(&registry, &text, None).expect("parse at limit");
    let mut depth = 0;
    while let Some(items) = node.as_sequence() {
        depth += 1;
        let [inner] = items else { break };
        node = inner;
    }
    assert_eq!(depth, MAX_DEPTH);
}
