//! Tests for [`SourceHash`] and [`SourceRegistry`].

use std::sync::Arc;

use rstest::rstest;

use crate::{SourceHash, SourceRegistry};

#[rstest]
#[case::empty("")]
#[case::single_line("rules: []")]
#[case::unicode("pattern: \"é\"\n")]
fn hash_is_stable_for_identical_text(#[case] text: &str) {
    assert_eq!(SourceHash::of(text), SourceHash::of(text));
}

#[test]
fn hash_differs_for_different_text() {
    assert_ne!(SourceHash::of("a"), SourceHash::of("b"));
}

#[test]
fn hash_displays_as_lowercase_hex() {
    let rendered = SourceHash::of("abc").to_string();
    assert_eq!(
        rendered,
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
}

#[test]
fn register_returns_content_hash() {
    let registry = SourceRegistry::new();
    let hash = registry.register("id: x\n");
    assert_eq!(hash, SourceHash::of("id: x\n"));
    assert_eq!(registry.get(&hash).as_deref(), Some("id: x\n"));
}

#[test]
fn repeated_registration_is_a_no_op() {
    let registry = SourceRegistry::new();
    let first = registry.register("same");
    let stored = registry.get(&first).expect("first copy");
    let second = registry.register("same");
    assert_eq!(first, second);
    assert_eq!(registry.len(), 1);
    let again = registry.get(&second).expect("still stored");
    assert!(Arc::ptr_eq(&stored, &again));
}

#[test]
fn unknown_hash_is_not_found() {
    let registry = SourceRegistry::new();
    assert!(registry.is_empty());
    assert!(registry.get(&SourceHash::of("missing")).is_none());
}
