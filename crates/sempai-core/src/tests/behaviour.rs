//! Behaviour-driven tests for diagnostic rendering.

use std::str::FromStr;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

use crate::{ContextWindow, Level, Position, SourceHash, SourceRegistry, Span, SpanDiagnostic};

/// A quoted string value from a Gherkin feature file.
#[derive(Debug, Clone, PartialEq, Eq)]
struct QuotedString(String);

impl FromStr for QuotedString {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim_matches('"').to_owned()))
    }
}

impl QuotedString {
    fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Default)]
struct TestWorld {
    registry: SourceRegistry,
    file: Option<String>,
    source: Option<SourceHash>,
    span: Option<Span>,
    report: Option<String>,
}

#[fixture]
fn world() -> TestWorld {
    TestWorld::default()
}

#[given("a registered source of {count} lines named {file}")]
fn given_registered_source(world: &mut TestWorld, count: u32, file: QuotedString) {
    let text: String = (0..count).map(|i| format!("line{i}\n")).collect();
    world.source = Some(world.registry.register(&text));
    world.file = Some(file.as_str().to_owned());
}

#[given("an unregistered source named {file}")]
fn given_unregistered_source(world: &mut TestWorld, file: QuotedString) {
    world.source = Some(SourceHash::of("not in the registry"));
    world.file = Some(file.as_str().to_owned());
}

#[given("a span from line {start} to line {end}")]
fn given_span(world: &mut TestWorld, start: u32, end: u32) {
    let mut span = Span::new(Position::new(start, 0), Position::new(end, 0));
    if let Some(file) = &world.file {
        span = span.with_file(file.clone());
    }
    if let Some(source) = world.source {
        span = span.with_source(source);
    }
    world.span = Some(span);
}

#[when("an error {message} is rendered with {before} line before and {after} line after")]
fn when_rendered(world: &mut TestWorld, message: QuotedString, before: u32, after: u32) {
    let span = world.span.clone().expect("span should be set");
    let report = SpanDiagnostic::new(Level::Error, message.as_str())
        .with_span(span)
        .emit(&world.registry, ContextWindow::new(before, after));
    world.report = Some(report);
}

#[then("the report starts with {prefix}")]
fn then_report_starts_with(world: &mut TestWorld, prefix: QuotedString) {
    let report = world.report.as_ref().expect("report should be set");
    assert!(
        report.starts_with(prefix.as_str()),
        "expected report to start with '{}', got: {report}",
        prefix.as_str()
    );
}

#[then("the report contains {snippet}")]
fn then_report_contains(world: &mut TestWorld, snippet: QuotedString) {
    let report = world.report.as_ref().expect("report should be set");
    assert!(
        report.contains(snippet.as_str()),
        "expected report to contain '{}', got: {report}",
        snippet.as_str()
    );
}

#[then("the report shows {count} snippet lines")]
fn then_snippet_lines(world: &mut TestWorld, count: usize) {
    let report = world.report.as_ref().expect("report should be set");
    let shown = report.lines().filter(|line| line.contains("| ")).count();
    assert_eq!(shown, count, "unexpected report: {report}");
}

#[scenario(
    path = "tests/features/diagnostics.feature",
    name = "Context lines surround a multi-line span"
)]
fn context_lines(world: TestWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/diagnostics.feature",
    name = "Unregistered text renders only the location"
)]
fn unregistered_text(world: TestWorld) {
    let _ = world;
}
