//! Core location and diagnostic types for Sempai rule tooling.
//!
//! This crate provides the types shared by the rule file parser and the
//! pattern autofixer: source positions and spans, a content-addressed
//! registry of source text, and a renderer that turns span-anchored
//! messages into human-readable reports.
//!
//! # Core types
//!
//! - [`Position`] and [`Span`]: zero-indexed source locations
//! - [`SourceHash`] and [`SourceRegistry`]: content-addressed source text
//! - [`SpanDiagnostic`], [`Level`], and [`ContextWindow`]: report rendering
//!
//! # Example
//!
//! ```
//! use sempai_core::{Position, SourceRegistry, Span};
//!
//! let registry = SourceRegistry::new();
//! let hash = registry.register("rules: []\n");
//! let span = Span::new(Position::new(0, 0), Position::new(0, 9)).with_source(hash);
//! assert!(registry.get(&hash).is_some());
//! assert!(!span.is_synthetic());
//! ```

mod diagnostic;
mod source;
mod span;

pub use diagnostic::{ContextWindow, Level, SpanDiagnostic};
pub use source::{SourceHash, SourceRegistry};
pub use span::{Position, Span};

#[cfg(test)]
mod tests;
