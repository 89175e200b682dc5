//! Span-preserving YAML parsing for Sempai rule files.
//!
//! [`parse`] turns YAML text into a [`ConfigTree`] whose every node carries
//! the [`Span`](sempai_core::Span) it was read from. Node equality and
//! hashing ignore spans, so trees compare like the plain values they hold.
//! [`wrap`] and [`ConfigTree::unroll`] convert between trees and
//! `serde_json` values.
//!
//! [`Document`] adds format-preserving edits on top: removing block
//! sequence items and replacing scalars touches only the affected lines,
//! so an unedited document renders back byte for byte.
//!
//! # Example
//!
//! ```
//! use sempai_core::SourceRegistry;
//! use sempai_yaml::parse;
//!
//! let registry = SourceRegistry::new();
//! let tree = parse(&registry, "languages: [python]\n", None)?;
//! assert_eq!(tree.unroll(), serde_json::json!({"languages": ["python"]}));
//! # Ok::<(), sempai_yaml::YamlError>(())
//! ```

mod convert;
mod document;
mod error;
mod lines;
mod parser;
mod scalar;
mod tree;

pub use convert::{IntoConfigTree, wrap};
pub use document::Document;
pub use error::{EditError, YamlError};
pub use parser::{MAX_DEPTH, parse};
pub use tree::{ConfigTree, Layout, PathSegment, Scalar, ScalarStyle, TreePath, TreeValue};

#[cfg(test)]
mod tests;
