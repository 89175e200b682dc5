//! Content-addressed storage for rule file text.
//!
//! Parsed configuration nodes only carry a [`SourceHash`]; the text itself
//! lives in a [`SourceRegistry`] owned by the caller for the duration of a
//! run. Diagnostics look the text up again when rendering snippets.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// SHA-256 digest of a source text.
///
/// # Example
///
/// ```
/// use sempai_core::SourceHash;
///
/// let a = SourceHash::of("rules: []\n");
/// let b = SourceHash::of("rules: []\n");
/// assert_eq!(a, b);
/// assert_eq!(a.to_string().len(), 64);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceHash([u8; 32]);

impl SourceHash {
    /// Computes the hash of `text`.
    #[must_use]
    pub fn of(text: &str) -> Self {
        Self(Sha256::digest(text.as_bytes()).into())
    }

    /// Returns the raw digest bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for SourceHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// Append-only map from content hash to source text.
///
/// The registry is an explicit context object: callers construct one per
/// run and pass it by reference to the parser and the diagnostic renderer.
/// Writes are idempotent, so registering the same text twice keeps the
/// first copy. Interior locking lets the registry be shared behind `&`.
///
/// # Example
///
/// ```
/// use sempai_core::SourceRegistry;
///
/// let registry = SourceRegistry::new();
/// let hash = registry.register("id: demo\n");
/// assert_eq!(registry.get(&hash).as_deref(), Some("id: demo\n"));
/// ```
#[derive(Debug, Default)]
pub struct SourceRegistry {
    sources: RwLock<HashMap<SourceHash, Arc<str>>>,
}

impl SourceRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Hashes and stores `text`, returning its hash.
    pub fn register(&self, text: &str) -> SourceHash {
        let hash = SourceHash::of(text);
        self.insert(hash, text);
        hash
    }

    /// Stores `text` under `hash` unless the hash is already present.
    ///
    /// Callers must only pair a hash with the text it was computed from.
    pub fn insert(&self, hash: SourceHash, text: &str) {
        let mut sources = self
            .sources
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        sources.entry(hash).or_insert_with(|| Arc::from(text));
    }

    /// Returns the text stored under `hash`.
    #[must_use]
    pub fn get(&self, hash: &SourceHash) -> Option<Arc<str>> {
        self.sources
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(hash)
            .map(Arc::clone)
    }

    /// Returns the number of distinct texts stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sources
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` if nothing has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
