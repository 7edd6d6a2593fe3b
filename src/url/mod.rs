//! URL handling module for Crawlsheet
//!
//! This module canonicalizes URLs and derives the dedup keys that guarantee
//! each resource is recorded at most once per run.

mod domain;
mod normalize;

use xxhash_rust::xxh3::xxh3_64;

// Re-export main functions
pub use domain::{extract_host, same_host};
pub use normalize::{asset_key, canonicalize_url, page_key};

/// Canonical identity of a crawled resource
///
/// A fixed-width xxh3 hash of the lower-cased, normalized URL text. The hash is
/// stable across platforms and processes, so keys are comparable for the whole
/// run regardless of which task produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DedupKey(u64);

impl DedupKey {
    /// Hashes already-normalized URL text into a key
    ///
    /// The text is lower-cased here so callers cannot forget it.
    pub fn from_normalized(text: &str) -> Self {
        Self(xxh3_64(text.to_lowercase().as_bytes()))
    }

    /// Returns the raw hash value
    pub fn value(&self) -> u64 {
        self.0
    }
}
