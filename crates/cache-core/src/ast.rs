//! Syntax tree handle consumed by the cache.
//!
//! The cache never inspects a query's tree; it only needs a stable 128-bit
//! structural hash to fold into the cache key. Engines implement
//! [`SyntaxTree`] on their own AST; [`TextTree`] covers engines that key on
//! the normalized query text.

use ahash::RandomState;
use std::fmt;
use std::hash::{BuildHasher, Hash, Hasher};
use std::sync::Arc;

/// 128-bit structural hash of a syntax tree, as two 64-bit words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TreeHash(pub u64, pub u64);

/// Handle to a parsed query owned by the engine.
///
/// `tree_hash` must be deterministic for a given tree shape; two trees are
/// considered identical for caching purposes iff their hashes are equal.
pub trait SyntaxTree: fmt::Debug + Send + Sync {
    fn tree_hash(&self) -> TreeHash;
}

pub type AstRef = Arc<dyn SyntaxTree>;

// Fixed seeds so the hash is stable across processes.
const LOW_SEEDS: (u64, u64, u64, u64) = (0x9e37_79b9, 0x85eb_ca6b, 0xc2b2_ae35, 0x27d4_eb2f);
const HIGH_SEEDS: (u64, u64, u64, u64) = (0x1656_67b1, 0x8546_5fd5, 0x9b05_688c, 0x1f83_d9ab);

fn seeded_hash(text: &str, seeds: (u64, u64, u64, u64)) -> u64 {
    let state = RandomState::with_seeds(seeds.0, seeds.1, seeds.2, seeds.3);
    let mut hasher = state.build_hasher();
    text.hash(&mut hasher);
    hasher.finish()
}

/// Syntax tree keyed on the whitespace-normalized query text.
#[derive(Debug, Clone)]
pub struct TextTree {
    text: String,
    hash: TreeHash,
}

impl TextTree {
    pub fn new(query: &str) -> Self {
        let text = normalize(query);
        let hash = TreeHash(
            seeded_hash(&text, LOW_SEEDS),
            seeded_hash(&text, HIGH_SEEDS),
        );
        Self { text, hash }
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl SyntaxTree for TextTree {
    fn tree_hash(&self) -> TreeHash {
        self.hash
    }
}

fn normalize(query: &str) -> String {
    query.split_whitespace().collect::<Vec<_>>().join(" ")
}
