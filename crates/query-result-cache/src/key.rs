//! Logical identity of a cacheable query.

use ahash::RandomState;
use cache_core::{AstRef, Schema, Settings};
use std::hash::{BuildHasher, Hash, Hasher};

/// Key for cache lookups: (syntax tree, output schema, settings, identity).
///
/// Two keys are equal iff their tree hashes match and the remaining three
/// components compare equal; the `Hash` impl feeds the same components into
/// the hasher in a fixed order, so hash-equal keys that are not equal are
/// resolved by the full comparison in the map.
#[derive(Debug, Clone)]
pub struct CacheKey {
    ast: AstRef,
    header: Schema,
    settings: Settings,
    identity: Option<String>,
}

impl CacheKey {
    pub fn new(ast: AstRef, header: Schema, settings: Settings, identity: Option<String>) -> Self {
        Self {
            ast,
            header,
            settings,
            identity,
        }
    }

    pub fn ast(&self) -> &AstRef {
        &self.ast
    }

    pub fn header(&self) -> &Schema {
        &self.header
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    /// Stable 64-bit digest for log lines.
    pub fn fingerprint(&self) -> u64 {
        let state = RandomState::with_seeds(
            0x243f_6a88_85a3_08d3,
            0x1319_8a2e_0370_7344,
            0xa409_3822_299f_31d0,
            0x082e_fa98_ec4e_6c89,
        );
        let mut hasher = state.build_hasher();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

impl PartialEq for CacheKey {
    fn eq(&self, other: &Self) -> bool {
        self.ast.tree_hash() == other.ast.tree_hash()
            && self.header == other.header
            && self.settings == other.settings
            && self.identity == other.identity
    }
}

impl Eq for CacheKey {}

impl Hash for CacheKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let tree = self.ast.tree_hash();
        state.write_u64(tree.0);
        state.write_u64(tree.1);
        self.header.names_and_types_text().hash(state);
        self.settings.hash_into(state);
        self.identity.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cache_core::{DataType, Field, TextTree};
    use std::collections::hash_map::DefaultHasher;
    use std::sync::Arc;

    fn id_header() -> Schema {
        Schema::new(vec![Field::new("id", DataType::Int64, false)])
    }

    fn key(sql: &str, settings: Settings, identity: Option<&str>) -> CacheKey {
        CacheKey::new(
            Arc::new(TextTree::new(sql)),
            id_header(),
            settings,
            identity.map(String::from),
        )
    }

    fn hash_of(key: &CacheKey) -> u64 {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_same_query_same_key() {
        let a = key("SELECT * FROM users", Settings::new(), None);
        let b = key("SELECT * FROM users", Settings::new(), None);
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn test_different_query_different_key() {
        let a = key("SELECT * FROM users", Settings::new(), None);
        let b = key("SELECT * FROM orders", Settings::new(), None);
        assert_ne!(a, b);
    }

    #[test]
    fn test_header_is_part_of_identity() {
        let ast: AstRef = Arc::new(TextTree::new("SELECT * FROM users"));
        let a = CacheKey::new(Arc::clone(&ast), id_header(), Settings::new(), None);
        let b = CacheKey::new(
            ast,
            Schema::new(vec![Field::new("id", DataType::Int32, false)]),
            Settings::new(),
            None,
        );
        assert_ne!(a, b);
    }

    #[test]
    fn test_settings_are_part_of_identity() {
        let a = key("SELECT 1", Settings::new().with("max_threads", "4"), None);
        let b = key("SELECT 1", Settings::new().with("max_threads", "8"), None);
        let c = key("SELECT 1", Settings::new().with("max_threads", "4"), None);
        assert_ne!(a, b);
        assert_eq!(a, c);
    }

    #[test]
    fn test_identity_is_part_of_identity() {
        let a = key("SELECT 1", Settings::new(), Some("alice"));
        let b = key("SELECT 1", Settings::new(), Some("bob"));
        let c = key("SELECT 1", Settings::new(), None);
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_fingerprint_is_stable() {
        let a = key("SELECT 1", Settings::new(), None);
        let b = key("SELECT 1", Settings::new(), None);
        assert_eq!(a.fingerprint(), b.fingerprint());
    }
}
