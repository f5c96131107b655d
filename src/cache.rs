//! String canonicalization.
//!
//! Result pages repeat the same field labels and many of the same values
//! (author lists, units, registry numbers) across thousands of records.
//! Storing one shared instance per distinct string keeps memory bounded by
//! the number of distinct strings, not the number of records.

use std::sync::Arc;

use ahash::AHashSet;

/// Maps observed string content to a single shared instance.
///
/// Grows monotonically; there is no eviction. One cache is owned by one
/// [`crate::ResultSet`] and lives as long as it does.
#[derive(Debug, Default)]
pub struct CanonCache {
    seen: AHashSet<Arc<str>>,
}

impl CanonCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the shared instance for `value`, storing it on first sight.
    ///
    /// Equal content always yields the same `Arc`, so after caching, value
    /// equality implies pointer identity.
    pub fn canon(&mut self, value: &str) -> Arc<str> {
        if let Some(existing) = self.seen.get(value) {
            return Arc::clone(existing);
        }
        let shared: Arc<str> = Arc::from(value);
        self.seen.insert(Arc::clone(&shared));
        shared
    }

    /// Number of distinct strings stored.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_content_shares_one_instance() {
        let mut cache = CanonCache::new();
        let first = cache.canon("melting point");
        for _ in 0..100 {
            let again = cache.canon("melting point");
            assert!(Arc::ptr_eq(&first, &again));
        }
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn distinct_content_gets_distinct_instances() {
        let mut cache = CanonCache::new();
        let a = cache.canon("a");
        let b = cache.canon("b");
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn empty_string_is_cacheable() {
        let mut cache = CanonCache::new();
        let one = cache.canon("");
        let two = cache.canon("");
        assert!(Arc::ptr_eq(&one, &two));
    }
}
