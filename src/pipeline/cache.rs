//! Per-session memoisation of extraction results, keyed by content identity.
//!
//! Parsing a large PDF takes long enough that doing it on every request
//! would dominate the interaction. The cache maps a [`DocumentId`] (BLAKE3
//! hash of the uploaded bytes) to the extracted value:
//!
//! * the first request for an identity runs the compute closure once and
//!   stores its result;
//! * later requests return the stored value without running anything;
//! * a failing closure stores nothing, so the next upload retries.
//!
//! The cache is unbounded unless a capacity is given, in which case the
//! least recently used identity is evicted first.

use lru::LruCache;
use serde::{Serialize, Serializer};
use std::fmt;
use std::num::NonZeroUsize;
use tracing::debug;

/// Content-derived identity of an uploaded file.
///
/// Two uploads with the same bytes share an identity regardless of their
/// file names.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentId(blake3::Hash);

impl DocumentId {
    pub fn of(bytes: &[u8]) -> Self {
        Self(blake3::hash(bytes))
    }

    /// Full lowercase hex digest.
    pub fn to_hex(&self) -> String {
        self.0.to_hex().to_string()
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // 12 hex digits is plenty to tell documents apart in logs
        f.write_str(&self.to_hex()[..12])
    }
}

impl fmt::Debug for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DocumentId({self})")
    }
}

impl Serialize for DocumentId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

/// Keyed store of computed values, one entry per [`DocumentId`].
pub struct DocumentCache<V> {
    entries: LruCache<DocumentId, V>,
}

impl<V: Clone> DocumentCache<V> {
    /// An unbounded cache.
    pub fn new() -> Self {
        Self {
            entries: LruCache::unbounded(),
        }
    }

    /// A cache holding at most `capacity` entries, evicting LRU first.
    pub fn with_capacity(capacity: NonZeroUsize) -> Self {
        Self {
            entries: LruCache::new(capacity),
        }
    }

    /// Unbounded when `capacity` is `None`.
    pub fn with_optional_capacity(capacity: Option<NonZeroUsize>) -> Self {
        match capacity {
            Some(c) => Self::with_capacity(c),
            None => Self::new(),
        }
    }

    /// Return the cached value for `id`, computing and storing it on a miss.
    ///
    /// `compute` runs at most once per resident identity. Its error is
    /// returned unchanged and leaves the cache untouched.
    pub fn get_or_compute<F, E>(&mut self, id: DocumentId, compute: F) -> Result<V, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        if let Some(value) = self.entries.get(&id) {
            debug!("cache hit for document {}", id);
            return Ok(value.clone());
        }

        debug!("cache miss for document {}", id);
        let value = compute()?;
        if let Some((evicted, _)) = self.entries.push(id, value.clone()) {
            if evicted != id {
                debug!("evicted document {} from cache", evicted);
            }
        }
        Ok(value)
    }

    pub fn contains(&self, id: &DocumentId) -> bool {
        self.entries.contains(id)
    }

    /// Drop one entry. Returns whether it was present.
    pub fn invalidate(&mut self, id: &DocumentId) -> bool {
        self.entries.pop(id).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V: Clone> Default for DocumentCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> fmt::Debug for DocumentCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentCache")
            .field("len", &self.entries.len())
            .field("cap", &self.entries.cap())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::convert::Infallible;

    fn text(s: &str) -> Result<String, Infallible> {
        Ok(s.to_string())
    }

    #[test]
    fn identity_depends_on_bytes_only() {
        assert_eq!(DocumentId::of(b"abc"), DocumentId::of(b"abc"));
        assert_ne!(DocumentId::of(b"abc"), DocumentId::of(b"abd"));
        assert_eq!(DocumentId::of(b"abc").to_string().len(), 12);
        assert_eq!(DocumentId::of(b"abc").to_hex().len(), 64);
    }

    #[test]
    fn compute_runs_once_per_identity() {
        let mut cache = DocumentCache::new();
        let calls = Cell::new(0);
        let id = DocumentId::of(b"same file");

        for _ in 0..3 {
            let value = cache
                .get_or_compute(id, || {
                    calls.set(calls.get() + 1);
                    text("extracted")
                })
                .unwrap();
            assert_eq!(value, "extracted");
        }
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn distinct_identities_are_independent() {
        let mut cache = DocumentCache::new();
        let a = cache.get_or_compute(DocumentId::of(b"a"), || text("A")).unwrap();
        let b = cache.get_or_compute(DocumentId::of(b"b"), || text("B")).unwrap();
        assert_eq!((a.as_str(), b.as_str()), ("A", "B"));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn failure_is_not_cached() {
        let mut cache: DocumentCache<String> = DocumentCache::new();
        let id = DocumentId::of(b"flaky");
        let first: Result<String, &str> = cache.get_or_compute(id, || Err("boom"));
        assert_eq!(first, Err("boom"));
        assert!(!cache.contains(&id));

        let second: Result<String, &str> = cache.get_or_compute(id, || Ok("ok".into()));
        assert_eq!(second.as_deref(), Ok("ok"));
    }

    #[test]
    fn invalidate_forces_recompute() {
        let mut cache = DocumentCache::new();
        let calls = Cell::new(0);
        let id = DocumentId::of(b"doc");
        let get = |cache: &mut DocumentCache<String>| {
            cache
                .get_or_compute(id, || {
                    calls.set(calls.get() + 1);
                    text("x")
                })
                .unwrap()
        };

        get(&mut cache);
        assert!(cache.invalidate(&id));
        assert!(!cache.invalidate(&id));
        get(&mut cache);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn capacity_evicts_least_recently_used() {
        let mut cache = DocumentCache::with_capacity(NonZeroUsize::new(2).unwrap());
        let (a, b, c) = (DocumentId::of(b"a"), DocumentId::of(b"b"), DocumentId::of(b"c"));

        cache.get_or_compute(a, || text("A")).unwrap();
        cache.get_or_compute(b, || text("B")).unwrap();
        // touch `a` so `b` becomes the LRU entry
        cache.get_or_compute(a, || text("unused")).unwrap();
        cache.get_or_compute(c, || text("C")).unwrap();

        assert!(cache.contains(&a));
        assert!(!cache.contains(&b));
        assert!(cache.contains(&c));
    }

    #[test]
    fn clear_empties_cache() {
        let mut cache = DocumentCache::new();
        cache.get_or_compute(DocumentId::of(b"a"), || text("A")).unwrap();
        cache.clear();
        assert!(cache.is_empty());
    }
}
