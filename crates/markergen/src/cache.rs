//! Caller-owned memo of markers extracted from runtime types.

use crate::marker::Marker;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, PoisonError, RwLock};

/// Thread-safe map from an extraction key to its marker.
///
/// Values are computed outside the lock. When two threads race on the same
/// key both compute, and the first insert wins; later callers all observe
/// the winner.
#[derive(Debug)]
pub struct MarkerCache<K> {
    entries: RwLock<HashMap<K, Arc<Marker>>>,
}

impl<K> Default for MarkerCache<K> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash> MarkerCache<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &K) -> Option<Arc<Marker>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Return the cached marker for `key`, computing and storing it if absent.
    pub fn get_or_insert_with<F, E>(&self, key: K, compute: F) -> Result<Arc<Marker>, E>
    where
        F: FnOnce(&K) -> Result<Marker, E>,
    {
        if let Some(marker) = self.get(&key) {
            return Ok(marker);
        }
        let computed = Arc::new(compute(&key)?);
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        Ok(Arc::clone(entries.entry(key).or_insert(computed)))
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GenerateError;
    use crate::marker::MarkerVisibility;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    fn build(name: &str) -> Result<Marker, GenerateError> {
        Marker::new(name, vec![], vec![], true, MarkerVisibility::ImplicitPublic)
    }

    #[test]
    fn test_computes_once_per_key() {
        let cache = MarkerCache::new();
        let calls = AtomicUsize::new(0);
        for _ in 0..3 {
            let marker = cache
                .get_or_insert_with("person", |key| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    build(key)
                })
                .unwrap();
            assert_eq!(marker.name(), "person");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_errors_are_not_cached() {
        let cache: MarkerCache<&str> = MarkerCache::new();
        let err = cache
            .get_or_insert_with("bad", |_| {
                Err(GenerateError::EmptyIdentifier {
                    column: String::new(),
                })
            })
            .unwrap_err();
        assert!(matches!(err, GenerateError::EmptyIdentifier { .. }));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_concurrent_callers_agree_on_winner() {
        let cache = Arc::new(MarkerCache::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || cache.get_or_insert_with(1u32, |_| build("Shared")).unwrap())
            })
            .collect();
        let markers: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let winner = cache.get(&1).unwrap();
        assert!(markers.iter().all(|m| Arc::ptr_eq(m, &winner)));
    }
}
