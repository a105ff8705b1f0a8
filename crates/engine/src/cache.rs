//! Read-through cache of resolved shapes keyed by type.

use crate::annotation::ResolvedShape;
use crate::error::ConfigurationError;
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Resolved annotations per static shape.
///
/// Misses are computed outside the lock; when two callers race, the first
/// published entry wins and later ones are discarded.
#[derive(Debug, Default)]
pub struct ShapeCache {
    entries: RwLock<HashMap<TypeId, Arc<ResolvedShape>>>,
}

impl ShapeCache {
    /// Empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached entry for `key`, if published.
    #[must_use]
    pub fn get(&self, key: TypeId) -> Option<Arc<ResolvedShape>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned()
    }

    /// Return the cached entry or compute, publish and return it. Failed
    /// computations are not cached.
    pub fn get_or_try_insert_with<F>(
        &self,
        key: TypeId,
        compute: F,
    ) -> Result<Arc<ResolvedShape>, ConfigurationError>
    where
        F: FnOnce() -> Result<ResolvedShape, ConfigurationError>,
    {
        if let Some(shape) = self.get(key) {
            return Ok(shape);
        }

        let computed = Arc::new(compute()?);
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let published = entries.entry(key).or_insert_with(|| {
            tracing::debug!(shape = computed.name(), "published resolved shape");
            Arc::clone(&computed)
        });
        Ok(Arc::clone(published))
    }

    /// Number of cached shapes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns true when nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::resolve;
    use crate::registry::RuleRegistry;
    use crate::shape::ShapeDeclaration;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Marker;

    #[test]
    fn first_publication_wins() -> Result<(), ConfigurationError> {
        let cache = ShapeCache::new();
        let registry = RuleRegistry::with_builtins();
        let calls = AtomicUsize::new(0);
        let compute = || {
            calls.fetch_add(1, Ordering::SeqCst);
            resolve(&ShapeDeclaration::new("Marker"), &registry)
        };

        let first = cache.get_or_try_insert_with(TypeId::of::<Marker>(), compute)?;
        let second = cache.get_or_try_insert_with(TypeId::of::<Marker>(), compute)?;

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
        Ok(())
    }

    #[test]
    fn failures_are_not_cached() {
        let cache = ShapeCache::new();
        let result = cache.get_or_try_insert_with(TypeId::of::<Marker>(), || {
            Err(ConfigurationError::DuplicateRule { name: "x".into() })
        });

        assert!(result.is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn concurrent_first_use_converges() {
        let cache = Arc::new(ShapeCache::new());
        let registry = Arc::new(RuleRegistry::with_builtins());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    cache.get_or_try_insert_with(TypeId::of::<Marker>(), || {
                        resolve(&ShapeDeclaration::new("Marker"), &registry)
                    })
                })
            })
            .collect();

        let shapes: Vec<_> = handles
            .into_iter()
            .filter_map(|handle| handle.join().ok())
            .filter_map(Result::ok)
            .collect();

        assert_eq!(shapes.len(), 8);
        assert!(shapes.windows(2).all(|pair| Arc::ptr_eq(&pair[0], &pair[1])));
    }
}
