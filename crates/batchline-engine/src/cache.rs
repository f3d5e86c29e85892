//! # Entity Cache
//!
//! Recently processed entities keyed `user_<id>` / `order_<id>`.
//!
//! Eviction is a full flush: once an insert pushes the size past capacity,
//! the whole map is cleared. There is no LRU ordering.

use std::collections::HashMap;

use tracing::debug;

use batchline_core::DerivedEntity;

#[derive(Debug)]
pub struct EntityCache {
    entries: HashMap<String, DerivedEntity>,
    capacity: usize,
    flushes: u64,
}

impl EntityCache {
    pub fn new(capacity: usize) -> Self {
        EntityCache {
            entries: HashMap::new(),
            capacity,
            flushes: 0,
        }
    }

    /// Inserts an entity, then clears everything if the cache is over
    /// capacity.
    pub fn insert(&mut self, entity: DerivedEntity) {
        self.entries.insert(entity.cache_key(), entity);
        if self.entries.len() > self.capacity {
            debug!(size = self.entries.len(), capacity = self.capacity, "Entity cache full, clearing");
            self.entries.clear();
            self.flushes += 1;
        }
    }

    pub fn get(&self, key: &str) -> Option<&DerivedEntity> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// How many times the cache has been flushed.
    pub fn flushes(&self) -> u64 {
        self.flushes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use batchline_core::derivation::onboard;
    use batchline_core::validation::NormalizedFields;

    fn user(i: usize) -> DerivedEntity {
        let fields = NormalizedFields {
            email: Some(format!("user{i}@example.com")),
            age: Some(30),
            ..Default::default()
        };
        DerivedEntity::User(onboard(&fields, i).unwrap())
    }

    #[test]
    fn test_lookup_by_cache_key() {
        let mut cache = EntityCache::new(10);
        let entity = user(0);
        let key = entity.cache_key();
        assert!(key.starts_with("user_"));

        cache.insert(entity.clone());
        assert_eq!(cache.get(&key), Some(&entity));
    }

    #[test]
    fn test_overflow_clears_everything() {
        let mut cache = EntityCache::new(3);
        for i in 0..3 {
            cache.insert(user(i));
        }
        assert_eq!(cache.len(), 3);

        // The fourth insert overflows and flushes, including itself.
        cache.insert(user(3));
        assert!(cache.is_empty());
        assert_eq!(cache.flushes(), 1);

        cache.insert(user(4));
        assert_eq!(cache.len(), 1);
    }
}
