use std::sync::Arc;

use crate::memory::{MemoryStore, MemoryStoreConfig};
use crate::settings::EntrySettings;
use crate::store::Store;

/// Hands out entry settings that all read through one shared store
#[derive(Clone)]
pub struct CacheBuilder {
    store: Arc<dyn Store>,
}

impl CacheBuilder {
    /// Creates a builder over an existing store
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Creates a builder over a fresh [`MemoryStore`] whose entries never
    /// expire unless told to
    pub fn in_memory() -> Self {
        Self::with_config(MemoryStoreConfig::default())
    }

    /// Creates a builder over a fresh [`MemoryStore`] with the given config
    pub fn with_config(config: MemoryStoreConfig) -> Self {
        Self::new(Arc::new(MemoryStore::with_config(config)))
    }

    /// Returns new settings for an entry holding values of type `T`
    pub fn for_type<T>(&self) -> EntrySettings<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        EntrySettings::new(Arc::clone(&self.store))
    }

    /// Gets the shared store
    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }
}

impl Default for CacheBuilder {
    fn default() -> Self {
        Self::in_memory()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_the_store() {
        let builder = CacheBuilder::default();
        let other = builder.clone();

        builder
            .for_type::<u32>()
            .with_key("answer")
            .build_value_from(|| 42)
            .get_from_cache()
            .unwrap();

        assert!(other.for_type::<u32>().with_key("answer").is_in_cache().unwrap());
        assert!(Arc::ptr_eq(builder.store(), other.store()));
    }

    #[test]
    fn test_settings_are_independent() {
        let builder = CacheBuilder::in_memory();
        let first = builder.for_type::<u32>().with_key("a");
        let second = builder.for_type::<u32>();

        assert!(first.key().is_some());
        assert!(second.key().is_none());
    }
}
