use std::collections::HashMap;
use std::sync::{Arc, RwLock, Weak};
use std::time::{Duration, SystemTime};

use tokio::task::JoinHandle;

use crate::error::StoreError;
use crate::store::{EntryOptions, Store, StoredValue};

/// Represents a stored value with its expiration state
#[derive(Clone)]
pub struct Entry {
    pub value: StoredValue,
    pub absolute_expiration: Option<SystemTime>,
    pub sliding_expiration: Option<Duration>,
    last_access: SystemTime,
}

impl Entry {
    /// Creates a new entry, last accessed now
    pub fn new(value: StoredValue, options: EntryOptions) -> Self {
        Self {
            value,
            absolute_expiration: options.absolute_expiration,
            sliding_expiration: options.sliding_expiration,
            last_access: SystemTime::now(),
        }
    }

    /// Checks if this entry has expired at `now`
    pub fn is_expired_at(&self, now: SystemTime) -> bool {
        if self.absolute_expiration.is_some_and(|at| now > at) {
            return true;
        }
        match self.sliding_expiration {
            Some(window) => now
                .duration_since(self.last_access)
                .is_ok_and(|idle| idle > window),
            None => false,
        }
    }

    fn touch(&mut self, now: SystemTime) {
        self.last_access = now;
    }
}

/// Configuration for the MemoryStore
#[derive(Debug, Clone, Default)]
pub struct MemoryStoreConfig {
    /// Applied to writes that carry no expiration at all, `None` never expires
    pub default_sliding_expiration: Option<Duration>,
}

impl MemoryStoreConfig {
    /// Creates a config whose entries never expire by default
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the sliding expiration applied to writes without options
    pub fn with_default_sliding_expiration(mut self, within: Duration) -> Self {
        self.default_sliding_expiration = Some(within);
        self
    }
}

/// An in-process store with absolute and sliding expiration
#[derive(Default)]
pub struct MemoryStore {
    map: RwLock<HashMap<String, Entry>>,
    config: MemoryStoreConfig,
}

impl MemoryStore {
    /// Creates an empty store whose entries never expire unless told to
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store with the given config
    pub fn with_config(config: MemoryStoreConfig) -> Self {
        Self {
            map: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Gets the number of entries, expired ones not yet purged included.
    /// A poisoned lock reads as empty.
    pub fn len(&self) -> usize {
        self.map.read().map(|map| map.len()).unwrap_or(0)
    }

    /// Checks if the store holds no entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clears all entries
    pub fn clear(&self) -> Result<(), StoreError> {
        self.map.write().map_err(|_| StoreError::Poisoned)?.clear();
        Ok(())
    }

    /// Drops every expired entry and returns how many were removed
    pub fn purge_expired(&self) -> Result<usize, StoreError> {
        let now = SystemTime::now();
        let mut map = self.map.write().map_err(|_| StoreError::Poisoned)?;
        let before = map.len();
        map.retain(|_, entry| !entry.is_expired_at(now));
        let removed = before - map.len();
        if removed > 0 {
            tracing::debug!(removed, "purged expired cache entries");
        }
        Ok(removed)
    }

    /// Spawns a task on the current tokio runtime that purges expired entries
    /// every `interval`. The task ends once the store is dropped.
    pub fn spawn_purge_task(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let store: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(store) = store.upgrade() else {
                    break;
                };
                if let Err(err) = store.purge_expired() {
                    tracing::error!(error = %err, "expired entry purge failed");
                    break;
                }
            }
        })
    }

    fn effective_options(&self, options: EntryOptions) -> EntryOptions {
        match self.config.default_sliding_expiration {
            Some(within) if options.is_empty() => options.with_sliding_expiration(within),
            _ => options,
        }
    }
}

impl Store for MemoryStore {
    fn try_get(&self, key: &str) -> Result<Option<StoredValue>, StoreError> {
        let now = SystemTime::now();
        let mut map = self.map.write().map_err(|_| StoreError::Poisoned)?;
        let Some(entry) = map.get_mut(key) else {
            return Ok(None);
        };
        if !entry.is_expired_at(now) {
            entry.touch(now);
            return Ok(Some(entry.value.clone()));
        }
        map.remove(key);
        tracing::trace!(key, "dropped expired entry on read");
        Ok(None)
    }

    fn set(&self, key: &str, value: StoredValue, options: EntryOptions) -> Result<(), StoreError> {
        let entry = Entry::new(value, self.effective_options(options));
        self.map
            .write()
            .map_err(|_| StoreError::Poisoned)?
            .insert(key.to_owned(), entry);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.map.write().map_err(|_| StoreError::Poisoned)?.remove(key);
        Ok(())
    }

    fn contains(&self, key: &str) -> Result<bool, StoreError> {
        let now = SystemTime::now();
        let mut map = self.map.write().map_err(|_| StoreError::Poisoned)?;
        let expired = match map.get(key) {
            Some(entry) => entry.is_expired_at(now),
            None => return Ok(false),
        };
        if expired {
            map.remove(key);
        }
        Ok(!expired)
    }
}
