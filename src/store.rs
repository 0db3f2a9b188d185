use std::any::Any;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use crate::error::StoreError;

/// A type-erased value held by a [`Store`]
pub type StoredValue = Arc<dyn Any + Send + Sync>;

/// Expiration settings forwarded with every write
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntryOptions {
    pub absolute_expiration: Option<SystemTime>,
    pub sliding_expiration: Option<Duration>,
}

impl EntryOptions {
    /// Creates options with neither expiration set
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the absolute expiration
    pub fn with_absolute_expiration(mut self, at: SystemTime) -> Self {
        self.absolute_expiration = Some(at);
        self
    }

    /// Sets the sliding expiration
    pub fn with_sliding_expiration(mut self, within: Duration) -> Self {
        self.sliding_expiration = Some(within);
        self
    }

    /// True when neither expiration is set and the store default applies
    pub fn is_empty(&self) -> bool {
        self.absolute_expiration.is_none() && self.sliding_expiration.is_none()
    }
}

/// The key-value store with expiration that entries read through.
///
/// Implementations own thread-safety; callers perform no locking of their own,
/// so a lookup followed by a write is not atomic.
pub trait Store: Send + Sync {
    /// Returns the live value under `key`, if any
    fn try_get(&self, key: &str) -> Result<Option<StoredValue>, StoreError>;

    /// Writes `value` under `key`, replacing any previous entry
    fn set(&self, key: &str, value: StoredValue, options: EntryOptions) -> Result<(), StoreError>;

    /// Removes the entry under `key`, doing nothing if it is absent
    fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// True iff `key` currently maps to an unexpired entry
    fn contains(&self, key: &str) -> Result<bool, StoreError>;
}
