use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use crate::error::{BoxError, CacheError};
use crate::key::resolve_key;
use crate::store::{EntryOptions, Store, StoredValue};

type Produced<T> = Result<Option<T>, BoxError>;
type ProducerFuture<T> = Pin<Box<dyn Future<Output = Produced<T>> + Send>>;

/// Stored in place of a value when a `None` result is cached
#[derive(Debug, Clone, Copy)]
pub struct CachedNull;

/// The function that builds a value on a cache miss
pub enum Producer<T> {
    Sync(Box<dyn FnOnce() -> Produced<T> + Send>),
    Async(Box<dyn FnOnce() -> ProducerFuture<T> + Send>),
}

/// Configuration of a single cache entry for values of type `T`, plus the
/// operations that read through the store with it.
///
/// Setters consume and return the settings so calls can be chained. Reads
/// consume the settings; presence checks and invalidation only borrow them.
pub struct EntrySettings<T> {
    store: Arc<dyn Store>,
    key: Option<String>,
    use_hashed_keys: bool,
    allow_null_values: bool,
    absolute_expiration: Option<SystemTime>,
    sliding_expiration: Option<Duration>,
    producer: Option<Producer<T>>,
    on_miss: Option<Box<dyn FnOnce() + Send>>,
}

impl<T> EntrySettings<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub(crate) fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            key: None,
            use_hashed_keys: false,
            allow_null_values: false,
            absolute_expiration: None,
            sliding_expiration: None,
            producer: None,
            on_miss: None,
        }
    }

    /// Indicates if `None` results from the producer are written to the cache
    pub fn allow_null_values_in_cache(mut self, value: bool) -> Self {
        self.allow_null_values = value;
        self
    }

    /// Controls whether keys are used as given or hashed. The key is resolved
    /// inside [`with_key`](Self::with_key), so this must be set before it.
    pub fn use_hashed_keys(mut self, value: bool) -> Self {
        self.use_hashed_keys = value;
        self
    }

    /// Sets the cache key, scoped to the type `T`
    pub fn with_key(mut self, key: impl AsRef<str>) -> Self {
        let resolved = resolve_key::<T>(key.as_ref(), self.use_hashed_keys);
        tracing::trace!(key = %resolved, hashed = self.use_hashed_keys, "resolved cache key");
        self.key = Some(resolved);
        self
    }

    /// Sets the cache key from parts concatenated in order
    pub fn with_keys<I>(self, parts: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let raw = parts.into_iter().fold(String::new(), |mut acc, part| {
            acc.push_str(part.as_ref());
            acc
        });
        self.with_key(raw)
    }

    /// Sets a sliding expiration for the entry
    pub fn expires_within(mut self, sliding: Duration) -> Self {
        self.sliding_expiration = Some(sliding);
        self
    }

    /// Sets an absolute expiration for the entry
    pub fn expires_at(mut self, at: SystemTime) -> Self {
        self.absolute_expiration = Some(at);
        self
    }

    /// Builds the value with `producer` when it is missing. Returning `None`
    /// (for producers of `Option<T>`) means there is no value.
    pub fn build_value_from<F, R>(mut self, producer: F) -> Self
    where
        F: FnOnce() -> R + Send + 'static,
        R: Into<Option<T>>,
    {
        self.producer = Some(Producer::Sync(Box::new(move || -> Produced<T> {
            Ok(producer().into())
        })));
        self
    }

    /// Like [`build_value_from`](Self::build_value_from) for producers that
    /// can fail. Their error is returned as [`CacheError::Producer`].
    pub fn try_build_value_from<F, R, E>(mut self, producer: F) -> Self
    where
        F: FnOnce() -> Result<R, E> + Send + 'static,
        R: Into<Option<T>>,
        E: Into<BoxError>,
    {
        self.producer = Some(Producer::Sync(Box::new(move || -> Produced<T> {
            producer().map(Into::into).map_err(Into::into)
        })));
        self
    }

    /// Builds the value with an async `producer` when it is missing
    pub fn build_value_from_async<F, Fut, R>(mut self, producer: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: Into<Option<T>>,
    {
        self.producer = Some(Producer::Async(Box::new(move || -> ProducerFuture<T> {
            Box::pin(async move {
                let value: Produced<T> = Ok(producer().await.into());
                value
            })
        })));
        self
    }

    /// Like [`build_value_from_async`](Self::build_value_from_async) for
    /// producers that can fail. Their error is returned as [`CacheError::Producer`].
    pub fn try_build_value_from_async<F, Fut, R, E>(mut self, producer: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<R, E>> + Send + 'static,
        R: Into<Option<T>>,
        E: Into<BoxError>,
    {
        self.producer = Some(Producer::Async(Box::new(move || -> ProducerFuture<T> {
            Box::pin(async move {
                let value: Produced<T> = producer().await.map(Into::into).map_err(Into::into);
                value
            })
        })));
        self
    }

    /// Sets an action to run when the value is not found in the cache
    pub fn on_cache_miss<F>(mut self, action: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.on_miss = Some(Box::new(action));
        self
    }

    /// The resolved key, once one has been set
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// The expiration forwarded with every write
    pub fn entry_options(&self) -> EntryOptions {
        EntryOptions {
            absolute_expiration: self.absolute_expiration,
            sliding_expiration: self.sliding_expiration,
        }
    }

    /// Determines if the key is in the cache. An unset key is never present
    pub fn is_in_cache(&self) -> Result<bool, CacheError> {
        match self.key.as_deref() {
            Some(key) => Ok(self.store.contains(key)?),
            None => Ok(false),
        }
    }

    /// Removes the entry from the cache if it is there
    pub fn invalidate_cache(&self) -> Result<(), CacheError> {
        let Some(key) = self.key.as_deref() else {
            return Ok(());
        };
        if self.store.contains(key)? {
            self.store.remove(key)?;
            tracing::debug!(key, "invalidated cache entry");
        }
        Ok(())
    }

    /// Gets the value from the cache, building and storing it on a miss.
    ///
    /// No locking happens between the lookup and the write: concurrent misses
    /// on the same key each run their producer and the last write wins.
    pub fn get_from_cache(mut self) -> Result<Option<T>, CacheError> {
        let key = self.require_key()?;
        if let Some(value) = self.lookup(&key)? {
            return Ok(value);
        }

        let producer = match self.producer.take() {
            Some(Producer::Sync(producer)) => producer,
            Some(Producer::Async(_)) => return Err(CacheError::SyncProducerRequired),
            None => return Err(CacheError::MissingProducer),
        };
        self.notify_miss(&key);

        let value = producer().map_err(CacheError::Producer)?;
        self.populate(&key, value)
    }

    /// Async variant of [`get_from_cache`](Self::get_from_cache). Only the
    /// producer is awaited; a sync producer is run inline.
    pub async fn get_from_cache_async(mut self) -> Result<Option<T>, CacheError> {
        let key = self.require_key()?;
        if let Some(value) = self.lookup(&key)? {
            return Ok(value);
        }

        let producer = self.producer.take().ok_or(CacheError::MissingProducer)?;
        self.notify_miss(&key);

        let value = match producer {
            Producer::Sync(producer) => producer(),
            Producer::Async(producer) => producer().await,
        }
        .map_err(CacheError::Producer)?;
        self.populate(&key, value)
    }

    fn require_key(&self) -> Result<String, CacheError> {
        match self.key.as_deref() {
            Some(key) if !key.is_empty() => Ok(key.to_owned()),
            _ => Err(CacheError::MissingKey),
        }
    }

    /// `Some(value)` on a hit, where `value` is `None` for a cached null
    fn lookup(&self, key: &str) -> Result<Option<Option<T>>, CacheError> {
        let Some(stored) = self.store.try_get(key)? else {
            return Ok(None);
        };
        let value = if let Some(value) = stored.downcast_ref::<T>() {
            Some(value.clone())
        } else if stored.is::<CachedNull>() {
            None
        } else {
            return Err(CacheError::TypeMismatch { key: key.to_owned() });
        };
        tracing::debug!(key, "cache hit");
        Ok(Some(value))
    }

    fn notify_miss(&mut self, key: &str) {
        tracing::debug!(key, "cache miss");
        if let Some(on_miss) = self.on_miss.take() {
            on_miss();
        }
    }

    fn populate(&self, key: &str, value: Option<T>) -> Result<Option<T>, CacheError> {
        if value.is_none() && !self.allow_null_values {
            tracing::debug!(key, "producer returned no value, not caching");
            return Ok(None);
        }
        let options = self.entry_options();
        let stored: StoredValue = match &value {
            Some(value) => Arc::new(value.clone()),
            None => Arc::new(CachedNull),
        };
        self.store.set(key, stored, options)?;
        tracing::debug!(
            key,
            absolute = ?options.absolute_expiration,
            sliding = ?options.sliding_expiration,
            "cached value"
        );
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    fn settings<T: Clone + Send + Sync + 'static>() -> EntrySettings<T> {
        EntrySettings::new(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn test_hashing_must_precede_key() {
        let late = settings::<String>().with_key("k").use_hashed_keys(true);
        assert_eq!(late.key(), Some(resolve_key::<String>("k", false).as_str()));

        let early = settings::<String>().use_hashed_keys(true).with_key("k");
        assert_eq!(early.key(), Some(resolve_key::<String>("k", true).as_str()));
    }

    #[test]
    fn test_with_keys_concatenates_in_order() {
        let parts = settings::<String>().with_keys(["user:", "42"]);
        let whole = settings::<String>().with_key("user:42");
        assert_eq!(parts.key(), whole.key());

        let reversed = settings::<String>().with_keys(["42", "user:"]);
        assert_ne!(reversed.key(), whole.key());
    }

    #[test]
    fn test_entry_options_omit_unset() {
        let entry = settings::<String>().with_key("k");
        assert!(entry.entry_options().is_empty());

        let entry = entry.expires_within(Duration::from_secs(3));
        assert_eq!(entry.entry_options().sliding_expiration, Some(Duration::from_secs(3)));
        assert_eq!(entry.entry_options().absolute_expiration, None);
    }

    #[test]
    fn test_blocking_read_rejects_async_producer() {
        let result = settings::<String>()
            .with_key("k")
            .build_value_from_async(|| async { "v".to_string() })
            .get_from_cache();

        assert!(matches!(result, Err(CacheError::SyncProducerRequired)));
    }

    #[test]
    fn test_missing_producer() {
        let result = settings::<String>().with_key("k").get_from_cache();
        assert!(matches!(result, Err(CacheError::MissingProducer)));
    }

    #[test]
    fn test_async_read_runs_sync_producer() {
        let value = tokio_test::block_on(
            settings::<String>()
                .with_key("k")
                .build_value_from(|| "v".to_string())
                .get_from_cache_async(),
        )
        .unwrap();
        assert_eq!(value.as_deref(), Some("v"));
    }

    #[test]
    fn test_null_stored_as_marker_and_read_back() {
        let store = Arc::new(MemoryStore::new());
        let entry = EntrySettings::<u32>::new(store.clone())
            .with_key("empty")
            .allow_null_values_in_cache(true);
        let key = entry.key().unwrap().to_owned();

        let value = entry.build_value_from(|| None::<u32>).get_from_cache().unwrap();
        assert_eq!(value, None);
        assert!(store.try_get(&key).unwrap().unwrap().is::<CachedNull>());

        let value = EntrySettings::<u32>::new(store.clone())
            .with_key("empty")
            .build_value_from(|| 1u32)
            .get_from_cache()
            .unwrap();
        assert_eq!(value, None);
    }
}
