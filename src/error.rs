use thiserror::Error;

/// Boxed error produced by value producers and store backends
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised by a store implementation
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cache store lock poisoned")]
    Poisoned,
    #[error(transparent)]
    Backend(BoxError),
}

/// Errors raised by the terminal operations of an entry
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache key must be specified")]
    MissingKey,
    #[error("no value producer configured")]
    MissingProducer,
    #[error("an async value producer cannot be run by a blocking read")]
    SyncProducerRequired,
    #[error("value cached under `{key}` has a different type")]
    TypeMismatch { key: String },
    /// The producer failed; its error is passed through as-is
    #[error(transparent)]
    Producer(BoxError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CacheError {
    /// Returns the producer's own error if that is what failed
    pub fn into_producer_error(self) -> Option<BoxError> {
        match self {
            CacheError::Producer(err) => Some(err),
            _ => None,
        }
    }
}
