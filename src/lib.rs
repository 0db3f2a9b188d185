//! A fluent, type-scoped read-through facade over an expiring in-process cache
//!
//! A [`CacheBuilder`] hands out [`EntrySettings`] for a value type. Each one is
//! configured with a key, an expiration and a value producer, then asked for
//! the value: a hit returns what is stored, a miss runs the producer and
//! writes its result to the underlying [`Store`].
//!
//! ```
//! use fluent_cache::CacheBuilder;
//! use std::time::Duration;
//!
//! #[derive(Clone)]
//! struct User {
//!     id: u32,
//! }
//!
//! let cache = CacheBuilder::in_memory();
//! let user = cache
//!     .for_type::<User>()
//!     .with_key("user:42")
//!     .expires_within(Duration::from_secs(60))
//!     .build_value_from(|| User { id: 42 })
//!     .get_from_cache()
//!     .unwrap();
//! assert_eq!(user.map(|u| u.id), Some(42));
//! ```

pub mod builder;
pub mod error;
pub mod key;
pub mod memory;
pub mod settings;
pub mod store;

pub use builder::CacheBuilder;
pub use error::{BoxError, CacheError, StoreError};
pub use memory::{MemoryStore, MemoryStoreConfig};
pub use settings::{CachedNull, EntrySettings, Producer};
pub use store::{EntryOptions, Store, StoredValue};
