// Cache module.
// TTL-bounded key-value caching for API responses, in memory or on the local filesystem.

pub mod backend;
pub mod paths;
pub mod store;

pub use backend::{CacheBackend, FileBackend, MemoryBackend};
pub use store::{CacheEntry, DEFAULT_TTL, KEY_PREFIX, Lookup, TtlCache};
