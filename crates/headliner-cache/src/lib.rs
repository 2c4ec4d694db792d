// In-memory response caching layer
// Keeps repeat feed loads off the network for a few minutes

pub mod cache;

pub use cache::{CacheEntry, ExpiringCache, DEFAULT_CAPACITY, DEFAULT_TTL};
