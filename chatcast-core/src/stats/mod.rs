//! Per-channel chat statistics: pluggable stores behind one contract,
//! wrapped by an aggregator that adds rate limiting and snapshot caching.

mod aggregator;
mod memory;
mod redis;
mod store;

pub use aggregator::StatsAggregator;
pub use memory::MemoryStore;
pub use redis::RedisStore;
pub use store::{NoopStore, StatsStore};
