//! In-memory rate storage and the background-refreshed rate cache

pub mod memory;
pub mod rate_cache;

pub use memory::{CacheStats, MemoryRateTable};
pub use rate_cache::{ExchangeRateCache, RefreshSummary};
