//! Response cache and circuit breaker: process-wide values owned by the
//! service root and injected into the pipeline, never discovered through
//! static singletons.

pub mod breaker;
pub mod response_cache;

pub use breaker::{BreakerRegistry, BreakerStateKind, CircuitBreaker};
pub use response_cache::{CacheEntry, CacheStats, ResponseCache};
