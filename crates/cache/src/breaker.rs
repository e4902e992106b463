//! Circuit breaker: one instance per named downstream dependency.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerStateKind {
    Closed,
    Open,
    HalfOpen,
}

struct Inner {
    state: BreakerStateKind,
    failure_count: u32,
    opened_at: Option<Instant>,
    threshold: u32,
    reset_timeout: Duration,
}

/// A single named circuit breaker. Cheaply `Clone`-able.
#[derive(Clone)]
pub struct CircuitBreaker {
    name: String,
    inner: Arc<Mutex<Inner>>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, threshold: u32, reset_timeout: Duration) -> Self {
        Self {
            name: name.into(),
            inner: Arc::new(Mutex::new(Inner {
                state: BreakerStateKind::Closed,
                failure_count: 0,
                opened_at: None,
                threshold,
                reset_timeout,
            })),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `true` when a call should be attempted. Transitions `open` to
    /// `half_open` if `reset_timeout` has elapsed, allowing exactly the
    /// caller's next call through as a probe.
    pub fn allow(&self) -> bool {
        let mut inner = self.inner.lock();
        match inner.state {
            BreakerStateKind::Closed | BreakerStateKind::HalfOpen => true,
            BreakerStateKind::Open => {
                let elapsed = inner
                    .opened_at
                    .map(|t| t.elapsed() >= inner.reset_timeout)
                    .unwrap_or(false);
                if elapsed {
                    inner.state = BreakerStateKind::HalfOpen;
                    true
                } else {
                    false
                }
            }
        }
    }

    pub fn record_success(&self) {
        let mut inner = self.inner.lock();
        match inner.state {
            BreakerStateKind::Closed => {
                inner.failure_count = 0;
            }
            BreakerStateKind::HalfOpen => {
                inner.state = BreakerStateKind::Closed;
                inner.failure_count = 0;
                inner.opened_at = None;
            }
            BreakerStateKind::Open => {}
        }
    }

    pub fn record_failure(&self) {
        let mut inner = self.inner.lock();
        match inner.state {
            BreakerStateKind::Closed => {
                inner.failure_count += 1;
                if inner.failure_count >= inner.threshold {
                    inner.state = BreakerStateKind::Open;
                    inner.opened_at = Some(Instant::now());
                }
            }
            BreakerStateKind::HalfOpen => {
                inner.state = BreakerStateKind::Open;
                inner.opened_at = Some(Instant::now());
            }
            BreakerStateKind::Open => {}
        }
    }

    pub fn state(&self) -> BreakerStateKind {
        self.inner.lock().state
    }
}

/// Owns one `CircuitBreaker` per named dependency (e.g. `"pipeline"`,
/// `"llm"`), created lazily on first access with shared defaults.
#[derive(Clone)]
pub struct BreakerRegistry {
    threshold: u32,
    reset_timeout: Duration,
    breakers: Arc<Mutex<HashMap<String, CircuitBreaker>>>,
}

impl BreakerRegistry {
    pub fn new(threshold: u32, reset_timeout: Duration) -> Self {
        Self {
            threshold,
            reset_timeout,
            breakers: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn get(&self, name: &str) -> CircuitBreaker {
        let mut breakers = self.breakers.lock();
        breakers
            .entry(name.to_string())
            .or_insert_with(|| CircuitBreaker::new(name, self.threshold, self.reset_timeout))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_allows_calls() {
        let b = CircuitBreaker::new("llm", 5, Duration::from_secs(60));
        assert!(b.allow());
        assert_eq!(b.state(), BreakerStateKind::Closed);
    }

    #[test]
    fn opens_after_threshold_failures() {
        let b = CircuitBreaker::new("llm", 3, Duration::from_secs(60));
        for _ in 0..3 {
            b.record_failure();
        }
        assert_eq!(b.state(), BreakerStateKind::Open);
        assert!(!b.allow());
    }

    #[test]
    fn success_in_closed_resets_failure_count() {
        let b = CircuitBreaker::new("llm", 3, Duration::from_secs(60));
        b.record_failure();
        b.record_failure();
        b.record_success();
        b.record_failure();
        b.record_failure();
        assert_eq!(b.state(), BreakerStateKind::Closed);
    }

    #[test]
    fn half_open_success_closes_and_failure_reopens() {
        let b = CircuitBreaker::new("llm", 1, Duration::from_millis(0));
        b.record_failure();
        assert_eq!(b.state(), BreakerStateKind::Open);
        assert!(b.allow());
        assert_eq!(b.state(), BreakerStateKind::HalfOpen);
        b.record_success();
        assert_eq!(b.state(), BreakerStateKind::Closed);

        b.record_failure();
        assert!(b.allow());
        assert_eq!(b.state(), BreakerStateKind::HalfOpen);
        b.record_failure();
        assert_eq!(b.state(), BreakerStateKind::Open);
    }

    #[test]
    fn registry_reuses_breaker_per_name() {
        let registry = BreakerRegistry::new(5, Duration::from_secs(60));
        let a = registry.get("pipeline");
        a.record_failure();
        let b = registry.get("pipeline");
        assert_eq!(b.state(), BreakerStateKind::Closed);
        for _ in 0..4 {
            b.record_failure();
        }
        assert_eq!(registry.get("pipeline").state(), BreakerStateKind::Open);
    }
}
