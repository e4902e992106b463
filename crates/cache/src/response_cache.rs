//! TTL+LRU response cache keyed by a fingerprint of
//! `(domain, prompt_name, normalized(text))`.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub answer: String,
    pub citations: Vec<advisor_rag_core::Citation>,
    pub quality: advisor_rag_core::Quality,
    pub intent: advisor_rag_core::Intent,
    pub created_at: Instant,
    pub ttl: Duration,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.created_at) >= self.ttl
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub size: usize,
}

struct Slot {
    entry: CacheEntry,
    last_used: u64,
}

struct Inner {
    entries: HashMap<String, Slot>,
    clock: u64,
    stats: CacheStats,
}

/// A fingerprint-keyed TTL+LRU map. Cheaply `Clone`-able (an `Arc` around an
/// internally-locked map) so it can be shared across request-handling tasks
/// without a process-wide singleton.
#[derive(Clone)]
pub struct ResponseCache {
    max_size: usize,
    inner: std::sync::Arc<Mutex<Inner>>,
}

impl ResponseCache {
    pub fn new(max_size: usize) -> Self {
        Self {
            max_size,
            inner: std::sync::Arc::new(Mutex::new(Inner {
                entries: HashMap::new(),
                clock: 0,
                stats: CacheStats::default(),
            })),
        }
    }

    /// Deterministic fingerprint of the fields that constitute cache
    /// identity. Spelling is not corrected; only whitespace is normalised.
    pub fn fingerprint(domain: &str, prompt_name: Option<&str>, text: &str) -> String {
        let normalized = normalize(text);
        format!("{}\u{1}{}\u{1}{}", domain, prompt_name.unwrap_or(""), normalized)
    }

    pub fn get(&self, fingerprint: &str) -> Option<CacheEntry> {
        let now = Instant::now();
        let mut inner = self.inner.lock();
        inner.clock += 1;
        let clock = inner.clock;

        let Some(slot) = inner.entries.get_mut(fingerprint) else {
            inner.stats.misses += 1;
            return None;
        };

        if slot.entry.is_expired(now) {
            inner.entries.remove(fingerprint);
            inner.stats.misses += 1;
            inner.stats.size = inner.entries.len();
            return None;
        }

        slot.last_used = clock;
        let entry = slot.entry.clone();
        inner.stats.hits += 1;
        Some(entry)
    }

    pub fn put(&self, fingerprint: String, entry: CacheEntry) {
        let mut inner = self.inner.lock();
        inner.clock += 1;
        let clock = inner.clock;

        inner.entries.insert(
            fingerprint,
            Slot {
                entry,
                last_used: clock,
            },
        );

        while inner.entries.len() > self.max_size {
            if let Some(lru_key) = inner
                .entries
                .iter()
                .min_by_key(|(_, slot)| slot.last_used)
                .map(|(k, _)| k.clone())
            {
                inner.entries.remove(&lru_key);
                inner.stats.evictions += 1;
            } else {
                break;
            }
        }

        inner.stats.size = inner.entries.len();
    }

    pub fn invalidate(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.stats.size = 0;
    }

    pub fn stats(&self) -> CacheStats {
        self.inner.lock().stats
    }
}

/// Trims, lowercases, and collapses internal whitespace. Never corrects
/// spelling — identical text up to casing/whitespace hits the same entry.
fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use advisor_rag_core::{Intent, Quality};

    fn entry(answer: &str) -> CacheEntry {
        CacheEntry {
            answer: answer.to_string(),
            citations: Vec::new(),
            quality: Quality::Good,
            intent: Intent::General,
            created_at: Instant::now(),
            ttl: Duration::from_secs(60),
        }
    }

    #[test]
    fn normalize_collapses_whitespace_and_case() {
        assert_eq!(normalize("  Hello   World  "), "hello world");
    }

    #[test]
    fn fingerprint_is_stable_for_equivalent_text() {
        let a = ResponseCache::fingerprint("app_education", None, "  Hello World  ");
        let b = ResponseCache::fingerprint("app_education", None, "hello world");
        assert_eq!(a, b);
    }

    #[test]
    fn miss_then_hit() {
        let cache = ResponseCache::new(10);
        let fp = ResponseCache::fingerprint("d", None, "q");
        assert!(cache.get(&fp).is_none());
        cache.put(fp.clone(), entry("answer"));
        let got = cache.get(&fp).unwrap();
        assert_eq!(got.answer, "answer");
        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn expired_entry_is_a_miss() {
        let cache = ResponseCache::new(10);
        let fp = ResponseCache::fingerprint("d", None, "q");
        let mut e = entry("stale");
        e.ttl = Duration::from_millis(0);
        cache.put(fp.clone(), e);
        std::thread::sleep(Duration::from_millis(5));
        assert!(cache.get(&fp).is_none());
    }

    #[test]
    fn evicts_least_recently_used_past_capacity() {
        let cache = ResponseCache::new(2);
        cache.put("a".to_string(), entry("a"));
        cache.put("b".to_string(), entry("b"));
        cache.get("a"); // touch a, making b the LRU
        cache.put("c".to_string(), entry("c"));

        assert!(cache.get("a").is_some());
        assert!(cache.get("b").is_none());
        assert!(cache.get("c").is_some());
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn invalidate_clears_everything() {
        let cache = ResponseCache::new(10);
        cache.put("a".to_string(), entry("a"));
        cache.invalidate();
        assert!(cache.get("a").is_none());
        assert_eq!(cache.stats().size, 0);
    }
}
