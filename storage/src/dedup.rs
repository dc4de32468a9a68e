//! Metadata deduplication
//!
//! Tracks which span names have already been published for each service,
//! so the span-services topic receives each `(service, span name)` pair
//! once instead of once per span.
//!
//! Check-and-record is a single operation under one lock: two callers
//! racing on the same unseen pair cannot both be told to publish.
//!
//! # Memory Behavior
//!
//! [`ServiceSpanNames`] never forgets a pair. It grows with the number of
//! distinct span names and stays stale if a pair is ever removed from the
//! log downstream. [`ExpiringSpanNames`] bounds this by republishing pairs
//! after a TTL.

use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

/// Decides whether a `(service, span name)` pair still needs publishing
pub trait MetadataCache: Send + Sync {
    /// Returns `true` if the pair has not been published yet, and records
    /// it as published in the same step.
    fn should_publish(&self, service_name: &str, span_name: &str) -> bool;

    /// Number of tracked pairs
    fn len(&self) -> usize;

    /// Whether no pair is tracked
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Unbounded service → span-names map, kept for the life of the process
#[derive(Default)]
pub struct ServiceSpanNames {
    services: Mutex<HashMap<String, HashSet<String>>>,
}

impl ServiceSpanNames {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Span names already published for `service_name`
    ///
    /// Returns a snapshot; concurrent callers may add names right after.
    pub fn span_names(&self, service_name: &str) -> HashSet<String> {
        self.services
            .lock()
            .get(service_name)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of services seen
    pub fn service_count(&self) -> usize {
        self.services.lock().len()
    }
}

impl MetadataCache for ServiceSpanNames {
    fn should_publish(&self, service_name: &str, span_name: &str) -> bool {
        let mut services = self.services.lock();
        match services.get_mut(service_name) {
            Some(names) => {
                if names.contains(span_name) {
                    false
                } else {
                    names.insert(span_name.to_string());
                    true
                }
            }
            None => {
                let mut names = HashSet::new();
                names.insert(span_name.to_string());
                services.insert(service_name.to_string(), names);
                true
            }
        }
    }

    fn len(&self) -> usize {
        self.services.lock().values().map(HashSet::len).sum()
    }
}

/// Time-windowed variant: a pair is published again once its TTL expires
///
/// Expired entries are swept every `cleanup_interval` checks, so memory may
/// grow between sweeps.
pub struct ExpiringSpanNames {
    /// (service, span name) -> last published
    seen: Mutex<HashMap<(String, String), Instant>>,
    ttl: Duration,
    ops_since_cleanup: AtomicU32,
    /// Sweep every N checks (minimum 1)
    cleanup_interval: u32,
}

impl ExpiringSpanNames {
    /// Create a cache remembering pairs for `ttl`, sweeping every 1000 checks
    pub fn new(ttl: Duration) -> Self {
        Self::with_cleanup_interval(ttl, 1000)
    }

    /// Create a cache with a custom sweep interval
    pub fn with_cleanup_interval(ttl: Duration, cleanup_interval: u32) -> Self {
        Self {
            seen: Mutex::new(HashMap::new()),
            ttl,
            ops_since_cleanup: AtomicU32::new(0),
            cleanup_interval: cleanup_interval.max(1),
        }
    }

    fn maybe_cleanup(&self, now: Instant) {
        // Only the thread that crossed the threshold resets and sweeps.
        let ops = self.ops_since_cleanup.fetch_add(1, Ordering::Relaxed);
        if ops >= self.cleanup_interval
            && self
                .ops_since_cleanup
                .compare_exchange(ops + 1, 0, Ordering::AcqRel, Ordering::Relaxed)
                .is_ok()
        {
            self.cleanup(now);
        }
    }

    fn cleanup(&self, now: Instant) {
        let mut seen = self.seen.lock();
        let before = seen.len();
        seen.retain(|_, published| now.duration_since(*published) < self.ttl);
        let removed = before - seen.len();
        if removed > 0 {
            tracing::debug!(removed, remaining = seen.len(), "Expired span names swept");
        }
    }
}

impl MetadataCache for ExpiringSpanNames {
    fn should_publish(&self, service_name: &str, span_name: &str) -> bool {
        let now = Instant::now();
        self.maybe_cleanup(now);

        let key = (service_name.to_string(), span_name.to_string());
        let mut seen = self.seen.lock();
        if let Some(published) = seen.get(&key) {
            if now.duration_since(*published) < self.ttl {
                return false;
            }
        }
        seen.insert(key, now);
        true
    }

    fn len(&self) -> usize {
        self.seen.lock().len()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_first_sighting_publishes() {
        let cache = ServiceSpanNames::new();
        assert!(cache.should_publish("svcA", "GET /a"));
        assert!(!cache.should_publish("svcA", "GET /a"));
    }

    #[test]
    fn test_new_name_under_known_service_publishes() {
        let cache = ServiceSpanNames::new();
        assert!(cache.should_publish("svcA", "GET /a"));
        assert!(cache.should_publish("svcA", "GET /b"));
        assert!(!cache.should_publish("svcA", "GET /b"));

        let names = cache.span_names("svcA");
        assert_eq!(names.len(), 2);
        assert!(names.contains("GET /a"));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.service_count(), 1);
    }

    #[test]
    fn test_same_name_under_different_services() {
        let cache = ServiceSpanNames::new();
        assert!(cache.should_publish("svcA", "GET /a"));
        assert!(cache.should_publish("svcB", "GET /a"));
        assert_eq!(cache.service_count(), 2);
    }

    #[test]
    fn test_empty_names_are_tracked() {
        let cache = ServiceSpanNames::new();
        assert!(cache.should_publish("", ""));
        assert!(!cache.should_publish("", ""));
        assert!(cache.span_names("unknown").is_empty());
    }

    #[test]
    fn test_concurrent_first_publish_happens_once() {
        let cache = Arc::new(ServiceSpanNames::new());
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || cache.should_publish("svcA", "GET /a"))
            })
            .collect();

        let published = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|&p| p)
            .count();
        assert_eq!(published, 1, "expected exactly 1 publish, got {published}");
    }

    #[test]
    fn test_concurrent_distinct_names_all_publish() {
        let cache = Arc::new(ServiceSpanNames::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || cache.should_publish("svcA", &format!("op-{i}")))
            })
            .collect();

        assert!(handles.into_iter().all(|h| h.join().unwrap()));
        assert_eq!(cache.len(), 8);
    }

    #[test]
    fn test_expiring_republishes_after_ttl() {
        let cache = ExpiringSpanNames::new(Duration::from_millis(10));
        assert!(cache.should_publish("svcA", "GET /a"));
        assert!(!cache.should_publish("svcA", "GET /a"));

        thread::sleep(Duration::from_millis(15));
        assert!(cache.should_publish("svcA", "GET /a"));
    }

    #[test]
    fn test_expiring_cleanup_sweeps() {
        let cache = ExpiringSpanNames::with_cleanup_interval(Duration::from_millis(5), 10);
        for i in 0..5 {
            cache.should_publish("svcA", &format!("op-{i}"));
        }
        assert_eq!(cache.len(), 5);

        thread::sleep(Duration::from_millis(10));
        for i in 5..20 {
            cache.should_publish("svcA", &format!("op-{i}"));
        }

        assert!(cache.len() < 20, "expected sweep to drop entries, got {}", cache.len());
    }

    #[test]
    fn test_expiring_concurrent_first_publish_happens_once() {
        let cache = Arc::new(ExpiringSpanNames::new(Duration::from_secs(60)));
        let handles: Vec<_> = (0..10)
            .map(|_| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || cache.should_publish("svcA", "GET /a"))
            })
            .collect();

        let published = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|&p| p)
            .count();
        assert_eq!(published, 1);
    }

    #[test]
    fn test_cleanup_interval_minimum() {
        let cache = ExpiringSpanNames::with_cleanup_interval(Duration::from_secs(1), 0);
        assert!(cache.should_publish("svc", "op"));
    }

    #[test]
    fn test_cache_is_object_safe() {
        let cache: Arc<dyn MetadataCache> = Arc::new(ServiceSpanNames::new());
        assert!(cache.is_empty());
        assert!(cache.should_publish("svc", "op"));
        assert!(!cache.is_empty());
    }
}
