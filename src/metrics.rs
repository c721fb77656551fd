use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

// Performance Metrics
#[derive(Debug, Default)]
pub struct Metrics {
    fetch_time: AtomicU64,
    render_time: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    failed_draws: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_fetch(&self, duration: Duration) {
        self.fetch_time.fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
    }

    pub fn record_render(&self, duration: Duration) {
        self.render_time.fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed_draws(&self, count: usize) {
        self.failed_draws.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn cache_hits(&self) -> u64 {
        self.cache_hits.load(Ordering::Relaxed)
    }

    pub fn cache_misses(&self) -> u64 {
        self.cache_misses.load(Ordering::Relaxed)
    }

    pub fn failed_draws(&self) -> u64 {
        self.failed_draws.load(Ordering::Relaxed)
    }

    pub fn report(&self) -> String {
        format!(
            "Performance Metrics:\n\
             Fetch Time: {}µs\n\
             Render Time: {}µs\n\
             Cache Hits: {}\n\
             Cache Misses: {}\n\
             Cache Hit Rate: {:.2}%\n\
             Failed Draw Commands: {}",
            self.fetch_time.load(Ordering::Relaxed),
            self.render_time.load(Ordering::Relaxed),
            self.cache_hits(),
            self.cache_misses(),
            self.cache_hit_rate() * 100.0,
            self.failed_draws()
        )
    }

    pub fn cache_hit_rate(&self) -> f64 {
        let hits = self.cache_hits() as f64;
        let misses = self.cache_misses() as f64;
        let total = hits + misses;
        if total > 0.0 {
            hits / total
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_rate() {
        let metrics = Metrics::new();
        assert_eq!(metrics.cache_hit_rate(), 0.0);

        metrics.record_cache_hit();
        metrics.record_cache_hit();
        metrics.record_cache_hit();
        metrics.record_cache_miss();
        assert!((metrics.cache_hit_rate() - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_report_mentions_counters() {
        let metrics = Metrics::new();
        metrics.record_fetch(Duration::from_micros(1500));
        metrics.record_failed_draws(2);
        let report = metrics.report();
        assert!(report.contains("Fetch Time: 1500µs"));
        assert!(report.contains("Failed Draw Commands: 2"));
    }
}
