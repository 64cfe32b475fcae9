//! Per-endpoint request counters and Prometheus text exposition.
//!
//! The registry is constructed once and shared through the router state.
//! Counters are atomics inside a concurrent map, so simultaneous requests to
//! the same endpoint never lose an increment.

use std::fmt::Write as _;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Instant;

use dashmap::DashMap;

// === Metric Name Constants ===

/// Requests by endpoint counter metric name.
pub const METRIC_REQUESTS_TOTAL: &str = "unison_io_vision_requests_total";
/// Uptime gauge metric name.
pub const METRIC_UPTIME_SECONDS: &str = "unison_io_vision_uptime_seconds";

/// Content type of the exposition.
pub const EXPOSITION_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

#[derive(Debug)]
struct EndpointCounter {
    /// Position of first observation, used to keep render order stable.
    seq: usize,
    count: AtomicU64,
}

/// Process-lifetime request counters keyed by endpoint path.
#[derive(Debug)]
pub struct EndpointMetrics {
    counters: DashMap<String, EndpointCounter>,
    next_seq: AtomicUsize,
    started: Instant,
}

impl EndpointMetrics {
    /// Create an empty registry; uptime is measured from this call.
    pub fn new() -> Self {
        Self {
            counters: DashMap::new(),
            next_seq: AtomicUsize::new(0),
            started: Instant::now(),
        }
    }

    /// Count one handled request for `endpoint`.
    pub fn increment(&self, endpoint: &str) {
        if let Some(counter) = self.counters.get(endpoint) {
            counter.count.fetch_add(1, Ordering::Relaxed);
            return;
        }

        // Slow path: first request for this endpoint. The entry holds the
        // shard lock, so two racing first requests create a single counter.
        self.counters
            .entry(endpoint.to_string())
            .or_insert_with(|| EndpointCounter {
                seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
                count: AtomicU64::new(0),
            })
            .count
            .fetch_add(1, Ordering::Relaxed);
    }

    /// Current count for `endpoint`, 0 if never observed.
    pub fn count(&self, endpoint: &str) -> u64 {
        self.counters
            .get(endpoint)
            .map(|c| c.count.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Seconds since the registry was created.
    pub fn uptime_seconds(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    /// Endpoints with their counts, in order of first observation.
    pub fn snapshot(&self) -> Vec<(String, u64)> {
        let mut entries: Vec<(usize, String, u64)> = self
            .counters
            .iter()
            .map(|entry| {
                (
                    entry.value().seq,
                    entry.key().clone(),
                    entry.value().count.load(Ordering::Relaxed),
                )
            })
            .collect();
        entries.sort_by_key(|(seq, _, _)| *seq);
        entries
            .into_iter()
            .map(|(_, endpoint, count)| (endpoint, count))
            .collect()
    }

    /// Render the Prometheus text exposition.
    pub fn render(&self) -> String {
        let mut out = String::new();

        // Writing to a String cannot fail.
        let _ = writeln!(
            out,
            "# HELP {METRIC_REQUESTS_TOTAL} Total number of requests by endpoint"
        );
        let _ = writeln!(out, "# TYPE {METRIC_REQUESTS_TOTAL} counter");
        for (endpoint, count) in self.snapshot() {
            let _ = writeln!(
                out,
                "{METRIC_REQUESTS_TOTAL}{{endpoint=\"{endpoint}\"}} {count}"
            );
        }

        out.push('\n');
        let _ = writeln!(out, "# HELP {METRIC_UPTIME_SECONDS} Service uptime in seconds");
        let _ = writeln!(out, "# TYPE {METRIC_UPTIME_SECONDS} gauge");
        let _ = writeln!(out, "{METRIC_UPTIME_SECONDS} {}", self.uptime_seconds());

        out
    }
}

impl Default for EndpointMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract the value of the uptime gauge from a rendered exposition.
#[cfg(test)]
pub(crate) fn parse_uptime(exposition: &str) -> Option<f64> {
    exposition.lines().find_map(|line| {
        line.strip_prefix(METRIC_UPTIME_SECONDS)
            .and_then(|rest| rest.strip_prefix(' '))
            .and_then(|value| value.trim().parse().ok())
    })
}
