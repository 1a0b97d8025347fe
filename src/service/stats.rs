//! S3: connection/read/write/success/not-found/bad/stats counters with
//! rolling 1s/10s/60s min/max/average windows.
//!
//! Totals are lock-free (`AtomicU64`); only the per-second bucket ring
//! buffers take a lock, and only the housekeeping thread that rotates them
//! once a second ever holds it for more than a read (`SPEC_FULL.md` §4.9).

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

const BUCKET_CAPACITY: usize = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CounterKind {
    Connections,
    Reads,
    Writes,
    Success,
    NotFound,
    Bad,
    Stats,
}

impl CounterKind {
    pub const ALL: [CounterKind; 7] = [
        CounterKind::Connections,
        CounterKind::Reads,
        CounterKind::Writes,
        CounterKind::Success,
        CounterKind::NotFound,
        CounterKind::Bad,
        CounterKind::Stats,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Connections => "connections",
            Self::Reads => "reads",
            Self::Writes => "writes",
            Self::Success => "success",
            Self::NotFound => "not_found",
            Self::Bad => "bad",
            Self::Stats => "stats",
        }
    }
}

/// One counter's running total plus a 60-bucket ring of per-second deltas,
/// which covers all three of the 1s/10s/60s windows at once.
#[derive(Debug)]
pub struct Counter {
    total: AtomicU64,
    current_second: AtomicU64,
    buckets: Mutex<VecDeque<u64>>,
}

impl Default for Counter {
    fn default() -> Self {
        Self {
            total: AtomicU64::new(0),
            current_second: AtomicU64::new(0),
            buckets: Mutex::new(VecDeque::with_capacity(BUCKET_CAPACITY)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "with-serde", derive(serde::Serialize))]
pub struct WindowStats {
    pub min: u64,
    pub max: u64,
    pub average: f64,
}

impl Counter {
    pub fn increment(&self) {
        self.total.fetch_add(1, Ordering::Relaxed);
        self.current_second.fetch_add(1, Ordering::Relaxed);
    }

    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    /// Called once per second by the server's housekeeping loop: closes out
    /// the in-progress second into the ring buffer, dropping buckets older
    /// than the largest window (60s).
    pub fn rotate(&self) {
        let closed = self.current_second.swap(0, Ordering::Relaxed);
        let mut buckets = self.buckets.lock().expect("stats bucket lock poisoned");
        buckets.push_back(closed);
        while buckets.len() > BUCKET_CAPACITY {
            buckets.pop_front();
        }
    }

    /// Min/max/average over the trailing `window_secs` buckets (clamped to
    /// however much history exists so far).
    pub fn window(&self, window_secs: usize) -> WindowStats {
        let buckets = self.buckets.lock().expect("stats bucket lock poisoned");
        let take = window_secs.min(buckets.len());
        if take == 0 {
            return WindowStats {
                min: 0,
                max: 0,
                average: 0.0,
            };
        }
        let slice: Vec<u64> = buckets.iter().rev().take(take).copied().collect();
        let min = *slice.iter().min().unwrap();
        let max = *slice.iter().max().unwrap();
        let sum: u64 = slice.iter().sum();
        WindowStats {
            min,
            max,
            average: sum as f64 / slice.len() as f64,
        }
    }
}

/// The complete set of seven counters named in `spec.md` §6.
#[derive(Debug, Default)]
pub struct Stats {
    connections: Counter,
    reads: Counter,
    writes: Counter,
    success: Counter,
    not_found: Counter,
    bad: Counter,
    stats: Counter,
}

impl Stats {
    pub fn counter(&self, kind: CounterKind) -> &Counter {
        match kind {
            CounterKind::Connections => &self.connections,
            CounterKind::Reads => &self.reads,
            CounterKind::Writes => &self.writes,
            CounterKind::Success => &self.success,
            CounterKind::NotFound => &self.not_found,
            CounterKind::Bad => &self.bad,
            CounterKind::Stats => &self.stats,
        }
    }

    pub fn record(&self, kind: CounterKind) {
        self.counter(kind).increment();
    }

    /// Called once per second by the housekeeping loop.
    pub fn rotate_all(&self) {
        for kind in CounterKind::ALL {
            self.counter(kind).rotate();
        }
    }

    /// Renders the `stats` administrative command's human-readable body.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for kind in CounterKind::ALL {
            let counter = self.counter(kind);
            let w1 = counter.window(1);
            let w10 = counter.window(10);
            let w60 = counter.window(60);
            out.push_str(&format!(
                "{}: total={} 1s[min={} max={} avg={:.2}] 10s[min={} max={} avg={:.2}] 60s[min={} max={} avg={:.2}]\n",
                kind.name(),
                counter.total(),
                w1.min, w1.max, w1.average,
                w10.min, w10.max, w10.average,
                w60.min, w60.max, w60.average,
            ));
        }
        out
    }

    /// Renders the `jstats` administrative command's JSON body
    /// (`with-serde` only, matching `mailcheck_lib`'s `--spec-json` gating).
    #[cfg(feature = "with-serde")]
    pub fn render_json(&self) -> serde_json::Value {
        use serde_json::json;
        let mut counters = serde_json::Map::new();
        for kind in CounterKind::ALL {
            let counter = self.counter(kind);
            counters.insert(
                kind.name().to_string(),
                json!({
                    "total": counter.total(),
                    "1s": counter.window(1),
                    "10s": counter.window(10),
                    "60s": counter.window(60),
                }),
            );
        }
        serde_json::Value::Object(counters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increments_and_totals() {
        let stats = Stats::default();
        stats.record(CounterKind::Connections);
        stats.record(CounterKind::Connections);
        assert_eq!(stats.counter(CounterKind::Connections).total(), 2);
    }

    #[test]
    fn rotation_feeds_window() {
        let counter = Counter::default();
        counter.increment();
        counter.increment();
        counter.rotate();
        counter.increment();
        counter.rotate();
        let w = counter.window(60);
        assert_eq!(w.max, 2);
        assert_eq!(w.min, 1);
        assert!((w.average - 1.5).abs() < 1e-9);
    }

    #[test]
    fn window_caps_at_bucket_capacity() {
        let counter = Counter::default();
        for _ in 0..(BUCKET_CAPACITY + 10) {
            counter.increment();
            counter.rotate();
        }
        let w = counter.window(60);
        assert_eq!(w.min, 1);
        assert_eq!(w.max, 1);
    }
}
