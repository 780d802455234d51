//! Latency windows for the stages of the `/ask` pipeline, plus the id that
//! tags each request's tracing span.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::Serialize;
use uuid::Uuid;

/// Random per-request id carried as the `request_id` span field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Timed pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Classify,
    Compose,
    /// The whole request, classification included.
    Request,
}

impl Stage {
    pub const ALL: [Stage; 3] = [Stage::Classify, Stage::Compose, Stage::Request];

    /// Key under which the stage is reported by `/metrics`.
    pub fn metric_name(self) -> &'static str {
        match self {
            Stage::Classify => "t_classify",
            Stage::Compose => "t_compose",
            Stage::Request => "t_request",
        }
    }
}

/// Latest `limit` durations of one stage, oldest first.
struct Window {
    samples: VecDeque<Duration>,
    limit: usize,
}

impl Window {
    fn new(limit: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(limit),
            limit,
        }
    }

    fn push(&mut self, elapsed: Duration) {
        if self.samples.len() == self.limit {
            self.samples.pop_front();
        }
        self.samples.push_back(elapsed);
    }

    /// Nearest-rank percentile; None for an empty window.
    fn percentile(&self, p: f64) -> Option<Duration> {
        if self.samples.is_empty() {
            return None;
        }
        let mut sorted: Vec<Duration> = self.samples.iter().copied().collect();
        sorted.sort_unstable();
        let rank = ((p / 100.0) * sorted.len() as f64).ceil() as usize;
        Some(sorted[rank.clamp(1, sorted.len()) - 1])
    }
}

/// Started by [`MetricsRegistry::start`]; records its stage when stopped.
pub struct StageTimer {
    stage: Stage,
    started: Instant,
    registry: Arc<MetricsRegistry>,
}

impl StageTimer {
    pub fn stop(self) -> Duration {
        let elapsed = self.started.elapsed();
        self.registry.observe(self.stage, elapsed);
        elapsed
    }
}

pub struct MetricsRegistry {
    windows: Mutex<HashMap<Stage, Window>>,
    window_len: usize,
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::with_window(1024)
    }

    /// Keep the last `window_len` samples per stage (at least one).
    pub fn with_window(window_len: usize) -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            window_len: window_len.max(1),
        }
    }

    pub fn observe(&self, stage: Stage, elapsed: Duration) {
        self.windows
            .lock()
            .entry(stage)
            .or_insert_with(|| Window::new(self.window_len))
            .push(elapsed);
    }

    pub fn start(self: &Arc<Self>, stage: Stage) -> StageTimer {
        StageTimer {
            stage,
            started: Instant::now(),
            registry: Arc::clone(self),
        }
    }

    pub fn percentile(&self, stage: Stage, p: f64) -> Option<Duration> {
        self.windows.lock().get(&stage)?.percentile(p)
    }

    /// p50/p95/p99 in microseconds for every stage observed so far.
    pub fn summary(&self) -> BTreeMap<&'static str, StageSummary> {
        let windows = self.windows.lock();
        let micros = |w: &Window, p| w.percentile(p).map_or(0, |d| d.as_micros() as u64);
        Stage::ALL
            .iter()
            .filter_map(|&stage| {
                let w = windows.get(&stage)?;
                Some((
                    stage.metric_name(),
                    StageSummary {
                        count: w.samples.len(),
                        p50_us: micros(w, 50.0),
                        p95_us: micros(w, 95.0),
                        p99_us: micros(w, 99.0),
                    },
                ))
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageSummary {
    pub count: usize,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn us(v: u64) -> Duration {
        Duration::from_micros(v)
    }

    #[test]
    fn nearest_rank_percentiles() {
        let registry = MetricsRegistry::new();
        for v in 1..=100 {
            registry.observe(Stage::Compose, us(v));
        }
        assert_eq!(registry.percentile(Stage::Compose, 50.0), Some(us(50)));
        assert_eq!(registry.percentile(Stage::Compose, 99.0), Some(us(99)));
        assert_eq!(registry.percentile(Stage::Compose, 0.0), Some(us(1)));
        assert_eq!(registry.percentile(Stage::Classify, 50.0), None);

        let summary = &registry.summary()["t_compose"];
        assert_eq!(summary.count, 100);
        assert_eq!(summary.p95_us, 95);
    }

    #[test]
    fn window_drops_oldest_samples() {
        let registry = MetricsRegistry::with_window(2);
        for v in [1, 2, 300] {
            registry.observe(Stage::Request, us(v));
        }
        let summary = &registry.summary()["t_request"];
        assert_eq!(summary.count, 2);
        assert_eq!(summary.p99_us, 300);
        assert_eq!(registry.percentile(Stage::Request, 0.0), Some(us(2)));
    }

    #[test]
    fn summary_lists_only_observed_stages() {
        let registry = Arc::new(MetricsRegistry::new());
        assert!(registry.summary().is_empty());
        registry.start(Stage::Classify).stop();
        let names: Vec<&str> = registry.summary().keys().copied().collect();
        assert_eq!(names, vec!["t_classify"]);
    }

    #[test]
    fn request_ids_are_distinct_uuids() {
        let a = RequestId::new().to_string();
        assert_eq!(a.len(), 36);
        assert_ne!(a, RequestId::new().to_string());
    }
}
