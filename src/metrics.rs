//! Prediction counters and latency statistics.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::info;

/// Metrics collector for served predictions
pub struct PredictionMetrics {
    /// Successful predictions
    pub predictions_served: AtomicU64,
    /// Requests aborted by a scaling or inference error
    pub predictions_failed: AtomicU64,
    /// Encoded columns dropped by alignment, summed over requests
    pub columns_dropped: AtomicU64,
    /// Failures by error kind
    failures_by_kind: RwLock<HashMap<String, u64>>,
    /// Predictions by class label
    predictions_by_label: RwLock<HashMap<String, u64>>,
    /// Pipeline latency (in microseconds)
    processing_times: RwLock<Vec<u64>>,
    start_time: Instant,
}

impl PredictionMetrics {
    pub fn new() -> Self {
        Self {
            predictions_served: AtomicU64::new(0),
            predictions_failed: AtomicU64::new(0),
            columns_dropped: AtomicU64::new(0),
            failures_by_kind: RwLock::new(HashMap::new()),
            predictions_by_label: RwLock::new(HashMap::new()),
            processing_times: RwLock::new(Vec::with_capacity(1000)),
            start_time: Instant::now(),
        }
    }

    /// Record a successful prediction
    pub fn record_prediction(&self, processing_time: Duration, label: &str, dropped_columns: usize) {
        self.predictions_served.fetch_add(1, Ordering::Relaxed);
        self.columns_dropped
            .fetch_add(dropped_columns as u64, Ordering::Relaxed);

        if let Ok(mut times) = self.processing_times.write() {
            times.push(processing_time.as_micros() as u64);
            // Keep only the most recent samples
            if times.len() > 10000 {
                times.drain(0..5000);
            }
        }

        if let Ok(mut by_label) = self.predictions_by_label.write() {
            *by_label.entry(label.to_string()).or_insert(0) += 1;
        }
    }

    /// Record a failed request
    pub fn record_failure(&self, kind: &str) {
        self.predictions_failed.fetch_add(1, Ordering::Relaxed);

        if let Ok(mut by_kind) = self.failures_by_kind.write() {
            *by_kind.entry(kind.to_string()).or_insert(0) += 1;
        }
    }

    /// Latency statistics over the retained samples
    pub fn get_processing_stats(&self) -> ProcessingStats {
        let mut sorted = match self.processing_times.read() {
            Ok(times) if !times.is_empty() => times.clone(),
            _ => return ProcessingStats::default(),
        };
        sorted.sort_unstable();

        let sum: u64 = sorted.iter().sum();
        let count = sorted.len();

        ProcessingStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: sorted[count / 2],
            p95_us: sorted[(count as f64 * 0.95) as usize],
            p99_us: sorted[(count as f64 * 0.99) as usize],
            max_us: sorted[count - 1],
        }
    }

    /// Predictions per second since startup
    pub fn get_throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.predictions_served.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn get_predictions_by_label(&self) -> HashMap<String, u64> {
        self.predictions_by_label
            .read()
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    pub fn get_failures_by_kind(&self) -> HashMap<String, u64> {
        self.failures_by_kind
            .read()
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    /// Point-in-time copy of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            predictions_served: self.predictions_served.load(Ordering::Relaxed),
            predictions_failed: self.predictions_failed.load(Ordering::Relaxed),
            columns_dropped: self.columns_dropped.load(Ordering::Relaxed),
            throughput: self.get_throughput(),
            processing: self.get_processing_stats(),
            predictions_by_label: self.get_predictions_by_label(),
            failures_by_kind: self.get_failures_by_kind(),
        }
    }

    /// Log summary statistics
    pub fn print_summary(&self) {
        let snapshot = self.snapshot();
        let total = snapshot.predictions_served + snapshot.predictions_failed;
        let failure_rate = if total > 0 {
            (snapshot.predictions_failed as f64 / total as f64) * 100.0
        } else {
            0.0
        };

        info!("╔══════════════════════════════════════════════════════════════╗");
        info!("║            STUDENT OUTCOME PREDICTOR - METRICS               ║");
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Predictions Served: {:>8}  │  Throughput: {:>7.2} req/s  ║",
            snapshot.predictions_served, snapshot.throughput
        );
        info!(
            "║ Failed Requests:    {:>8}  │  Failure Rate: {:>6.1}%     ║",
            snapshot.predictions_failed, failure_rate
        );
        info!(
            "║ Latency (μs): mean={:>5} p50={:>5} p95={:>5} p99={:>5}     ║",
            snapshot.processing.mean_us,
            snapshot.processing.p50_us,
            snapshot.processing.p95_us,
            snapshot.processing.p99_us
        );
        info!(
            "║ Columns dropped by alignment: {:>8}                       ║",
            snapshot.columns_dropped
        );
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!("║ Predictions by Label:                                        ║");
        let mut labels: Vec<_> = snapshot.predictions_by_label.iter().collect();
        labels.sort();
        for (label, count) in labels {
            let pct = if snapshot.predictions_served > 0 {
                (*count as f64 / snapshot.predictions_served as f64) * 100.0
            } else {
                0.0
            };
            let bar: String = "█".repeat(((pct / 5.0) as usize).min(20));
            info!("║   {:10}: {:>6} ({:>5.1}%) {}", label, count, pct, bar);
        }
        for (kind, count) in &snapshot.failures_by_kind {
            info!("║   failure {:16}: {:>6}", kind, count);
        }
        info!("╚══════════════════════════════════════════════════════════════╝");
    }
}

impl Default for PredictionMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Processing time statistics
#[derive(Debug, Default, Clone, Serialize)]
pub struct ProcessingStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

/// Serializable view of [`PredictionMetrics`]
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub predictions_served: u64,
    pub predictions_failed: u64,
    pub columns_dropped: u64,
    pub throughput: f64,
    pub processing: ProcessingStats,
    pub predictions_by_label: HashMap<String, u64>,
    pub failures_by_kind: HashMap<String, u64>,
}

/// Logs a metrics summary at a fixed interval
pub struct MetricsReporter {
    metrics: Arc<PredictionMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: Arc<PredictionMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs,
        }
    }

    /// Start the periodic reporting task
    pub async fn start(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs.max(1)));
        // First tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            self.metrics.print_summary();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_recording() {
        let metrics = PredictionMetrics::new();

        metrics.record_prediction(Duration::from_micros(100), "Graduate", 0);
        metrics.record_prediction(Duration::from_micros(300), "Dropout", 2);
        metrics.record_failure("scaling_error");

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.predictions_served, 2);
        assert_eq!(snapshot.predictions_failed, 1);
        assert_eq!(snapshot.columns_dropped, 2);
        assert_eq!(snapshot.predictions_by_label.get("Dropout"), Some(&1));
        assert_eq!(snapshot.failures_by_kind.get("scaling_error"), Some(&1));
    }

    #[test]
    fn test_processing_stats() {
        let metrics = PredictionMetrics::new();
        for us in [100, 200, 300, 400] {
            metrics.record_prediction(Duration::from_micros(us), "Enrolled", 0);
        }

        let stats = metrics.get_processing_stats();
        assert_eq!(stats.count, 4);
        assert_eq!(stats.mean_us, 250);
        assert_eq!(stats.p50_us, 300);
        assert_eq!(stats.max_us, 400);
    }

    #[test]
    fn test_empty_stats() {
        let metrics = PredictionMetrics::new();
        assert_eq!(metrics.get_processing_stats().count, 0);
    }
}
