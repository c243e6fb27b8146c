//! Recommendation Metrics and Performance Monitoring
//!
//! Per-request counters and timing for the dispatcher. Counters go through the
//! `metrics` facade so any installed recorder picks them up.

use serde::Serialize;
use std::time::{Duration, Instant};

use super::{RecommendationSource, Strategy};

/// Metrics for a single recommendation request
#[derive(Debug, Clone, Serialize)]
pub struct RecommendationMetrics {
    pub user_id: i64,
    pub strategy: Strategy,
    pub timestamp: i64,

    pub query_duration_ms: u64,
    pub rows_returned: usize,
    /// Rows removed by post-filtering (blank or duplicate titles, over limit)
    pub rows_filtered: usize,
    pub source: RecommendationSource,
}

impl RecommendationMetrics {
    pub fn new(user_id: i64, strategy: Strategy) -> Self {
        Self {
            user_id,
            strategy,
            timestamp: chrono::Utc::now().timestamp(),
            query_duration_ms: 0,
            rows_returned: 0,
            rows_filtered: 0,
            source: RecommendationSource::Graph,
        }
    }

    /// Emit counters for this request
    pub fn record(&self) {
        let source = match self.source {
            RecommendationSource::Graph => "graph",
            RecommendationSource::Fallback => "fallback",
        };
        ::metrics::counter!(
            "showgraph_recommendations_total",
            "strategy" => self.strategy.as_str(),
            "source" => source
        )
        .increment(1);
        ::metrics::histogram!(
            "showgraph_query_duration_ms",
            "strategy" => self.strategy.as_str()
        )
        .record(self.query_duration_ms as f64);
    }

    /// Describe anything worth a warning in the logs
    pub fn detect_issues(&self, slow_threshold: Duration) -> Vec<String> {
        let mut issues = Vec::new();

        if self.query_duration_ms > slow_threshold.as_millis() as u64 {
            issues.push(format!("Slow query: {}ms", self.query_duration_ms));
        }

        if self.source == RecommendationSource::Fallback {
            issues.push("Served fallback titles".to_string());
        }

        if self.rows_returned > 0 && self.rows_filtered * 2 > self.rows_returned {
            issues.push(format!(
                "Post-filter removed {} of {} rows",
                self.rows_filtered, self.rows_returned
            ));
        }

        issues
    }
}

/// Performance timer for tracking operation duration
pub struct PerformanceTimer {
    start: Instant,
    label: String,
}

impl PerformanceTimer {
    pub fn new(label: &str) -> Self {
        Self {
            start: Instant::now(),
            label: label.to_string(),
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    pub fn log_if_slow(&self, threshold: Duration) {
        let elapsed = self.elapsed_ms();
        let threshold_ms = threshold.as_millis() as u64;
        if elapsed > threshold_ms {
            tracing::warn!(
                "Slow operation: {} took {}ms (threshold: {}ms)",
                self.label,
                elapsed,
                threshold_ms
            );
        }
    }
}

impl Drop for PerformanceTimer {
    fn drop(&mut self) {
        tracing::debug!("{} completed in {}ms", self.label, self.elapsed_ms());
    }
}
