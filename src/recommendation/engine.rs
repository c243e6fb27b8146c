//! Recommendation Engine
//!
//! Dispatches a recommendation request to the strategy's query and decides
//! what the user sees when the graph cannot answer.

use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};

use super::fallback::fallback_recommendations;
use super::interests::InterestManager;
use super::metrics::RecommendationMetrics;
use super::store::GraphStore;
use super::{Message, Recommendation, RecommendationSource, Strategy, UserProfile};
use crate::config::RecommendationConfig;
use crate::error::{Error, Result};
use crate::graph::QueryLibrary;

/// The result of one recommendation request
#[derive(Debug, Clone, Serialize)]
pub struct RecommendationOutcome {
    pub user_id: i64,
    pub strategy: Strategy,
    pub source: RecommendationSource,
    pub items: Vec<Recommendation>,
    /// Warnings and errors to show next to the results
    pub messages: Vec<Message>,
}

/// Main recommendation engine
#[derive(Clone)]
pub struct RecommendationEngine {
    store: Arc<dyn GraphStore>,
    queries: QueryLibrary,
    interests: InterestManager,
    config: RecommendationConfig,
}

impl RecommendationEngine {
    pub fn new(store: Arc<dyn GraphStore>, mut config: RecommendationConfig) -> Self {
        // limits are clamped into 1..=max_limit
        config.max_limit = config.max_limit.max(1);
        Self {
            queries: QueryLibrary::new(config.query_dir.clone()),
            interests: InterestManager::new(store.clone()),
            store,
            config,
        }
    }

    pub fn config(&self) -> &RecommendationConfig {
        &self.config
    }

    pub fn interests(&self) -> &InterestManager {
        &self.interests
    }

    pub fn store(&self) -> &Arc<dyn GraphStore> {
        &self.store
    }

    /// Clamp a requested limit into `1..=max_limit`
    pub fn effective_limit(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.config.default_limit)
            .clamp(1, self.config.max_limit)
    }

    pub async fn check_user_exists(&self, user_id: i64) -> Result<bool> {
        self.store.user_exists(user_id).await
    }

    pub async fn validate_user_data(&self, user_id: i64) -> Result<UserProfile> {
        self.store.user_profile(user_id).await
    }

    /// Produce recommendations for an existing user.
    ///
    /// Unknown users are an error. An unreachable graph or an empty result is
    /// answered with the fallback list when that is enabled.
    #[instrument(skip(self), fields(strategy = %strategy))]
    pub async fn recommend(
        &self,
        user_id: i64,
        strategy: Strategy,
        limit: usize,
    ) -> Result<RecommendationOutcome> {
        let limit = limit.clamp(1, self.config.max_limit);
        let mut metrics = RecommendationMetrics::new(user_id, strategy);
        let mut messages = Vec::new();

        match self.check_user_exists(user_id).await {
            Ok(true) => {}
            Ok(false) => return Err(Error::UserNotFound { user_id }),
            Err(e) if e.is_unavailable() => {
                error!("Existence check for user {} failed: {}", user_id, e);
                messages.push(Message::error(format!(
                    "Database unavailable: {}. Showing sample titles instead.",
                    e
                )));
                return Ok(self.finish(metrics, messages, Vec::new(), limit, true));
            }
            Err(e) => return Err(e),
        }

        let profile = match self.validate_user_data(user_id).await {
            Ok(profile) => profile,
            Err(e) => {
                warn!("Could not read profile for user {}: {}", user_id, e);
                UserProfile {
                    user_id,
                    ..Default::default()
                }
            }
        };
        if profile.rated_shows == 0 && strategy.needs_ratings() {
            messages.push(Message::warning(format!(
                "User {} has no rated shows. Try Interest-Based strategy or add ratings.",
                user_id
            )));
        }

        let started = Instant::now();
        let rows = match self.execute(user_id, strategy, limit).await {
            Ok(rows) => rows,
            Err(e) if e.is_unavailable() => {
                error!(
                    "Error generating recommendations for user {} (strategy: {}): {}",
                    user_id, strategy, e
                );
                metrics.query_duration_ms = started.elapsed().as_millis() as u64;
                messages.push(Message::error(format!(
                    "Error generating recommendations: {}",
                    e
                )));
                return Ok(self.finish(metrics, messages, Vec::new(), limit, true));
            }
            Err(e) => return Err(e),
        };
        metrics.query_duration_ms = started.elapsed().as_millis() as u64;
        metrics.rows_returned = rows.len();

        let items = post_filter(rows, limit);
        metrics.rows_filtered = metrics.rows_returned - items.len();
        debug!(
            "Recommendations for user {} (strategy: {}): {:?}",
            user_id, strategy, items
        );

        if items.is_empty() && !self.config.mock_fallback {
            messages.push(Message::warning(format!(
                "No recommendations found for {} strategy. Try another strategy or add more data.",
                strategy.label()
            )));
        }

        Ok(self.finish(metrics, messages, items, limit, false))
    }

    async fn execute(&self, user_id: i64, strategy: Strategy, limit: usize) -> Result<Vec<Recommendation>> {
        match strategy.query_file() {
            None => self.interests.recommend_from_interests(user_id, limit).await,
            Some(file) => {
                let cypher = self.queries.load(file).await?;
                self.store
                    .run_recommendation_query(&cypher, user_id, limit)
                    .await
            }
        }
    }

    /// Apply the fallback policy and emit metrics
    fn finish(
        &self,
        mut metrics: RecommendationMetrics,
        mut messages: Vec<Message>,
        items: Vec<Recommendation>,
        limit: usize,
        unavailable: bool,
    ) -> RecommendationOutcome {
        let use_fallback = self.config.mock_fallback && (unavailable || items.is_empty());

        let (source, items) = if use_fallback {
            if !unavailable {
                messages.push(Message::warning(format!(
                    "No recommendations found for {} strategy. Showing popular titles instead.",
                    metrics.strategy.label()
                )));
            }
            ::metrics::counter!("showgraph_fallbacks_total", "strategy" => metrics.strategy.as_str())
                .increment(1);
            (RecommendationSource::Fallback, fallback_recommendations(limit))
        } else {
            (RecommendationSource::Graph, items)
        };

        metrics.source = source;
        metrics.record();
        for issue in metrics.detect_issues(self.config.slow_query_threshold) {
            warn!("Recommendation issue for user {}: {}", metrics.user_id, issue);
        }

        info!(
            "Served {} recommendations for user {} (strategy: {}, source: {:?})",
            items.len(),
            metrics.user_id,
            metrics.strategy,
            source
        );

        RecommendationOutcome {
            user_id: metrics.user_id,
            strategy: metrics.strategy,
            source,
            items,
            messages,
        }
    }
}

/// Drop blank and repeated titles (case-insensitive, first wins), then truncate
fn post_filter(rows: Vec<Recommendation>, limit: usize) -> Vec<Recommendation> {
    let mut seen = HashSet::new();
    rows.into_iter()
        .filter_map(|mut rec| {
            rec.title = rec.title.trim().to_string();
            if rec.title.is_empty() || !seen.insert(rec.title.to_lowercase()) {
                None
            } else {
                Some(rec)
            }
        })
        .take(limit)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(title: &str, score: f64) -> Recommendation {
        Recommendation {
            score: Some(score),
            ..Recommendation::titled(title)
        }
    }

    #[test]
    fn test_post_filter_dedupes_case_insensitively() {
        let rows = vec![
            rec("Ozark", 0.9),
            rec("ozark ", 0.8),
            rec("Dark", 0.7),
        ];
        let filtered = post_filter(rows, 10);
        let titles: Vec<_> = filtered.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Ozark", "Dark"]);
        assert_eq!(filtered[0].score, Some(0.9));
    }

    #[test]
    fn test_post_filter_drops_blank_titles_and_truncates() {
        let rows = vec![rec("", 1.0), rec("  ", 1.0), rec("A", 0.5), rec("B", 0.4), rec("C", 0.3)];
        let filtered = post_filter(rows, 2);
        let titles: Vec<_> = filtered.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "B"]);
    }
}
